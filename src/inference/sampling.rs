//! Sampling parameters and generation bookkeeping
//!
//! Pure helpers shared by every backend: the token budget left in the context
//! window and stop-sequence handling.

use crate::inference::backend::InferenceError;

/// Seed value llama.cpp interprets as "pick a random seed"
pub const RANDOM_SEED: u32 = u32::MAX;

/// Parameters for a single completion
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    /// Tokens to generate; `<= 0` means "until the context is full"
    pub max_tokens: i32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: i32,
    pub min_p: f32,
    /// Generation stops at the first of these; the match is not returned
    pub stop: Vec<String>,
    /// Prepend the prompt to the returned text
    pub echo: bool,
    pub seed: u32,
}

impl SamplingParams {
    /// The fixed parameters the gateway uses for every request
    pub fn gateway_defaults(max_tokens: i32) -> Self {
        Self {
            max_tokens,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            min_p: 0.05,
            stop: vec!["</s>".to_string(), "\n\n".to_string()],
            echo: false,
            seed: RANDOM_SEED,
        }
    }
}

/// Number of tokens that may still be generated for a prompt
///
/// Fails when the prompt alone fills the context window. A non-positive or
/// oversized request is clamped to the remaining window.
pub fn generation_budget(
    requested: i32,
    prompt_tokens: usize,
    context_window: u32,
) -> Result<usize, InferenceError> {
    let window = context_window as usize;
    if prompt_tokens >= window {
        return Err(InferenceError::PromptTooLong {
            prompt_tokens,
            context_window,
        });
    }

    let remaining = window - prompt_tokens;
    match usize::try_from(requested) {
        Ok(n) if n > 0 && n <= remaining => Ok(n),
        _ => Ok(remaining),
    }
}

/// Byte offset of the earliest stop sequence in `text`, if any
pub fn find_stop(text: &str, stop: &[String]) -> Option<usize> {
    stop.iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}
