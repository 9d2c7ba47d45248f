//! Model capability interface
//!
//! The gateway only talks to a loaded model through [`ModelBackend`], which keeps
//! llama.cpp out of the request path and lets tests inject their own model.

use crate::inference::sampling::SamplingParams;
use thiserror::Error;

/// Text produced by one inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl Completion {
    pub fn total_tokens(&self) -> usize {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Recoverable per-request inference failures
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Failed to tokenize prompt: {0}")]
    Tokenize(String),
    #[error("Requested tokens ({prompt_tokens}) exceed context window of {context_window}")]
    PromptTooLong {
        prompt_tokens: usize,
        context_window: u32,
    },
    #[error("Failed to create inference context: {0}")]
    Context(String),
    #[error("Failed to fill batch: {0}")]
    Batch(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Failed to detokenize output: {0}")]
    Detokenize(String),
    #[error("Inference aborted: {0}")]
    Aborted(String),
}

/// A loaded, ready-to-infer model
///
/// Implementations may keep mutable state between calls; callers serialize access.
pub trait ModelBackend: Send {
    /// Complete `prompt` according to `params`
    fn infer(&mut self, prompt: &str, params: &SamplingParams)
        -> Result<Completion, InferenceError>;
}
