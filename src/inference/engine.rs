//! llama.cpp engine
//!
//! Loads a GGUF model through `llama-cpp-2` and runs blocking completions on it.

use crate::inference::backend::{Completion, InferenceError, ModelBackend};
use crate::inference::model::{validate_gguf, ModelError};
use crate::inference::sampling::{find_stop, generation_budget, SamplingParams};
use crate::system::resources::available_threads;
use llama_cpp_2::context::params::LlamaContextParams;
use llama_cpp_2::context::LlamaContext;
use llama_cpp_2::llama_backend::LlamaBackend;
use llama_cpp_2::llama_batch::LlamaBatch;
use llama_cpp_2::model::params::LlamaModelParams;
use llama_cpp_2::model::{AddBos, LlamaModel, Special};
use llama_cpp_2::sampling::LlamaSampler;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Context window every request runs in
pub const CONTEXT_WINDOW: u32 = 2048;

/// Parameters fixed when the model is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    pub context_window: u32,
    pub threads: i32,
    /// Number of layers offloaded to the GPU (0 = CPU only)
    pub gpu_layers: u32,
}

impl LoadParams {
    /// CPU-only inference on every available core
    pub fn cpu_only() -> Self {
        Self {
            context_window: CONTEXT_WINDOW,
            threads: available_threads(),
            gpu_layers: 0,
        }
    }
}

/// Fatal errors raised while bringing the model up
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Invalid model file {}: {source}", .path.display())]
    InvalidModel {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
    #[error("Failed to initialize llama backend: {0}")]
    Backend(String),
    #[error("Failed to load model: {0}")]
    Load(String),
    #[error("Failed to allocate a {context_window}-token context: {message}")]
    Context { context_window: u32, message: String },
}

/// A model loaded into llama.cpp
pub struct LlamaEngine {
    // Dropped before the backend it was loaded with.
    model: LlamaModel,
    backend: LlamaBackend,
    params: LoadParams,
}

impl LlamaEngine {
    /// Load the model at `path`
    ///
    /// Creates and discards one context so that an oversized window fails here rather
    /// than on the first request.
    pub fn load(path: &Path, params: LoadParams) -> Result<Self, ModelLoadError> {
        let metadata = validate_gguf(path).map_err(|source| ModelLoadError::InvalidModel {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            "Loading GGUF v{} model ({} tensors, {:.1} MB) from {}",
            metadata.version,
            metadata.tensor_count,
            metadata.file_size as f64 / 1024.0 / 1024.0,
            path.display()
        );

        llama_cpp_2::send_logs_to_tracing(llama_cpp_2::LogOptions::default());
        let backend =
            LlamaBackend::init().map_err(|e| ModelLoadError::Backend(e.to_string()))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(params.gpu_layers);
        let started = Instant::now();
        let model = LlamaModel::load_from_file(&backend, path, &model_params).map_err(|e| {
            tracing::error!("Failed to load model: {}", e);
            ModelLoadError::Load(e.to_string())
        })?;

        let engine = Self {
            model,
            backend,
            params,
        };

        if let Err(e) = engine.new_context() {
            return Err(ModelLoadError::Context {
                context_window: params.context_window,
                message: e.to_string(),
            });
        }

        tracing::info!(
            "Model loaded in {:.1?} (n_ctx={}, threads={}, gpu_layers={})",
            started.elapsed(),
            params.context_window,
            params.threads,
            params.gpu_layers
        );
        Ok(engine)
    }

    pub fn load_params(&self) -> LoadParams {
        self.params
    }

    fn new_context(&self) -> Result<LlamaContext<'_>, InferenceError> {
        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.params.context_window))
            .with_n_batch(self.params.context_window)
            .with_n_threads(self.params.threads)
            .with_n_threads_batch(self.params.threads);

        self.model
            .new_context(&self.backend, ctx_params)
            .map_err(|e| InferenceError::Context(e.to_string()))
    }
}

impl ModelBackend for LlamaEngine {
    fn infer(
        &mut self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Completion, InferenceError> {
        let started = Instant::now();

        let tokens = self
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| InferenceError::Tokenize(e.to_string()))?;
        if tokens.is_empty() {
            return Err(InferenceError::Tokenize(
                "prompt produced no tokens".to_string(),
            ));
        }

        let prompt_tokens = tokens.len();
        let budget = generation_budget(params.max_tokens, prompt_tokens, self.params.context_window)?;

        let mut ctx = self.new_context()?;

        let mut batch = LlamaBatch::new(self.params.context_window as usize, 1);
        let last_index = prompt_tokens as i32 - 1;
        for (pos, token) in (0_i32..).zip(tokens.iter().copied()) {
            batch
                .add(token, pos, &[0], pos == last_index)
                .map_err(|e| InferenceError::Batch(e.to_string()))?;
        }
        ctx.decode(&mut batch)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;

        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::top_k(params.top_k),
            LlamaSampler::top_p(params.top_p, 1),
            LlamaSampler::min_p(params.min_p, 1),
            LlamaSampler::temp(params.temperature),
            LlamaSampler::dist(params.seed),
        ]);

        let mut output = Vec::new();
        let mut text = String::new();
        let mut completion_tokens = 0usize;
        let mut pos = prompt_tokens as i32;

        while completion_tokens < budget {
            let token = sampler.sample(&ctx, batch.n_tokens() - 1);
            sampler.accept(token);

            if self.model.is_eog_token(token) {
                break;
            }
            completion_tokens += 1;

            let piece = self
                .model
                .token_to_bytes(token, Special::Tokenize)
                .map_err(|e| InferenceError::Detokenize(e.to_string()))?;
            output.extend_from_slice(&piece);
            text = String::from_utf8_lossy(&output).into_owned();

            if let Some(end) = find_stop(&text, &params.stop) {
                text.truncate(end);
                break;
            }
            if completion_tokens == budget {
                break;
            }

            batch.clear();
            batch
                .add(token, pos, &[0], true)
                .map_err(|e| InferenceError::Batch(e.to_string()))?;
            pos += 1;
            ctx.decode(&mut batch)
                .map_err(|e| InferenceError::Decode(e.to_string()))?;
        }

        if params.echo {
            text.insert_str(0, prompt);
        }

        tracing::debug!(
            "Generated {} tokens from {} prompt tokens in {:.1?}",
            completion_tokens,
            prompt_tokens,
            started.elapsed()
        );

        Ok(Completion {
            text,
            prompt_tokens,
            completion_tokens,
        })
    }
}
