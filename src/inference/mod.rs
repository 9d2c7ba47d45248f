//! LLM inference engine
//!
//! This module handles all interaction with llama-cpp for model loading and inference.

pub mod backend;
pub mod engine;
pub mod model;
pub mod sampling;

// Re-export main types for convenience
pub use backend::{Completion, InferenceError, ModelBackend};
pub use engine::{LlamaEngine, LoadParams, ModelLoadError, CONTEXT_WINDOW};
pub use model::{validate_gguf, GgufMetadata, ModelError, GGUF_MAGIC};
pub use sampling::SamplingParams;
