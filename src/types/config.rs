//! Configuration types
//!
//! Gateway configuration resolved once at startup.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// File name of the model expected in the `models` directory
pub const DEFAULT_MODEL_FILE: &str = "deepseek-llm-7b-chat.Q4_K_M.gguf";

/// Gateway configuration
///
/// Immutable after [`crate::settings::resolve`] returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the GGUF model file, as given by the operator
    pub model_path: PathBuf,
    /// Upper token limit advertised by the deployment
    pub max_tokens: u32,
    /// Sampling temperature advertised by the deployment
    pub default_temperature: f32,
    /// Context length advertised by the deployment
    pub context_length: u32,
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
}

/// `<crate-root>/models/deepseek-llm-7b-chat.Q4_K_M.gguf`
pub fn default_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("models")
        .join(DEFAULT_MODEL_FILE)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            max_tokens: 4096,
            default_temperature: 0.7,
            context_length: 4096,
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
        }
    }
}
