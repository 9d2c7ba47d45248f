//! Generation types
//!
//! Per-request values exchanged between the HTTP layer and the gateway.

use serde::{Deserialize, Serialize};

/// Token limit applied when a request does not carry `max_tokens`
pub const DEFAULT_REQUEST_MAX_TOKENS: i32 = 512;

/// A validated generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text handed to the model
    pub prompt: String,
    /// Generation limit; `<= 0` lets the model fill the remaining context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
}

impl GenerationRequest {
    /// Create a request with the default token limit
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The limit actually passed to the model
    pub fn effective_max_tokens(&self) -> i32 {
        self.max_tokens.unwrap_or(DEFAULT_REQUEST_MAX_TOKENS)
    }
}

/// Outcome of a single generation call
///
/// Serialized with a `status` discriminator:
/// `{"status":"success","generated_text":..,"tokens_used":..}` or
/// `{"status":"error","error":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationResult {
    Success {
        generated_text: String,
        tokens_used: u32,
    },
    #[serde(rename = "error")]
    Failure {
        #[serde(rename = "error")]
        message: String,
    },
}

impl GenerationResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Liveness report for the loaded model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"healthy"` once the gateway exists
    pub status: String,
    /// Model path as configured
    #[serde(rename = "model")]
    pub model_identifier: String,
}

impl HealthStatus {
    pub fn healthy(model_identifier: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            model_identifier: model_identifier.into(),
        }
    }
}
