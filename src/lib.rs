//! llama-gateway library
//!
//! Serves a local GGUF model over a small HTTP API.

pub mod api;
pub mod gateway;
pub mod inference;
pub mod settings;
pub mod system;
pub mod types;
