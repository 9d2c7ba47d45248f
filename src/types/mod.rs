//! Shared type definitions
//!
//! This module contains the data types passed between configuration, gateway and HTTP layer.

pub mod config;
pub mod generation;

pub use config::AppConfig;
pub use generation::{GenerationRequest, GenerationResult, HealthStatus};
