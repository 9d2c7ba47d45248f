//! System utilities
//!
//! This module provides host introspection used when sizing the model runtime.

pub mod resources;
