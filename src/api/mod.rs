//! HTTP surface
//!
//! `GET /health` and `POST /generate` on top of a shared [`crate::gateway::Gateway`].

pub mod handlers;
pub mod models;
pub mod server;

pub use models::RequestValidationError;
pub use server::{create_router, serve};
