use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::api::models::{parse_generate_body, RequestValidationError};
use crate::gateway::Gateway;
use crate::types::{GenerationResult, HealthStatus};

pub async fn health(State(gateway): State<Arc<Gateway>>) -> Json<HealthStatus> {
    Json(gateway.health())
}

/// `POST /generate`
///
/// Validation failures are answered with 400. Inference failures keep status 200
/// and carry `"status": "error"` in the body.
pub async fn generate(
    State(gateway): State<Arc<Gateway>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResult>, RequestValidationError> {
    let request = parse_generate_body(&headers, &body)?;
    tracing::debug!("Generate request: {:?}", request);

    let result = tokio::task::spawn_blocking(move || gateway.generate(&request))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Inference task failed: {}", e);
            GenerationResult::failure(format!("Inference task failed: {e}"))
        });

    Ok(Json(result))
}
