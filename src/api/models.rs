use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::types::GenerationRequest;

/// Per-request validation failures, answered with `400 {"error": ..}`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestValidationError {
    #[error("Content-Type must be application/json")]
    NotJson,
    #[error("Missing 'prompt' field in request")]
    MissingPrompt,
    #[error("'prompt' must be a string")]
    InvalidPrompt,
    #[error("'max_tokens' must be an integer")]
    InvalidMaxTokens,
}

impl IntoResponse for RequestValidationError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejected generate request: {}", self);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// `application/json` or any `+json` media type, parameters ignored
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Validate a `/generate` body
///
/// The content type is checked before the body is parsed, and the body is parsed
/// before any field is inspected.
pub fn parse_generate_body(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<GenerationRequest, RequestValidationError> {
    if !is_json_content_type(headers) {
        return Err(RequestValidationError::NotJson);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|_| RequestValidationError::NotJson)?;
    let Value::Object(fields) = value else {
        return Err(RequestValidationError::MissingPrompt);
    };

    let prompt = match fields.get("prompt") {
        None => return Err(RequestValidationError::MissingPrompt),
        Some(Value::String(prompt)) => prompt.clone(),
        Some(_) => return Err(RequestValidationError::InvalidPrompt),
    };

    Ok(GenerationRequest {
        prompt,
        max_tokens: parse_max_tokens(&fields)?,
    })
}

fn parse_max_tokens(fields: &Map<String, Value>) -> Result<Option<i32>, RequestValidationError> {
    match fields.get("max_tokens") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or(RequestValidationError::InvalidMaxTokens),
    }
}
