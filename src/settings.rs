//! Configuration resolver
//!
//! Builds the [`AppConfig`] from the environment and refuses to start when the model
//! file is missing.

use crate::types::config::{default_model_path, AppConfig};
use std::fs::{self, File};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const MODEL_PATH_VAR: &str = "MODEL_PATH";
pub const MAX_TOKENS_VAR: &str = "MAX_TOKENS";
pub const DEFAULT_TEMPERATURE_VAR: &str = "DEFAULT_TEMPERATURE";
pub const CONTEXT_LENGTH_VAR: &str = "CONTEXT_LENGTH";
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";

/// Fatal startup errors raised while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(
        "Model file not found. Expected at: {}\n\
         Please either:\n\
         1. Place the deepseek-llm-7b-chat.Q4_K_M.gguf file in the 'models' directory, or\n\
         2. Set MODEL_PATH (environment or .env) to point to your model file location",
        .path.display()
    )]
    ModelNotFound { path: PathBuf },
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Resolve configuration from the process environment
pub fn resolve() -> Result<AppConfig, ConfigurationError> {
    resolve_with(|key| std::env::var(key).ok())
}

/// Resolve configuration from an arbitrary key lookup
pub fn resolve_with<F>(lookup: F) -> Result<AppConfig, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = AppConfig::default();

    let config = AppConfig {
        model_path: lookup(MODEL_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_model_path),
        max_tokens: parse_var(&lookup, MAX_TOKENS_VAR, defaults.max_tokens)?,
        default_temperature: parse_var(
            &lookup,
            DEFAULT_TEMPERATURE_VAR,
            defaults.default_temperature,
        )?,
        context_length: parse_var(&lookup, CONTEXT_LENGTH_VAR, defaults.context_length)?,
        bind_addr: parse_var::<SocketAddr, _>(&lookup, BIND_ADDR_VAR, defaults.bind_addr)?,
    };

    validate_model_path(&config.model_path)?;

    tracing::debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

/// Ensure the model path names an existing, readable file
pub fn validate_model_path(path: &Path) -> Result<(), ConfigurationError> {
    let is_file = fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    if is_file && File::open(path).is_ok() {
        return Ok(());
    }

    let absolute = absolute_path(path);
    tracing::error!("Model file not found at: {}", absolute.display());
    tracing::error!("Please ensure the model file exists and MODEL_PATH points to it");
    Err(ConfigurationError::ModelNotFound { path: absolute })
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parse_var<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigurationError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::InvalidValue { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_defaults_with_existing_model() {
        let model = NamedTempFile::new().unwrap();
        let path = model.path().to_string_lossy().to_string();

        let config = resolve_with(lookup_from(&[(MODEL_PATH_VAR, path.as_str())])).unwrap();

        assert_eq!(config.model_path, model.path());
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.default_temperature, 0.7);
        assert_eq!(config.context_length, 4096);
    }

    #[test]
    fn test_resolve_overrides() {
        let model = NamedTempFile::new().unwrap();
        let path = model.path().to_string_lossy().to_string();

        let config = resolve_with(lookup_from(&[
            (MODEL_PATH_VAR, path.as_str()),
            (MAX_TOKENS_VAR, "1024"),
            (DEFAULT_TEMPERATURE_VAR, "0.2"),
            (CONTEXT_LENGTH_VAR, " 8192 "),
            (BIND_ADDR_VAR, "0.0.0.0:8080"),
        ]))
        .unwrap();

        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.default_temperature, 0.2);
        assert_eq!(config.context_length, 8192);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.gguf");
        let missing_str = missing.to_string_lossy().to_string();

        let err = resolve_with(lookup_from(&[(MODEL_PATH_VAR, missing_str.as_str())])).unwrap_err();

        match &err {
            ConfigurationError::ModelNotFound { path } => assert_eq!(path, &missing),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains(&missing_str));
        assert!(message.contains("MODEL_PATH"));
        assert!(message.contains("'models' directory"));
    }

    #[test]
    fn test_relative_missing_path_is_reported_absolute() {
        let err = validate_model_path(Path::new("no/such/model.gguf")).unwrap_err();
        match err {
            ConfigurationError::ModelNotFound { path } => {
                assert!(path.is_absolute());
                assert!(path.ends_with("no/such/model.gguf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directory_is_not_a_model() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_model_path(dir.path()),
            Err(ConfigurationError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let model = NamedTempFile::new().unwrap();
        let path = model.path().to_string_lossy().to_string();

        let err = resolve_with(lookup_from(&[
            (MODEL_PATH_VAR, path.as_str()),
            (MAX_TOKENS_VAR, "lots"),
        ]))
        .unwrap_err();

        match err {
            ConfigurationError::InvalidValue { name, value } => {
                assert_eq!(name, MAX_TOKENS_VAR);
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
