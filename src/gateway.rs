//! Model request gateway
//!
//! Owns the single loaded model and turns every inference outcome into a
//! [`GenerationResult`]. Once constructed the gateway is ready for the rest of the
//! process; a model that fails to load never produces a gateway.

use crate::inference::{
    InferenceError, LlamaEngine, LoadParams, ModelBackend, ModelLoadError, SamplingParams,
};
use crate::types::{AppConfig, GenerationRequest, GenerationResult, HealthStatus};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, PoisonError};

pub struct Gateway {
    config: AppConfig,
    /// Requests are serialized on this lock.
    model: Mutex<Box<dyn ModelBackend>>,
}

impl Gateway {
    /// Load the configured model for CPU-only inference
    pub fn new(config: AppConfig) -> Result<Self, ModelLoadError> {
        let engine = LlamaEngine::load(&config.model_path, LoadParams::cpu_only())?;
        Ok(Self::with_backend(config, engine))
    }

    /// Build a gateway around an already-loaded model
    pub fn with_backend(config: AppConfig, backend: impl ModelBackend + 'static) -> Self {
        Self {
            config,
            model: Mutex::new(Box::new(backend)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::healthy(self.config.model_path.display().to_string())
    }

    /// Run one completion, blocking the calling thread until it finishes
    ///
    /// Never fails: inference errors and panics inside the model become
    /// [`GenerationResult::Failure`].
    pub fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let params = SamplingParams::gateway_defaults(request.effective_max_tokens());
        tracing::debug!(
            "Generating up to {} tokens for a {}-byte prompt",
            params.max_tokens,
            request.prompt.len()
        );

        let outcome = {
            let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
            panic::catch_unwind(AssertUnwindSafe(|| model.infer(&request.prompt, &params)))
        };

        let error = match outcome {
            Ok(Ok(completion)) => {
                return GenerationResult::Success {
                    tokens_used: u32::try_from(completion.total_tokens()).unwrap_or(u32::MAX),
                    generated_text: completion.text,
                };
            }
            Ok(Err(e)) => e,
            Err(payload) => InferenceError::Aborted(panic_message(payload.as_ref())),
        };

        tracing::error!("Generation error: {}", error);
        GenerationResult::failure(error.to_string())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "model panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Completion;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct RecordingBackend {
        calls: Arc<Mutex<Vec<SamplingParams>>>,
    }

    impl ModelBackend for RecordingBackend {
        fn infer(
            &mut self,
            prompt: &str,
            params: &SamplingParams,
        ) -> Result<Completion, InferenceError> {
            self.calls.lock().unwrap().push(params.clone());
            Ok(Completion {
                text: format!(" reply to {prompt}"),
                prompt_tokens: 2,
                completion_tokens: 3,
            })
        }
    }

    struct FlakyBackend {
        calls: usize,
    }

    impl ModelBackend for FlakyBackend {
        fn infer(
            &mut self,
            _prompt: &str,
            _params: &SamplingParams,
        ) -> Result<Completion, InferenceError> {
            self.calls += 1;
            match self.calls {
                1 => Err(InferenceError::Decode("llama_decode returned 1".to_string())),
                2 => panic!("kv cache corrupted"),
                _ => Ok(Completion {
                    text: "recovered".to_string(),
                    prompt_tokens: 1,
                    completion_tokens: 1,
                }),
            }
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            model_path: PathBuf::from("models/test.gguf"),
            ..AppConfig::default()
        }
    }

    fn recording_gateway() -> (Gateway, Arc<Mutex<Vec<SamplingParams>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let backend = RecordingBackend {
            calls: Arc::clone(&calls),
        };
        (Gateway::with_backend(config(), backend), calls)
    }

    #[test]
    fn test_health_reports_model_path() {
        let (gateway, calls) = recording_gateway();
        let first = gateway.health();
        assert_eq!(first.status, "healthy");
        assert_eq!(first.model_identifier, "models/test.gguf");
        assert_eq!(gateway.health(), first);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_generate_success() {
        let (gateway, _) = recording_gateway();
        let result = gateway.generate(&GenerationRequest::new("Hello"));
        assert_eq!(
            result,
            GenerationResult::Success {
                generated_text: " reply to Hello".to_string(),
                tokens_used: 5,
            }
        );
    }

    #[test]
    fn test_generate_uses_fixed_sampling() {
        let (gateway, calls) = recording_gateway();
        gateway.generate(&GenerationRequest::new("Hello"));
        gateway.generate(&GenerationRequest::new("Hello").with_max_tokens(10));

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], SamplingParams::gateway_defaults(512));
        assert_eq!(calls[1].max_tokens, 10);
        assert_eq!(calls[1].temperature, 0.7);
        assert_eq!(calls[1].top_p, 0.95);
        assert!(!calls[1].echo);
    }

    #[test]
    fn test_failures_are_contained() {
        let gateway = Gateway::with_backend(config(), FlakyBackend { calls: 0 });
        let request = GenerationRequest::new("Hello");

        match gateway.generate(&request) {
            GenerationResult::Failure { message } => {
                assert_eq!(message, "Decode failed: llama_decode returned 1")
            }
            other => panic!("expected failure, got {other:?}"),
        }

        match gateway.generate(&request) {
            GenerationResult::Failure { message } => {
                assert!(message.contains("kv cache corrupted"))
            }
            other => panic!("expected failure, got {other:?}"),
        }

        assert!(gateway.generate(&request).is_success());
    }

    #[test]
    fn test_missing_model_never_reaches_ready() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            model_path: dir.path().join("missing.gguf"),
            ..AppConfig::default()
        };
        assert!(matches!(
            Gateway::new(config),
            Err(ModelLoadError::InvalidModel { .. })
        ));
    }
}
