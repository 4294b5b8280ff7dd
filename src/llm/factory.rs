//! LLM backend factory
//!
//! Builds one backend per process definition, keyed by process id, once at
//! startup. The provider is inferred from the model name. This replaces any
//! lazy on-demand client construction: if a pipeline names a model nobody
//! can serve, the run fails before the first process executes.

use crate::llm::gemini::GeminiBackend;
use crate::llm::{Backend, LlmError};
use crate::workflow::types::ProcessDefinition;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

/// Supported model provider types
#[derive(Debug, PartialEq, Eq)]
pub enum Provider {
    /// Google's Gemini models
    Google,
    /// Unknown provider
    Unknown(String),
}

/// Model information after parsing
struct ModelInfo {
    provider: Provider,
    /// The actual model name to pass to the API
    model_name: String,
}

/// Parse a model string which may be in either format:
/// - "gemini-2.0-flash-exp" (provider inferred from model name)
/// - "google/gemini-2.0-flash-exp" (explicit provider)
fn parse_model_string(model_str: &str) -> ModelInfo {
    if let Some((provider, model)) = model_str.split_once('/') {
        let provider_type = match provider.trim().to_lowercase().as_str() {
            "google" => Provider::Google,
            other => Provider::Unknown(other.to_string()),
        };

        return ModelInfo {
            provider: provider_type,
            model_name: model.trim().to_string(),
        };
    }

    let provider = if is_gemini_model(model_str) {
        Provider::Google
    } else {
        Provider::Unknown(String::new())
    };

    ModelInfo {
        provider,
        model_name: model_str.to_string(),
    }
}

/// Determine if a model name belongs to the Google Gemini family
fn is_gemini_model(model: &str) -> bool {
    model.starts_with("gemini-")
}

/// Resolve the Gemini API key from environment variables.
///
/// Accepts `GEMINI_API_KEY` (the name Google's own tooling uses) and falls
/// back to `GOOGLE_API_KEY`.
fn resolve_gemini_api_key() -> Result<String, LlmError> {
    env::var("GEMINI_API_KEY")
        .or_else(|_| env::var("GOOGLE_API_KEY"))
        .map_err(|_| {
            LlmError::Config(
                "GEMINI_API_KEY (or GOOGLE_API_KEY) environment variable not set".into(),
            )
        })
}

/// Create the backend for a single process definition
pub fn create_backend(definition: &ProcessDefinition) -> Result<Arc<dyn Backend>, LlmError> {
    let model_info = parse_model_string(&definition.model);

    match model_info.provider {
        Provider::Google => {
            let api_key = resolve_gemini_api_key()?;
            let system = if definition.system_prompt.is_empty() {
                None
            } else {
                Some(definition.system_prompt.clone())
            };
            Ok(Arc::new(GeminiBackend::new(
                api_key,
                model_info.model_name,
                system,
            )))
        }
        Provider::Unknown(provider) => {
            let provider_msg = if provider.is_empty() {
                format!(
                    "Unknown model '{}'. Cannot determine provider.",
                    definition.model
                )
            } else {
                format!(
                    "Unknown provider '{}' specified in '{}'",
                    provider, definition.model
                )
            };

            Err(LlmError::Config(format!(
                "{}. Currently supporting:\n\
                 - Google models: 'gemini-2.0-flash-exp', 'gemini-1.5-pro', etc.\n\
                 - Explicit provider format: 'google/gemini-2.0-flash-exp'",
                provider_msg
            )))
        }
    }
}

/// Build backends for a whole pipeline, keyed by process id
pub fn build_backends(
    processes: &[ProcessDefinition],
) -> Result<HashMap<String, Arc<dyn Backend>>, LlmError> {
    let mut backends = HashMap::new();
    for definition in processes {
        let backend = create_backend(definition)?;
        tracing::debug!(
            process = %definition.id,
            provider = backend.name(),
            model = backend.model(),
            "backend created"
        );
        backends.insert(definition.id.clone(), backend);
    }
    Ok(backends)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_google_provider_from_model_name() {
        let info = parse_model_string("gemini-2.0-flash-exp");
        assert_eq!(info.provider, Provider::Google);
        assert_eq!(info.model_name, "gemini-2.0-flash-exp");
    }

    #[test]
    fn parses_explicit_provider_prefix() {
        let info = parse_model_string("google/gemini-1.5-pro");
        assert_eq!(info.provider, Provider::Google);
        assert_eq!(info.model_name, "gemini-1.5-pro");
    }

    #[test]
    fn unknown_model_has_no_provider() {
        let info = parse_model_string("claude-3-opus");
        assert_eq!(info.provider, Provider::Unknown(String::new()));
    }

    #[test]
    fn unknown_provider_prefix_is_reported() {
        let info = parse_model_string("acme/whizbang-1");
        assert_eq!(info.provider, Provider::Unknown("acme".to_string()));
    }

    #[test]
    fn unsupported_model_is_a_config_error() {
        let definition = ProcessDefinition::new("p1", "P1", "desc").with_model("whizbang-1");
        let err = create_backend(&definition).unwrap_err();
        assert!(matches!(err, LlmError::Config(_)));
    }
}
