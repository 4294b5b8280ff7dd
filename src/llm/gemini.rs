//! Google Gemini API integration
//!
//! Implementation of the LLM backend for Google's Gemini models,
//! using the `generateContent` endpoint of the v1beta API.

use crate::llm::{Backend, Generation, LlmError, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API request types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    // candidates may be absent entirely when the prompt is blocked
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

/// Google Gemini API client implementation
///
/// One instance per process definition: the model name and system
/// instruction are fixed at construction time.
#[derive(Debug)]
pub struct GeminiBackend {
    api_key: String,
    client: reqwest::Client,
    model_name: String,
    system_instruction: Option<String>,
}

impl GeminiBackend {
    /// Create a new Gemini client
    pub fn new(api_key: String, model_name: String, system_instruction: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout for long generations
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key,
            client,
            model_name,
            system_instruction,
        }
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        let system_instruction = self.system_instruction.as_ref().map(|s| GeminiContent {
            parts: vec![GeminiPart {
                text: Some(s.clone()),
            }],
            role: None,
        });

        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
                role: Some("user".to_string()),
            }],
            system_instruction,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: Some(8192),
                temperature: Some(0.5),
                top_p: Some(0.95),
            }),
        }
    }

    async fn send_api_request(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let api_url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE_URL, self.model_name, self.api_key
        );

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Api(format!("Gemini request timed out: {}", e))
                } else {
                    LlmError::Api(format!("Network error: {}", e))
                }
            })?;

        let status = response.status();
        tracing::debug!(%status, model = %self.model_name, "Gemini API response");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(LlmError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api(format!(
                "Gemini HTTP error {}: {}",
                status, error_text
            )));
        }

        // Read the body first so a parse failure can be logged with context
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Api(format!("Failed to read Gemini response body: {}", e)))?;

        serde_json::from_str::<GeminiResponse>(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Gemini response");
            LlmError::Api(format!("Failed to parse Gemini response: {}", e))
        })
    }

    fn extract_generation(response: GeminiResponse) -> Result<Generation, LlmError> {
        // A block reason means no candidates were generated
        if let Some(feedback) = &response.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(LlmError::Api(format!(
                    "Gemini request blocked. Reason: {}. No candidates generated.",
                    reason
                )));
            }
        }

        let Some(candidate) = response.candidates.first() else {
            return Err(LlmError::Api(
                "No candidates returned from Gemini API. This might be due to safety \
                 filters or an issue with the prompt."
                    .to_string(),
            ));
        };

        let mut text = String::new();
        for part in &candidate.content.parts {
            if let Some(part_text) = &part.text {
                text.push_str(part_text);
            }
        }

        let usage = response.usage_metadata.map(|meta| TokenUsage {
            input_tokens: meta.prompt_token_count.unwrap_or(0) as usize,
            output_tokens: meta.candidates_token_count.unwrap_or(0) as usize,
        });

        if let Some(reason) = &candidate.finish_reason {
            tracing::debug!(finish_reason = %reason, "Gemini candidate finished");
        }

        Ok(Generation { text, usage })
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<Generation, LlmError> {
        let request = self.build_request(prompt);
        let response = self.send_api_request(&request).await?;
        let generation = Self::extract_generation(response)?;

        if let Some(usage) = &generation.usage {
            tracing::debug!(
                model = %self.model_name,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "token usage"
            );
        }

        Ok(generation)
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model_name
    }
}
