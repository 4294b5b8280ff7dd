//! LLM provider abstraction layer
//!
//! Defines the trait and types for invoking a text-generation model.
//! The orchestrator only ever talks to `Backend`, so processes can be
//! tested against a scripted mock and wired to Gemini in production.

pub use async_trait::async_trait;

pub mod factory;
pub mod gemini;

pub use self::factory::build_backends;

/// Token usage statistics reported by a provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Input tokens for the request
    pub input_tokens: usize,

    /// Output tokens generated in the response
    pub output_tokens: usize,
}

/// A single generation returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    /// The generated text
    pub text: String,

    /// Usage statistics, if the provider reports them
    pub usage: Option<TokenUsage>,
}

/// Common trait for all LLM backends
///
/// One backend instance is bound to one model plus one system instruction
/// (the per-process configuration), so generation takes only the prompt.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Send a prompt to the model and return the generated text.
    ///
    /// Errors are returned, never panicked; the caller decides what a
    /// failed invocation means for its own state.
    async fn generate(&self, prompt: &str) -> Result<Generation, LlmError>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model name
    fn model(&self) -> &str;
}

/// Error types for LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// API request error (HTTP failure, blocked prompt, malformed response)
    #[error("API error: {0}")]
    Api(String),

    /// Configuration error (missing key, unknown model)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limit error
    #[error("rate limit exceeded{}", .retry_after.map(|s| format!(", retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },
}
