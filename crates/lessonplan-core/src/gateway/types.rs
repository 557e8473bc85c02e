//! Configuration and error types shared by gateway implementations.

use std::time::Duration;

use thiserror::Error;

use crate::error::GenerationError;

/// Fixed generation parameters sent with every model call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Provider model identifier (e.g. `gemini-2.5-flash`).
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Reasoning-effort dial. `Some(0)` disables thinking, `None` leaves the
    /// provider default in place.
    pub thinking_budget: Option<i32>,
}

impl GenerationConfig {
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 800;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_TOP_P: f32 = 0.95;
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            max_output_tokens: Self::DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
            top_p: Self::DEFAULT_TOP_P,
            thinking_budget: Some(0),
        }
    }
}

/// Everything a gateway needs, passed in explicitly rather than read from
/// the process environment.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Provider credential. `None` is allowed at construction time and
    /// reported as a configuration error on the first call.
    pub api_key: Option<String>,
    /// Provider base URL, without a trailing slash.
    pub base_url: String,
    /// Bound on a single model call, including connect and body read.
    pub timeout: Duration,
    pub generation: GenerationConfig,
}

impl GatewayConfig {
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }
}

// Never print the credential.
impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Failures raised by a [`super::ModelGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing credential: {0}")]
    MissingCredential(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model call failed: {0}")]
    Invocation(String),

    #[error("model returned no text: {0}")]
    EmptyResponse(String),
}

impl From<GatewayError> for GenerationError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MissingCredential(detail) => GenerationError::Configuration(detail),
            other => GenerationError::ModelInvocation(other.to_string()),
        }
    }
}
