//! Text generation seam: the error type and the [`TextGenerator`] trait.

use crate::error::{ErrorCode, Severity};

// =============================================================================
// ERROR
// =============================================================================

/// Text generation failures. All of them degrade to fallback text upstream,
/// so none is worse than a warning.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("unknown LLM_PROVIDER: {0}")]
    UnknownProvider(String),

    #[error("no API key: env var {var} is not set")]
    MissingKey { var: String },

    /// The request never produced a response.
    #[error("text generation request failed: {0}")]
    Request(String),

    #[error("text generation provider answered {status}")]
    Status { status: u16, body: String },

    /// The reply body did not have the provider's shape.
    #[error("text generation reply parse failed: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownProvider(_) => "E_LLM_PROVIDER",
            Self::MissingKey { .. } => "E_LLM_KEY",
            Self::Request(_) => "E_LLM_REQUEST",
            Self::Status { .. } => "E_LLM_STATUS",
            Self::Parse(_) => "E_LLM_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }
}

// =============================================================================
// TEXT GENERATOR TRAIT
// =============================================================================

/// One prompt in, one completion out. The controller only ever holds a
/// `dyn TextGenerator`.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`. An empty string means the provider answered with
    /// no text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is
    /// malformed.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
