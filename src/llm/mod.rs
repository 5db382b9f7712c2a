//! LLM — text generation adapter for the AI-assist features.
//!
//! DESIGN
//! ======
//! Uses environment variables instead of config files. The `LlmClient`
//! dispatches to Gemini or an OpenAI-compatible endpoint based on
//! `LLM_PROVIDER`, and callers only ever see the [`TextGenerator`] trait.

pub mod config;
pub mod gemini;
pub mod openai;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::TextGenerator;
use types::LlmError;

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// The production [`TextGenerator`]: one of the hosted providers plus the
/// model to ask.
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Gemini(gemini::GeminiClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// Shorthand for [`LlmConfig::from_env`] then [`Self::from_config`].
    ///
    /// # Errors
    ///
    /// Fails without an API key; the AI assist then runs on fallbacks.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if reqwest rejects the timeouts.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let inner = match config.provider {
            LlmProviderKind::Gemini => {
                LlmProvider::Gemini(gemini::GeminiClient::new(config.api_key, config.base_url, config.timeouts)?)
            }
            LlmProviderKind::OpenAi => {
                LlmProvider::OpenAi(openai::OpenAiClient::new(config.api_key, config.base_url, config.timeouts)?)
            }
        };
        Ok(Self { inner, model: config.model })
    }

    /// Return the configured model name (e.g. `"gemini-3-flash-preview"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match &self.inner {
            LlmProvider::Gemini(c) => c.generate(&self.model, prompt).await,
            LlmProvider::OpenAi(c) => c.generate(&self.model, prompt).await,
        }
    }
}
