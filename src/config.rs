//! Application configuration parsed from environment variables.

use url::Url;

use crate::error::{ErrorCode, Severity};

pub const DEFAULT_PUBLIC_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CUISINE: &str = "general";
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
        }
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS }
    }
}

/// Where the backend lives and how to call it anonymously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Origin public menu links are built on.
    pub public_origin: Url,
    /// Object storage bucket for images. Images are stored inline when unset.
    pub image_bucket: Option<String>,
    pub port: u16,
    /// Fall back to the first restaurant when the signed-in user owns none.
    pub demo_fallback: bool,
    /// Cuisine hint passed to the description generator.
    pub cuisine: String,
    pub timeouts: HttpTimeouts,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL`
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `PUBLIC_ORIGIN`: default `http://localhost:3000`
    /// - `IMAGE_BUCKET`: unset keeps images inline
    /// - `PORT`: default 3000
    /// - `ADMIN_DEMO_FALLBACK`: default `true`
    /// - `AI_CUISINE`: default `general`
    /// - `HTTP_REQUEST_TIMEOUT_SECS`: default 30
    /// - `HTTP_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("SUPABASE_URL").map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        let url = parse_url("SUPABASE_URL", &url)?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let public_origin = std::env::var("PUBLIC_ORIGIN").unwrap_or_else(|_| DEFAULT_PUBLIC_ORIGIN.to_string());
        let public_origin = parse_url("PUBLIC_ORIGIN", &public_origin)?;

        let image_bucket = std::env::var("IMAGE_BUCKET")
            .ok()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid { var: "PORT", reason: e.to_string() })?,
            Err(_) => DEFAULT_PORT,
        };
        let demo_fallback = parse_bool("ADMIN_DEMO_FALLBACK", std::env::var("ADMIN_DEMO_FALLBACK").ok().as_deref())?;
        let cuisine = std::env::var("AI_CUISINE").unwrap_or_else(|_| DEFAULT_CUISINE.to_string());
        let timeouts = HttpTimeouts {
            request_secs: env_parse_u64("HTTP_REQUEST_TIMEOUT_SECS", DEFAULT_HTTP_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("HTTP_CONNECT_TIMEOUT_SECS", DEFAULT_HTTP_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self {
            backend: BackendConfig { url, anon_key },
            public_origin,
            image_bucket,
            port,
            demo_fallback,
            cuisine,
            timeouts,
        })
    }
}

pub(crate) fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid { var, reason: e.to_string() })
}

fn parse_bool(var: &'static str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim) {
        None | Some("" | "1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid { var, reason: format!("expected a boolean, got '{other}'") }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
