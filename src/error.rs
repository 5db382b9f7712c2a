//! Unified error reporting.
//!
//! DESIGN
//! ======
//! Each collaborator module owns a `thiserror` enum. They all roll up into
//! [`AppError`], and every error exposes a stable code and a [`Severity`]
//! through [`ErrorCode`]. The controller turns any failure into a [`Notice`]
//! on a single queue, so the UI has exactly one place to read problems from.

use serde::Serialize;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::images::ImageError;
use crate::llm::types::LlmError;
use crate::menu::order::OrderError;
use crate::store::StoreError;

// =============================================================================
// SEVERITY + CODES
// =============================================================================

/// How loudly a notice should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Stable machine-readable code plus the severity used for reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn severity(&self) -> Severity {
        Severity::Error
    }
}

// =============================================================================
// APP ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("no restaurant selected")]
    NoRestaurant,
    #[error("no product form open")]
    NoDraft,
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(String),
    #[error("failed to load restaurant data: {0}")]
    Refresh(StoreError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Order(#[from] OrderError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl ErrorCode for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NoRestaurant => "E_NO_RESTAURANT",
            Self::NoDraft => "E_NO_DRAFT",
            Self::RestaurantNotFound(_) => "E_RESTAURANT_NOT_FOUND",
            Self::Refresh(_) => "E_REFRESH",
            Self::Store(e) => e.error_code(),
            Self::Auth(e) => e.error_code(),
            Self::Image(e) => e.error_code(),
            Self::Llm(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Order(e) => e.error_code(),
        }
    }

    fn severity(&self) -> Severity {
        match self {
            Self::Validation(_)
            | Self::NoRestaurant
            | Self::NoDraft
            | Self::Refresh(_)
            | Self::RestaurantNotFound(_) => Severity::Warning,
            Self::Store(e) => e.severity(),
            Self::Auth(e) => e.severity(),
            Self::Image(e) => e.severity(),
            Self::Llm(e) => e.severity(),
            Self::Config(e) => e.severity(),
            Self::Order(e) => e.severity(),
        }
    }
}

// =============================================================================
// NOTICE
// =============================================================================

/// A user-visible message. The only channel for reporting outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { severity: Severity::Info, code: None, message: message.into() }
    }

    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { severity: err.severity(), code: Some(err.error_code()), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
