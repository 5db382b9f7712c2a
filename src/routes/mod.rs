//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The public side of the app over HTTP: the landing list, a restaurant's
//! menu as JSON, the `?menu={slug}` link the admin shares, and WhatsApp
//! order composition. Reads go straight to the data store with the anon
//! key; nothing here needs a session.

pub mod menu;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::error::{AppError, ErrorCode, Notice, Severity};
use crate::store::DataStore;

/// Shared state for the public routes.
#[derive(Clone)]
pub struct RouteState {
    pub store: Arc<dyn DataStore>,
    pub public_origin: Url,
}

/// Error body returned by every API route.
pub type ApiError = (StatusCode, Json<Notice>);

pub fn app(state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(menu::landing))
        .route("/api/restaurants", get(menu::list_restaurants))
        .route("/api/menu/{slug}", get(menu::get_menu))
        .route("/api/menu/{slug}/order", post(menu::create_order))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map an [`AppError`] onto a status code and a notice body.
pub(crate) fn error_response(err: &AppError) -> ApiError {
    let status = match err {
        AppError::RestaurantNotFound(_) => StatusCode::NOT_FOUND,
        AppError::Validation(_) | AppError::Order(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Store(_) | AppError::Refresh(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    match err.severity() {
        Severity::Error => tracing::error!(code = err.error_code(), error = %err, "request failed"),
        _ => tracing::debug!(code = err.error_code(), error = %err, "request rejected"),
    }
    (status, Json(Notice::from_error(err)))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
