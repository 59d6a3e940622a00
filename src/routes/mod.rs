//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API for both admin apps under `/api`, one
//! route module per screen group. Handlers translate HTTP into service
//! calls and map service errors to an [`ApiError`] with a status chosen
//! per variant.

pub mod auth;
pub mod crud;
pub mod documents;
pub mod erp;
pub mod exports;
pub mod reports;
pub mod store;
pub mod uploads;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ErrorCode};
use crate::finance::CostingError;
use crate::remote::RemoteError;
use crate::services::entity::EntityError;
use crate::services::uploads::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Multipart bodies may carry several images at the per-file limit.
const MAX_BODY_BYTES: usize = 4 * MAX_UPLOAD_BYTES;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .merge(auth::routes())
        .merge(store::routes())
        .merge(erp::routes())
        .merge(reports::routes())
        .merge(documents::routes())
        .merge(exports::routes())
        .merge(uploads::routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

pub(crate) fn remote_status(err: &RemoteError) -> StatusCode {
    match err {
        RemoteError::Unauthorized | RemoteError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        RemoteError::Conflict(_) => StatusCode::CONFLICT,
        RemoteError::Response { status: 403, .. } => StatusCode::FORBIDDEN,
        RemoteError::Response { status: 404, .. } => StatusCode::NOT_FOUND,
        RemoteError::Response { status: 400 | 422, .. } => StatusCode::BAD_REQUEST,
        RemoteError::Request(_) | RemoteError::Response { .. } | RemoteError::Decode(_) => StatusCode::BAD_GATEWAY,
        RemoteError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wrap `err` with `status`, logging server-side failures.
pub(crate) fn api_error<E: ErrorCode>(status: StatusCode, err: &E) -> ApiError {
    if status.is_server_error() {
        tracing::error!(code = err.error_code(), retryable = err.retryable(), error = %err, "request failed");
    } else {
        tracing::warn!(code = err.error_code(), error = %err, "request rejected");
    }
    ApiError::from_code(status, err)
}

pub(crate) fn remote_error_to_api(err: RemoteError) -> ApiError {
    api_error(remote_status(&err), &err)
}

pub(crate) fn entity_status(err: &EntityError) -> StatusCode {
    match err {
        EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
        EntityError::Remote(e) => remote_status(e),
    }
}

pub(crate) fn entity_error_to_api(err: EntityError) -> ApiError {
    api_error(entity_status(&err), &err)
}

pub(crate) fn costing_status(err: &CostingError) -> StatusCode {
    match err {
        CostingError::UnknownCurrency(_) => StatusCode::BAD_REQUEST,
        CostingError::NonPositiveQuantity { .. } | CostingError::MissingIngredient(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CostingError::Overflow => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
