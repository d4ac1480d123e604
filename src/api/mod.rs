//! Administrative API subsystem.
//!
//! # Data Flow
//! ```text
//! GET/POST/PUT/DELETE /rules[/{id}]
//!     → rules.rs → RuleStore (dynamic partition mutations only)
//!
//! GET/POST/PUT /servers[/{id}]
//!     → servers.rs → ServerStore (name uniqueness enforced on save)
//!
//! GET /requests[/{id}]
//!     → requests.rs → ExchangeCache (read-only inspection)
//! ```
//!
//! # Design Decisions
//! - Thin CRUD wrappers: every decision lives in the stores, the handlers
//!   only translate DTOs and map store errors to HTTP statuses
//! - Served on a separate listener so the proxy endpoint and the operator
//!   surface never share a port

pub mod dto;
pub mod requests;
pub mod rules;
pub mod servers;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::error::StoreError;
use crate::proxy::server::AppState;

/// Assemble the administrative router.
pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/rules", get(rules::get_all).post(rules::create))
        .route(
            "/rules/{id}",
            get(rules::get_one).put(rules::update).delete(rules::remove),
        )
        .route("/servers", get(servers::get_all).post(servers::create))
        .route("/servers/{id}", get(servers::get_one).put(servers::update))
        .route("/requests", get(requests::get_all))
        .route("/requests/{id}", get(requests::get_one))
        .with_state(state)
}

/// Failures surfaced to the administrative caller.
#[derive(Debug)]
pub enum ApiError {
    /// Target entity does not exist.
    NotFound,
    /// Store rejected the mutation.
    Store(StoreError),
    /// Payload failed DTO validation.
    Invalid(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Store(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(dto::ApiFailure::new(message))).into_response()
    }
}
