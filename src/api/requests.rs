//! Exchange inspection handlers.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::api::dto::{ApiResponse, ExchangeDto};
use crate::api::ApiError;
use crate::proxy::server::AppState;

/// List cached exchanges, newest data without bodies.
pub async fn get_all(State(state): State<AppState>) -> impl IntoResponse {
    let exchanges: Vec<ExchangeDto> = state
        .exchanges
        .get_all()
        .iter()
        .map(ExchangeDto::summary)
        .collect();
    Json(ApiResponse::ok(exchanges))
}

/// Full view of one exchange, bodies included.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let exchange = state.exchanges.get(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok(ExchangeDto::full(&exchange))))
}
