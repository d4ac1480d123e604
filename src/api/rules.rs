//! Rule CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::dto::{ApiResponse, RuleDto};
use crate::api::ApiError;
use crate::proxy::server::AppState;

pub async fn get_all(State(state): State<AppState>) -> impl IntoResponse {
    let rules: Vec<RuleDto> = state
        .rules
        .get_all()
        .iter()
        .map(RuleDto::from_rule)
        .collect();
    Json(ApiResponse::ok(rules))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state.rules.get(id).ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok(RuleDto::from_rule(&rule))))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<RuleDto>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rule = payload.into_rule().map_err(ApiError::Invalid)?;
    rule.id = 0;
    let saved = state.rules.save(rule)?;
    tracing::info!(rule_id = saved.id, service = %saved.service, "rule created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RuleDto::from_rule(&saved))),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RuleDto>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rule = payload.into_rule().map_err(ApiError::Invalid)?;
    rule.id = id;
    let saved = state.rules.save(rule)?;
    tracing::info!(rule_id = saved.id, "rule updated");
    Ok(Json(ApiResponse::ok(RuleDto::from_rule(&saved))))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.rules.remove(id) {
        // distinguish a missing target from a protected one
        return match state.rules.get(id) {
            None => Err(ApiError::NotFound),
            Some(_) => Err(ApiError::Invalid("failed to remove rule".to_string())),
        };
    }
    tracing::info!(rule_id = id, "rule removed");
    Ok(Json(ApiResponse::ok(())))
}
