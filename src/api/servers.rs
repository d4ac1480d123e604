//! Server CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::dto::{ApiResponse, ServerDto};
use crate::api::ApiError;
use crate::proxy::server::AppState;

pub async fn get_all(State(state): State<AppState>) -> impl IntoResponse {
    let servers: Vec<ServerDto> = state
        .servers
        .get_all()
        .iter()
        .map(ServerDto::from_server)
        .collect();
    Json(ApiResponse::ok(servers))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let server = state.servers.get(id).ok_or(ApiError::NotFound)?;
    Ok(Json(ApiResponse::ok(ServerDto::from_server(&server))))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ServerDto>,
) -> Result<impl IntoResponse, ApiError> {
    let mut server = payload.into_server().map_err(ApiError::Invalid)?;
    server.id = 0;
    let saved = state.servers.save(server)?;
    tracing::info!(server_id = saved.id, name = %saved.name, "server created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ServerDto::from_server(&saved))),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ServerDto>,
) -> Result<impl IntoResponse, ApiError> {
    let mut server = payload.into_server().map_err(ApiError::Invalid)?;
    server.id = id;
    let saved = state.servers.save(server)?;
    tracing::info!(server_id = saved.id, name = %saved.name, "server updated");
    Ok(Json(ApiResponse::ok(ServerDto::from_server(&saved))))
}
