use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::RoomPatch;
use crate::state::AppState;
use crate::types::{parse_date, Room};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRoomsQuery {
    pub date: Option<String>,
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub capacity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub capacity: Option<i32>,
}

/// Active rooms. With `date`, each room carries that day's slot availability;
/// with `includeDeleted=true`, soft-deleted rooms are listed too.
pub async fn list_rooms(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListRoomsQuery>,
) -> Result<Response, AppError> {
    if let Some(date) = query.date.as_deref() {
        let date = parse_date(date).map_err(AppError::ValidationFailed)?;
        let rooms = state
            .availability()
            .rooms_for_date(date, state.config().timezone, state.clock().now())
            .await?;
        return Ok(Json(rooms).into_response());
    }

    let rooms = if query.include_deleted.unwrap_or(false) {
        state.rooms().find_all().await?
    } else {
        state.rooms().find_active().await?
    };
    Ok(Json(rooms).into_response())
}

pub async fn create_room(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let room = state.rooms().create(&body.name, body.capacity).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(state.rooms().get(id).await?))
}

pub async fn update_room(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(body): AppJson<UpdateRoomRequest>,
) -> Result<Json<Room>, AppError> {
    let patch = RoomPatch {
        name: body.name,
        capacity: body.capacity,
    };
    Ok(Json(state.rooms().update(id, patch).await?))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(state.rooms().soft_delete(id).await?))
}

pub async fn restore_room(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(state.rooms().restore(id).await?))
}
