use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use infra::repos::BookingFilter;

use crate::error::AppError;
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::NewBooking;
use crate::state::AppState;
use crate::types::{parse_date, parse_hhmm, Booking};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub date: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_id: i32,
    pub booker_name: String,
    pub date: String,
    pub time_slot_id: i32,
    pub start_time: String,
    pub end_time: String,
}

impl TryFrom<CreateBookingRequest> for NewBooking {
    type Error = AppError;

    fn try_from(req: CreateBookingRequest) -> Result<Self, Self::Error> {
        NewBooking::new(
            req.room_id,
            parse_date(&req.date).map_err(AppError::ValidationFailed)?,
            req.time_slot_id,
            parse_hhmm(&req.start_time).map_err(AppError::ValidationFailed)?,
            parse_hhmm(&req.end_time).map_err(AppError::ValidationFailed)?,
            &req.booker_name,
        )
    }
}

pub async fn list_bookings(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let date = query
        .date
        .as_deref()
        .map(parse_date)
        .transpose()
        .map_err(AppError::ValidationFailed)?;
    let room_id = query
        .room_id
        .as_deref()
        .map(|id| {
            id.trim()
                .parse::<i32>()
                .map_err(|_| AppError::validation("Invalid roomId"))
        })
        .transpose()?;

    let bookings = state
        .bookings()
        .list_bookings(BookingFilter { date, room_id })
        .await?;
    Ok(Json(bookings))
}

pub async fn create_booking(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.bookings().create_booking(body.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings().get_booking(id).await?))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings().cancel_booking(id).await?))
}
