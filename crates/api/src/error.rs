use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("room {0} not found")]
    RoomNotFound(i32),

    #[error("time slot {0} not found")]
    TimeSlotNotFound(i32),

    #[error("booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("time slot {time_slot_id} in room {room_id} on {date} is already booked")]
    BookingConflict {
        room_id: i32,
        date: NaiveDate,
        time_slot_id: i32,
    },

    #[error("booking date {date} is more than {max_advance_days} days ahead")]
    BookingDateOutOfRange {
        date: NaiveDate,
        max_advance_days: i64,
    },

    #[error("booking time has already passed: {0}")]
    BookingInPast(String),

    #[error("a room named '{0}' already exists")]
    DuplicateName(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("database error")]
    Db(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationFailed(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RoomNotFound(_)
            | AppError::TimeSlotNotFound(_)
            | AppError::BookingNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BookingConflict { .. } | AppError::DuplicateName(_) => StatusCode::CONFLICT,
            AppError::BookingDateOutOfRange { .. }
            | AppError::BookingInPast(_)
            | AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            AppError::TimeSlotNotFound(_) => "TIME_SLOT_NOT_FOUND",
            AppError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            AppError::BookingConflict { .. } => "BOOKING_CONFLICT",
            AppError::BookingDateOutOfRange { .. } => "BOOKING_DATE_OUT_OF_RANGE",
            AppError::BookingInPast(_) => "BOOKING_IN_PAST",
            AppError::DuplicateName(_) => "DUPLICATE_NAME",
            AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::Db(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationFailed(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationFailed(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Db(e) => {
                // Log the real error server-side; never expose it to clients
                tracing::error!("Database error: {e}");
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (
            status,
            Json(ErrorBody {
                error: message,
                code: self.code(),
            }),
        )
            .into_response()
    }
}
