use crate::repos::bookings::BookingStatus;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RoomRow {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TimeSlotRow {
    pub id: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_active: bool,
}

/// A booking joined with the name of its room.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookingRow {
    pub id: Uuid,
    pub room_id: i32,
    pub room_name: String,
    pub time_slot_id: i32,
    pub booker_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The (room, date, slot) triple occupied by a confirmed booking.
#[derive(Debug, Clone, Copy, FromRow, PartialEq, Eq, Hash)]
pub struct BookedSlotRow {
    pub room_id: i32,
    pub date: NaiveDate,
    pub time_slot_id: i32,
}
