use crate::models::{BookedSlotRow, BookingRow};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

/// Name of the partial unique index allowing one confirmed booking per
/// (room, date, time slot).
pub const CONFIRMED_SLOT_KEY: &str = "bookings_confirmed_slot_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub room_id: i32,
    pub time_slot_id: i32,
    pub booker_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub room_id: Option<i32>,
}

/// Insert a confirmed booking. Fails with a unique violation on
/// [`CONFIRMED_SLOT_KEY`] when the slot is already confirmed-booked.
pub async fn insert_confirmed<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateBooking,
) -> SqlxResult<BookingRow> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        WITH inserted AS (
            INSERT INTO bookings (room_id, time_slot_id, booker_name, date, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'confirmed'::booking_status)
            RETURNING id, room_id, time_slot_id, booker_name, date, start_time, end_time,
                      status, created_at, updated_at
        )
        SELECT b.id, b.room_id, r.name AS room_name, b.time_slot_id, b.booker_name, b.date,
               b.start_time, b.end_time, b.status, b.created_at, b.updated_at
        FROM inserted b
        JOIN rooms r ON r.id = b.room_id
        "#,
    )
    .bind(data.room_id)
    .bind(data.time_slot_id)
    .bind(data.booker_name)
    .bind(data.date)
    .bind(data.start_time)
    .bind(data.end_time)
    .fetch_one(executor)
    .await
}

pub async fn find_confirmed_for_slot<'e>(
    executor: impl PgExecutor<'e>,
    room_id: i32,
    date: NaiveDate,
    time_slot_id: i32,
) -> SqlxResult<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT b.id, b.room_id, r.name AS room_name, b.time_slot_id, b.booker_name, b.date,
               b.start_time, b.end_time, b.status, b.created_at, b.updated_at
        FROM bookings b
        JOIN rooms r ON r.id = b.room_id
        WHERE b.room_id = $1 AND b.date = $2 AND b.time_slot_id = $3
          AND b.status = 'confirmed'
        "#,
    )
    .bind(room_id)
    .bind(date)
    .bind(time_slot_id)
    .fetch_optional(executor)
    .await
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT b.id, b.room_id, r.name AS room_name, b.time_slot_id, b.booker_name, b.date,
               b.start_time, b.end_time, b.status, b.created_at, b.updated_at
        FROM bookings b
        JOIN rooms r ON r.id = b.room_id
        WHERE b.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    filter: BookingFilter,
) -> SqlxResult<Vec<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        SELECT b.id, b.room_id, r.name AS room_name, b.time_slot_id, b.booker_name, b.date,
               b.start_time, b.end_time, b.status, b.created_at, b.updated_at
        FROM bookings b
        JOIN rooms r ON r.id = b.room_id
        WHERE ($1::date IS NULL OR b.date = $1)
          AND ($2::int4 IS NULL OR b.room_id = $2)
        ORDER BY b.date ASC, b.start_time ASC, b.created_at ASC
        "#,
    )
    .bind(filter.date)
    .bind(filter.room_id)
    .fetch_all(executor)
    .await
}

/// Move a confirmed booking to cancelled. Returns `None` when no confirmed
/// booking has this id (missing, or already cancelled).
pub async fn cancel_confirmed<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<BookingRow>> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        WITH updated AS (
            UPDATE bookings
            SET status = $2::booking_status, updated_at = NOW()
            WHERE id = $1 AND status = 'confirmed'
            RETURNING id, room_id, time_slot_id, booker_name, date, start_time, end_time,
                      status, created_at, updated_at
        )
        SELECT b.id, b.room_id, r.name AS room_name, b.time_slot_id, b.booker_name, b.date,
               b.start_time, b.end_time, b.status, b.created_at, b.updated_at
        FROM updated b
        JOIN rooms r ON r.id = b.room_id
        "#,
    )
    .bind(id)
    .bind(BookingStatus::Cancelled.as_str())
    .fetch_optional(executor)
    .await
}

/// Triples held by confirmed bookings with `start <= date <= end`. An empty
/// room list covers every room.
pub async fn list_booked_slots<'e>(
    executor: impl PgExecutor<'e>,
    start: NaiveDate,
    end: NaiveDate,
    room_ids: &[i32],
) -> SqlxResult<Vec<BookedSlotRow>> {
    sqlx::query_as::<_, BookedSlotRow>(
        r#"
        SELECT room_id, date, time_slot_id
        FROM bookings
        WHERE date BETWEEN $1 AND $2
          AND (cardinality($3::int4[]) = 0 OR room_id = ANY($3))
          AND status = 'confirmed'
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(room_ids)
    .fetch_all(executor)
    .await
}
