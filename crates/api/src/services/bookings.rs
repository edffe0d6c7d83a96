use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use infra::db::{is_unique_violation, Db};
use infra::repos::bookings::{self, BookingFilter, CreateBooking, CONFIRMED_SLOT_KEY};
use infra::repos::rooms::{self, RoomScope};
use infra::repos::time_slots;

use crate::config::BookingConfig;
use crate::error::AppError;
use crate::services::availability::{has_started, last_bookable_day};
use crate::services::clock::Clock;
use crate::types::{Booking, SlotKey};

pub const MAX_BOOKER_NAME_LEN: usize = 100;

/// A booking request that passed shape validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub room_id: i32,
    pub date: NaiveDate,
    pub time_slot_id: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub booker_name: String,
}

impl NewBooking {
    pub fn new(
        room_id: i32,
        date: NaiveDate,
        time_slot_id: i32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        booker_name: &str,
    ) -> Result<Self, AppError> {
        let booker_name = booker_name.trim();
        let len = booker_name.chars().count();
        if len == 0 || len > MAX_BOOKER_NAME_LEN {
            return Err(AppError::validation(format!(
                "bookerName must be between 1 and {MAX_BOOKER_NAME_LEN} characters"
            )));
        }
        if end_time <= start_time {
            return Err(AppError::validation("endTime must be after startTime"));
        }

        Ok(Self {
            room_id,
            date,
            time_slot_id,
            start_time,
            end_time,
            booker_name: booker_name.to_string(),
        })
    }

    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            room_id: self.room_id,
            date: self.date,
            time_slot_id: self.time_slot_id,
        }
    }
}

/// Calendar rules for a booking on `date`.
///
/// `today` is the UTC calendar day of `now`. The date must lie in
/// `[today, today + max_advance_days]`.
pub fn check_booking_window(
    date: NaiveDate,
    now: DateTime<Utc>,
    config: &BookingConfig,
) -> Result<(), AppError> {
    let today = now.date_naive();

    if date < today {
        return Err(AppError::BookingInPast(format!(
            "{date} is before today ({today})"
        )));
    }

    if date > last_bookable_day(today, config)? {
        return Err(AppError::BookingDateOutOfRange {
            date,
            max_advance_days: config.max_advance_days,
        });
    }

    Ok(())
}

/// The slot starting at `slot_start` on `date` must not have started yet in
/// the configured timezone.
pub fn check_not_started(
    date: NaiveDate,
    slot_start: NaiveTime,
    now: DateTime<Utc>,
    config: &BookingConfig,
) -> Result<(), AppError> {
    if has_started(date, slot_start, config.timezone, now) {
        return Err(AppError::BookingInPast(format!(
            "the {} slot on {date} has already started",
            slot_start.format("%H:%M")
        )));
    }
    Ok(())
}

/// Validates booking rules and atomically reserves slots.
///
/// At most one confirmed booking per (room, date, slot) is guaranteed by the
/// `bookings_confirmed_slot_key` unique index. The read inside the
/// transaction only provides the precise error in the uncontended case.
#[derive(Clone)]
pub struct BookingGuard {
    db: Db,
    config: Arc<BookingConfig>,
    clock: Clock,
}

impl BookingGuard {
    pub fn new(db: Db, config: Arc<BookingConfig>, clock: Clock) -> Self {
        Self { db, config, clock }
    }

    pub async fn create_booking(&self, new: NewBooking) -> Result<Booking, AppError> {
        let now = self.clock.now();
        let key = new.slot_key();

        let mut tx = self.db.begin().await?;

        rooms::get_by_id(&mut *tx, new.room_id, RoomScope::Active)
            .await?
            .ok_or(AppError::RoomNotFound(new.room_id))?;

        check_booking_window(new.date, now, &self.config)?;

        let slot = time_slots::get_active_by_id(&mut *tx, new.time_slot_id)
            .await?
            .ok_or(AppError::TimeSlotNotFound(new.time_slot_id))?;

        if slot.start_time != new.start_time || slot.end_time != new.end_time {
            return Err(AppError::validation(format!(
                "time slot {} runs {}-{}, not {}-{}",
                slot.id,
                slot.start_time.format("%H:%M"),
                slot.end_time.format("%H:%M"),
                new.start_time.format("%H:%M"),
                new.end_time.format("%H:%M"),
            )));
        }

        check_not_started(new.date, slot.start_time, now, &self.config)?;

        if let Some(existing) =
            bookings::find_confirmed_for_slot(&mut *tx, new.room_id, new.date, new.time_slot_id)
                .await?
        {
            warn!("Booking conflict on {} (held by booking {})", key, existing.id);
            return Err(conflict(key));
        }

        let row = bookings::insert_confirmed(
            &mut *tx,
            CreateBooking {
                room_id: new.room_id,
                time_slot_id: slot.id,
                booker_name: new.booker_name,
                date: new.date,
                start_time: slot.start_time,
                end_time: slot.end_time,
            },
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e, CONFIRMED_SLOT_KEY) {
                warn!("Booking conflict on {} (lost insert race)", key);
                conflict(key)
            } else {
                AppError::Db(e)
            }
        })?;

        tx.commit().await?;

        info!("Created booking {} for {}", row.id, key);
        Ok(row.into())
    }

    /// Cancel a booking. Cancelling an already-cancelled booking returns it
    /// unchanged.
    pub async fn cancel_booking(&self, id: Uuid) -> Result<Booking, AppError> {
        if let Some(row) = bookings::cancel_confirmed(&self.db, id).await? {
            info!("Cancelled booking {}", row.id);
            return Ok(row.into());
        }

        bookings::get_by_id(&self.db, id)
            .await?
            .map(Booking::from)
            .ok_or(AppError::BookingNotFound(id))
    }

    pub async fn get_booking(&self, id: Uuid) -> Result<Booking, AppError> {
        bookings::get_by_id(&self.db, id)
            .await?
            .map(Booking::from)
            .ok_or(AppError::BookingNotFound(id))
    }

    pub async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, AppError> {
        Ok(bookings::list(&self.db, filter)
            .await?
            .into_iter()
            .map(Booking::from)
            .collect())
    }
}

fn conflict(key: SlotKey) -> AppError {
    AppError::BookingConflict {
        room_id: key.room_id,
        date: key.date,
        time_slot_id: key.time_slot_id,
    }
}
