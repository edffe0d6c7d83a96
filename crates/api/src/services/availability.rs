use std::collections::HashSet;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use infra::db::Db;
use infra::models::BookedSlotRow;
use infra::repos::{bookings, rooms};

use crate::config::BookingConfig;
use crate::error::AppError;
use crate::services::catalog::load_catalog;
use crate::types::{AvailableSlot, Room, RoomAvailability, RoomSlotAvailability, SlotKey, TimeSlot};

/// A validated availability request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub room_ids: Vec<i32>,
}

impl AvailabilityQuery {
    /// Check a requested range against the advance window relative to `today`.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        room_ids: Vec<i32>,
        today: NaiveDate,
        config: &BookingConfig,
    ) -> Result<Self, AppError> {
        if end_date < start_date {
            return Err(AppError::validation("endDate must not be before startDate"));
        }

        let horizon = last_bookable_day(today, config)?;
        if end_date > horizon {
            return Err(AppError::BookingDateOutOfRange {
                date: end_date,
                max_advance_days: config.max_advance_days,
            });
        }

        let days = (end_date - start_date).num_days() + 1;
        let max_days = config.max_advance_days.saturating_add(1);
        if days > max_days {
            return Err(AppError::validation(format!(
                "date range spans {days} days, at most {max_days} allowed"
            )));
        }

        Ok(Self {
            start_date,
            end_date,
            room_ids,
        })
    }
}

/// `today + max_advance_days`, the last day open for booking.
pub fn last_bookable_day(today: NaiveDate, config: &BookingConfig) -> Result<NaiveDate, AppError> {
    Duration::try_days(config.max_advance_days)
        .and_then(|window| today.checked_add_signed(window))
        .ok_or_else(|| {
            AppError::Internal(format!(
                "advance window of {} days from {today} leaves the calendar",
                config.max_advance_days
            ))
        })
}

/// The UTC instant at which `time` on `date` begins in `tz`.
///
/// Ambiguous wall times resolve to the earlier instant; wall times skipped by
/// a DST jump resolve to the first valid instant after the gap.
pub fn slot_start_instant(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let local = date.and_time(time);
    let resolved = match tz.from_local_datetime(&local) {
        LocalResult::Single(at) | LocalResult::Ambiguous(at, _) => Some(at),
        LocalResult::None => tz.from_local_datetime(&(local + Duration::hours(1))).earliest(),
    };
    resolved
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// Whether a slot starting at `time` on `date` has already begun at `now`.
pub fn has_started(date: NaiveDate, time: NaiveTime, tz: Tz, now: DateTime<Utc>) -> bool {
    slot_start_instant(date, time, tz) <= now
}

/// Build the full rooms × days × catalog grid.
///
/// Each cell is available unless a confirmed booking holds exactly its
/// (room, date, slot) triple. Order: rooms as given, days ascending, catalog
/// order within a day.
pub fn resolve(
    catalog: &[TimeSlot],
    rooms: &[Room],
    booked: &[BookedSlotRow],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Vec<AvailableSlot> {
    let booked: HashSet<SlotKey> = booked.iter().map(SlotKey::from).collect();
    let days: Vec<NaiveDate> = start_date
        .iter_days()
        .take_while(|d| *d <= end_date)
        .collect();

    let mut grid = Vec::with_capacity(rooms.len() * days.len() * catalog.len());
    for room in rooms {
        for &date in &days {
            for slot in catalog {
                let key = SlotKey {
                    room_id: room.id,
                    date,
                    time_slot_id: slot.id,
                };
                grid.push(AvailableSlot {
                    key,
                    room_id: room.id,
                    room_name: room.name.clone(),
                    capacity: room.capacity,
                    time_slot_id: slot.id,
                    date,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    available: !booked.contains(&key),
                    elapsed: false,
                });
            }
        }
    }
    grid
}

/// Mark every slot that has already started as elapsed and unavailable.
pub fn mark_elapsed(slots: &mut [AvailableSlot], tz: Tz, now: DateTime<Utc>) {
    for slot in slots.iter_mut() {
        if has_started(slot.date, slot.start_time, tz, now) {
            slot.elapsed = true;
            slot.available = false;
        }
    }
}

/// Computes which slots are free from the catalog, the rooms and the
/// confirmed bookings.
#[derive(Clone)]
pub struct AvailabilityResolver {
    db: Db,
}

impl AvailabilityResolver {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Booking-derived availability for the query. Does not apply the
    /// elapsed-slot rule; see [`mark_elapsed`].
    pub async fn available_slots(&self, query: &AvailabilityQuery) -> Result<Vec<AvailableSlot>, AppError> {
        let (catalog, room_rows, booked) = tokio::try_join!(
            load_catalog(&self.db),
            rooms::list_active_by_ids(&self.db, &query.room_ids),
            bookings::list_booked_slots(
                &self.db,
                query.start_date,
                query.end_date,
                &query.room_ids
            ),
        )?;
        let rooms: Vec<Room> = room_rows.into_iter().map(Room::from).collect();

        Ok(resolve(
            &catalog,
            &rooms,
            &booked,
            query.start_date,
            query.end_date,
        ))
    }

    /// Every active room with its catalog slots for a single day, with the
    /// elapsed-slot rule applied.
    pub async fn rooms_for_date(
        &self,
        date: NaiveDate,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<Vec<RoomAvailability>, AppError> {
        let query = AvailabilityQuery {
            start_date: date,
            end_date: date,
            room_ids: Vec::new(),
        };
        let (catalog, room_rows, booked) = tokio::try_join!(
            load_catalog(&self.db),
            rooms::list_active_by_ids(&self.db, &query.room_ids),
            bookings::list_booked_slots(&self.db, date, date, &query.room_ids),
        )?;
        let rooms: Vec<Room> = room_rows.into_iter().map(Room::from).collect();

        let mut grid = resolve(&catalog, &rooms, &booked, date, date);
        mark_elapsed(&mut grid, tz, now);

        let mut cells = grid.into_iter();
        Ok(rooms
            .into_iter()
            .map(|room| RoomAvailability {
                room,
                date,
                time_slots: cells
                    .by_ref()
                    .take(catalog.len())
                    .map(|cell| RoomSlotAvailability {
                        key: cell.key,
                        start_time: cell.start_time,
                        end_time: cell.end_time,
                        available: cell.available,
                        elapsed: cell.elapsed,
                    })
                    .collect(),
            })
            .collect())
    }
}
