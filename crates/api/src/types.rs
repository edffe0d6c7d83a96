use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use infra::models::{BookedSlotRow, BookingRow, RoomRow, TimeSlotRow};
use infra::repos::BookingStatus;

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let b = s.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b
            .iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return Err(format!("invalid date '{s}', expected YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("invalid date '{s}'"))
}

/// Parse a strict `HH:MM` time of day.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    let b = s.as_bytes();
    let shaped = b.len() == 5
        && b[2] == b':'
        && b
            .iter()
            .enumerate()
            .all(|(i, c)| i == 2 || c.is_ascii_digit());
    if !shaped {
        return Err(format!("invalid time '{s}', expected HH:MM"));
    }
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| format!("invalid time '{s}'"))
}

/// Serde adapter for `HH:MM` times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_hhmm(&s).map_err(de::Error::custom)
    }
}

/// Identifies one bookable slot: a room on a calendar day in a catalog slot.
///
/// Serialized as a JSON object. The text form `"<roomId>/<YYYY-MM-DD>/<timeSlotId>"`
/// has a fixed field order and a separator that cannot occur inside any
/// field, so it always splits back into exactly the same three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotKey {
    pub room_id: i32,
    pub date: NaiveDate,
    pub time_slot_id: i32,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.room_id,
            self.date.format("%Y-%m-%d"),
            self.time_slot_id
        )
    }
}

impl FromStr for SlotKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        let (Some(room), Some(date), Some(slot), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("invalid slot key '{s}'"));
        };

        let room_id = room
            .parse::<i32>()
            .map_err(|_| format!("invalid room id in slot key '{s}'"))?;
        let time_slot_id = slot
            .parse::<i32>()
            .map_err(|_| format!("invalid time slot id in slot key '{s}'"))?;

        Ok(SlotKey {
            room_id,
            date: parse_date(date)?,
            time_slot_id,
        })
    }
}

impl From<&BookedSlotRow> for SlotKey {
    fn from(row: &BookedSlotRow) -> Self {
        SlotKey {
            room_id: row.room_id,
            date: row.date,
            time_slot_id: row.time_slot_id,
        }
    }
}

/// Lifecycle state of a room. Soft-deleted rooms keep their row for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RoomState {
    Active,
    Deleted {
        #[serde(rename = "deletedAt")]
        deleted_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    #[serde(flatten)]
    pub state: RoomState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn is_active(&self) -> bool {
        self.state == RoomState::Active
    }
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        let state = match row.deleted_at {
            None => RoomState::Active,
            Some(deleted_at) => RoomState::Deleted { deleted_at },
        };
        Room {
            id: row.id,
            name: row.name,
            capacity: row.capacity,
            state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: i32,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl From<TimeSlotRow> for TimeSlot {
    fn from(row: TimeSlotRow) -> Self {
        TimeSlot {
            id: row.id,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub room_id: i32,
    pub room_name: String,
    pub time_slot_id: i32,
    pub booker_name: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            room_id: self.room_id,
            date: self.date,
            time_slot_id: self.time_slot_id,
        }
    }
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            room_id: row.room_id,
            room_name: row.room_name,
            time_slot_id: row.time_slot_id,
            booker_name: row.booker_name,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// One cell of the availability grid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    pub key: SlotKey,
    pub room_id: i32,
    pub room_name: String,
    pub capacity: i32,
    pub time_slot_id: i32,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    /// False when the slot is taken, or has already started.
    pub available: bool,
    /// The slot's start time has passed in the display timezone.
    pub elapsed: bool,
}

/// Catalog slot availability for one room on one day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSlotAvailability {
    pub key: SlotKey,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub available: bool,
    pub elapsed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomAvailability {
    #[serde(flatten)]
    pub room: Room,
    pub date: NaiveDate,
    pub time_slots: Vec<RoomSlotAvailability>,
}
