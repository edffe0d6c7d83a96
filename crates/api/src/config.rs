use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use std::env;

use crate::types::parse_hhmm;

pub const DEFAULT_MAX_ADVANCE_DAYS: i64 = 90;
/// Upper bound for `BOOKING_MAX_ADVANCE_DAYS` (about ten years).
pub const MAX_ADVANCE_DAYS_LIMIT: i64 = 3650;
pub const DEFAULT_TIMEZONE: &str = "Europe/Stockholm";
pub const DEFAULT_TIME_SLOTS: &str = "08:00-09:00,09:00-10:00,10:00-11:00,11:00-12:00,\
12:00-13:00,13:00-14:00,14:00-15:00,15:00-16:00,16:00-17:00";

/// One configured catalog interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Booking rules consumed by the availability resolver and the booking guard.
#[derive(Clone, Debug)]
pub struct BookingConfig {
    /// How many days past today a booking may be made.
    pub max_advance_days: i64,
    /// Timezone in which slot start times are interpreted.
    pub timezone: Tz,
    /// Ordered, non-overlapping catalog of bookable intervals.
    pub catalog: Vec<CatalogSlot>,
}

impl BookingConfig {
    pub fn from_env() -> Result<Self> {
        let max_advance_days =
            parse_max_advance_days(env::var("BOOKING_MAX_ADVANCE_DAYS").ok().as_deref())?;

        let timezone = parse_timezone(
            &env::var("BOOKING_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
        )?;

        let catalog = parse_catalog(
            &env::var("BOOKING_TIME_SLOTS").unwrap_or_else(|_| DEFAULT_TIME_SLOTS.to_string()),
        )
        .context("invalid BOOKING_TIME_SLOTS")?;

        Ok(Self {
            max_advance_days,
            timezone,
            catalog,
        })
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_advance_days: DEFAULT_MAX_ADVANCE_DAYS,
            timezone: chrono_tz::Europe::Stockholm,
            catalog: parse_catalog(DEFAULT_TIME_SLOTS).unwrap_or_default(),
        }
    }
}

/// Parse `BOOKING_MAX_ADVANCE_DAYS`; `None` yields the default.
pub fn parse_max_advance_days(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_ADVANCE_DAYS);
    };
    let days = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("BOOKING_MAX_ADVANCE_DAYS is not an integer: {raw}"))?;
    if !(0..=MAX_ADVANCE_DAYS_LIMIT).contains(&days) {
        bail!("BOOKING_MAX_ADVANCE_DAYS must be between 0 and {MAX_ADVANCE_DAYS_LIMIT}, got {days}");
    }
    Ok(days)
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("unknown timezone '{name}': {e}"))
}

/// Parse `"HH:MM-HH:MM,HH:MM-HH:MM,..."` into catalog slots sorted by start
/// time. Rejects empty catalogs, reversed intervals and overlaps.
pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogSlot>> {
    let mut slots = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (start, end) = entry
            .split_once('-')
            .with_context(|| format!("time slot '{entry}' is not HH:MM-HH:MM"))?;
        let start = parse_hhmm(start.trim()).map_err(anyhow::Error::msg)?;
        let end = parse_hhmm(end.trim()).map_err(anyhow::Error::msg)?;
        if end <= start {
            bail!("time slot '{entry}' must end after it starts");
        }
        slots.push(CatalogSlot { start, end });
    }

    if slots.is_empty() {
        bail!("time slot catalog is empty");
    }

    slots.sort_by_key(|s| (s.start, s.end));
    for pair in slots.windows(2) {
        if pair[1].start < pair[0].end {
            bail!(
                "time slots {}-{} and {}-{} overlap",
                pair[0].start.format("%H:%M"),
                pair[0].end.format("%H:%M"),
                pair[1].start.format("%H:%M"),
                pair[1].end.format("%H:%M"),
            );
        }
    }

    Ok(slots)
}
