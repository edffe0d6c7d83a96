use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppError;
use crate::routes::extract::AppQuery;
use crate::services::availability::mark_elapsed;
use crate::services::AvailabilityQuery;
use crate::state::AppState;
use crate::types::{parse_date, AvailableSlot};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Comma-separated room ids; empty or absent means every active room.
    pub room_ids: Option<String>,
}

pub fn parse_room_ids(raw: Option<&str>) -> Result<Vec<i32>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<i32>()
                .map_err(|_| AppError::validation(format!("invalid room id '{id}'")))
        })
        .collect()
}

/// Flattened availability grid for rooms × days × catalog slots. Slots that
/// have already started are reported unavailable.
pub async fn list_time_slots(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TimeSlotsQuery>,
) -> Result<Json<Vec<AvailableSlot>>, AppError> {
    let (Some(start_date), Some(end_date)) = (query.start_date, query.end_date) else {
        return Err(AppError::validation("Missing required date parameters"));
    };
    let start_date = parse_date(&start_date).map_err(AppError::ValidationFailed)?;
    let end_date = parse_date(&end_date).map_err(AppError::ValidationFailed)?;
    let room_ids = parse_room_ids(query.room_ids.as_deref())?;

    let now = state.clock().now();
    let query = AvailabilityQuery::new(
        start_date,
        end_date,
        room_ids,
        now.date_naive(),
        state.config(),
    )?;

    let mut slots = state.availability().available_slots(&query).await?;
    mark_elapsed(&mut slots, state.config().timezone, now);

    Ok(Json(slots))
}
