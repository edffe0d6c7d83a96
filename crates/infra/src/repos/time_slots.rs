use crate::models::TimeSlotRow;
use chrono::NaiveTime;
use sqlx::{PgExecutor, Result as SqlxResult};

/// The active catalog in display order.
pub async fn list_active<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<Vec<TimeSlotRow>> {
    sqlx::query_as::<_, TimeSlotRow>(
        r#"
        SELECT id, start_time, end_time, is_active
        FROM time_slots
        WHERE is_active = true
        ORDER BY start_time ASC, end_time ASC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn get_active_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: i32,
) -> SqlxResult<Option<TimeSlotRow>> {
    sqlx::query_as::<_, TimeSlotRow>(
        r#"
        SELECT id, start_time, end_time, is_active
        FROM time_slots
        WHERE id = $1 AND is_active = true
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Insert the interval if it is new, otherwise reactivate the existing row.
pub async fn upsert_active<'e>(
    executor: impl PgExecutor<'e>,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> SqlxResult<TimeSlotRow> {
    sqlx::query_as::<_, TimeSlotRow>(
        r#"
        INSERT INTO time_slots (start_time, end_time, is_active)
        VALUES ($1, $2, true)
        ON CONFLICT (start_time, end_time) DO UPDATE SET is_active = true
        RETURNING id, start_time, end_time, is_active
        "#,
    )
    .bind(start_time)
    .bind(end_time)
    .fetch_one(executor)
    .await
}

/// Deactivate every active slot not listed in `keep_ids`. Returns how many
/// slots were retired.
pub async fn deactivate_except<'e>(executor: impl PgExecutor<'e>, keep_ids: &[i32]) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE time_slots
        SET is_active = false
        WHERE is_active = true AND NOT (id = ANY($1))
        "#,
    )
    .bind(keep_ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
