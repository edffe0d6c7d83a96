use tracing::info;

use infra::db::Db;
use infra::repos::time_slots;

use crate::config::CatalogSlot;
use crate::types::TimeSlot;

/// Reconcile the configured catalog into `time_slots`.
///
/// Configured intervals are inserted or reactivated; every other slot is
/// deactivated. Rows are never deleted since bookings reference them.
pub async fn sync_catalog(db: &Db, catalog: &[CatalogSlot]) -> Result<Vec<TimeSlot>, sqlx::Error> {
    let mut tx = db.begin().await?;

    let mut active = Vec::with_capacity(catalog.len());
    for slot in catalog {
        let row = time_slots::upsert_active(&mut *tx, slot.start, slot.end).await?;
        active.push(TimeSlot::from(row));
    }

    let keep: Vec<i32> = active.iter().map(|s| s.id).collect();
    let retired = time_slots::deactivate_except(&mut *tx, &keep).await?;

    tx.commit().await?;

    info!(
        "Time-slot catalog synced: {} active, {} retired",
        active.len(),
        retired
    );
    Ok(active)
}

/// The active catalog in display order.
pub async fn load_catalog(db: &Db) -> Result<Vec<TimeSlot>, sqlx::Error> {
    Ok(time_slots::list_active(db)
        .await?
        .into_iter()
        .map(TimeSlot::from)
        .collect())
}
