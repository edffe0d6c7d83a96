mod common;

use std::collections::HashSet;

use api::services::{AvailabilityQuery, NewBooking};
use api::types::SlotKey;
use chrono::{Duration, TimeZone, Utc};
use common::*;

#[tokio::test]
async fn test_grid_covers_every_room_day_and_slot() {
    let state = setup_test_db().await;
    let alpha = create_test_room(&state, "Grid Alpha").await;
    let beta = create_test_room(&state, "Grid Beta").await;
    let catalog = api::services::load_catalog(&state.db).await.unwrap();

    let start = today() + Duration::days(1);
    let end = today() + Duration::days(3);
    let query = AvailabilityQuery::new(start, end, vec![alpha.id, beta.id], today(), state.config())
        .unwrap();
    let grid = state.availability().available_slots(&query).await.unwrap();

    assert_eq!(grid.len(), 3 * 2 * catalog.len());
    let keys: HashSet<SlotKey> = grid.iter().map(|s| s.key).collect();
    assert_eq!(keys.len(), grid.len());
    assert!(grid.iter().all(|s| s.available));
    assert!(grid
        .iter()
        .all(|s| s.date >= start && s.date <= end && (s.room_id == alpha.id || s.room_id == beta.id)));
}

#[tokio::test]
async fn test_confirmed_booking_masks_exactly_one_cell() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Mask Room").await;
    let other = create_test_room(&state, "Mask Neighbour").await;
    let slot = first_slot(&state).await;
    let date = today() + Duration::days(1);

    let booking = state
        .bookings()
        .create_booking(
            NewBooking::new(room.id, date, slot.id, slot.start_time, slot.end_time, "A").unwrap(),
        )
        .await
        .unwrap();

    let query = AvailabilityQuery::new(
        today(),
        today() + Duration::days(2),
        vec![room.id, other.id],
        today(),
        state.config(),
    )
    .unwrap();
    let grid = state.availability().available_slots(&query).await.unwrap();

    let taken: Vec<SlotKey> = grid.iter().filter(|s| !s.available).map(|s| s.key).collect();
    assert_eq!(taken, vec![booking.slot_key()]);

    state.bookings().cancel_booking(booking.id).await.unwrap();

    let grid = state.availability().available_slots(&query).await.unwrap();
    assert!(
        grid.iter().all(|s| s.available),
        "cancelled bookings must not hold a slot"
    );
}

#[tokio::test]
async fn test_deleted_rooms_are_left_out() {
    let state = setup_test_db().await;
    let kept = create_test_room(&state, "Kept Room").await;
    let gone = create_test_room(&state, "Gone Room").await;
    state.rooms().soft_delete(gone.id).await.unwrap();

    let query = AvailabilityQuery::new(today(), today(), vec![kept.id, gone.id], today(), state.config())
        .unwrap();
    let grid = state.availability().available_slots(&query).await.unwrap();

    assert!(!grid.is_empty());
    assert!(grid.iter().all(|s| s.room_id == kept.id));

    let all_rooms = AvailabilityQuery::new(today(), today(), vec![], today(), state.config()).unwrap();
    let grid = state.availability().available_slots(&all_rooms).await.unwrap();
    assert!(grid.iter().any(|s| s.room_id == kept.id));
    assert!(grid.iter().all(|s| s.room_id != gone.id));
}

#[tokio::test]
async fn test_rooms_for_date_marks_started_slots() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Day View Room").await;
    let catalog = api::services::load_catalog(&state.db).await.unwrap();
    // 09:30 in Stockholm: the 08:00 and 09:00 slots have started.
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap();

    let rooms = state
        .availability()
        .rooms_for_date(today(), state.config().timezone, now)
        .await
        .unwrap();
    let day = rooms
        .iter()
        .find(|r| r.room.id == room.id)
        .expect("new room should be listed");

    assert_eq!(day.time_slots.len(), catalog.len());
    let elapsed = day.time_slots.iter().filter(|s| s.elapsed).count();
    assert_eq!(elapsed, 2);
    assert!(day.time_slots[..2].iter().all(|s| !s.available));
    assert!(day.time_slots[2..].iter().all(|s| s.available && !s.elapsed));
}
