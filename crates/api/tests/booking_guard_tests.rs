mod common;

use api::config::BookingConfig;
use api::error::AppError;
use api::services::{Clock, NewBooking};
use api::AppState;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use common::*;
use futures_util::future::join_all;
use infra::repos::{BookingFilter, BookingStatus};

fn booking_for(room_id: i32, date: NaiveDate, slot: &api::types::TimeSlot, name: &str) -> NewBooking {
    NewBooking::new(room_id, date, slot.id, slot.start_time, slot.end_time, name)
        .expect("valid booking input")
}

#[tokio::test]
async fn test_book_then_rebook_same_slot_conflicts() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Guard Room").await;
    let slot = first_slot(&state).await;
    let tomorrow = today() + Duration::days(1);

    let booking = state
        .bookings()
        .create_booking(booking_for(room.id, tomorrow, &slot, "A"))
        .await
        .expect("first booking should succeed");

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.room_id, room.id);
    assert_eq!(booking.room_name, room.name);
    assert_eq!(booking.date, tomorrow);
    assert_eq!(booking.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());

    let err = state
        .bookings()
        .create_booking(booking_for(room.id, tomorrow, &slot, "B"))
        .await
        .expect_err("second booking must conflict");

    assert!(
        matches!(err, AppError::BookingConflict { room_id, time_slot_id, .. }
            if room_id == room.id && time_slot_id == slot.id),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_concurrent_bookings_exactly_one_wins() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Race Room").await;
    let slot = first_slot(&state).await;
    let date = today() + Duration::days(2);

    const ATTEMPTS: usize = 8;
    let attempts = (0..ATTEMPTS).map(|i| {
        let guard = state.bookings().clone();
        let request = booking_for(room.id, date, &slot, &format!("Racer {i}"));
        tokio::spawn(async move { guard.create_booking(request).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task should not panic"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::BookingConflict { .. })))
        .count();

    assert_eq!(successes, 1, "exactly one booking should win: {results:?}");
    assert_eq!(conflicts, ATTEMPTS - 1, "all others should conflict: {results:?}");

    let confirmed: Vec<_> = state
        .bookings()
        .list_bookings(BookingFilter {
            date: Some(date),
            room_id: Some(room.id),
        })
        .await
        .unwrap()
        .into_iter()
        .filter(|b| b.status == BookingStatus::Confirmed)
        .collect();
    assert_eq!(confirmed.len(), 1);
}

#[tokio::test]
async fn test_different_slots_do_not_conflict() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Parallel Room").await;
    let catalog = api::services::load_catalog(&state.db).await.unwrap();
    let date = today() + Duration::days(3);

    let attempts = catalog.iter().map(|slot| {
        let guard = state.bookings().clone();
        let request = booking_for(room.id, date, slot, "Parallel");
        async move { guard.create_booking(request).await }
    });
    let results = join_all(attempts).await;

    assert!(results.iter().all(|r| r.is_ok()), "{results:?}");
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let state = setup_test_db().await;
    let slot = first_slot(&state).await;

    let err = state
        .bookings()
        .create_booking(booking_for(i32::MAX, today() - Duration::days(5), &slot, "A"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RoomNotFound(id) if id == i32::MAX));
}

#[tokio::test]
async fn test_soft_deleted_room_is_not_bookable() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Deleted Room").await;
    state.rooms().soft_delete(room.id).await.unwrap();
    let slot = first_slot(&state).await;

    let err = state
        .bookings()
        .create_booking(booking_for(room.id, today() + Duration::days(1), &slot, "A"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RoomNotFound(_)));
}

#[tokio::test]
async fn test_unknown_time_slot_is_not_found() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Slotless Room").await;
    let request = NewBooking::new(
        room.id,
        today() + Duration::days(1),
        i32::MAX,
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        "A",
    )
    .unwrap();

    let err = state.bookings().create_booking(request).await.unwrap_err();
    assert!(matches!(err, AppError::TimeSlotNotFound(_)));
}

#[tokio::test]
async fn test_times_must_match_the_catalog_slot() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Mismatch Room").await;
    let slot = first_slot(&state).await;
    let request = NewBooking::new(
        room.id,
        today() + Duration::days(1),
        slot.id,
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        "A",
    )
    .unwrap();

    let err = state.bookings().create_booking(request).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_date_rules_are_checked_before_the_time_slot() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Order Room").await;
    let slot = first_slot(&state).await;
    let wrong_start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    let wrong_end = NaiveTime::from_hms_opt(11, 0, 0).unwrap();

    let yesterday = NewBooking::new(
        room.id,
        today() - Duration::days(1),
        slot.id,
        wrong_start,
        wrong_end,
        "A",
    )
    .unwrap();
    let err = state.bookings().create_booking(yesterday).await.unwrap_err();
    assert!(matches!(err, AppError::BookingInPast(_)), "{err:?}");

    let too_far = NewBooking::new(
        room.id,
        today() + Duration::days(state.config().max_advance_days + 1),
        i32::MAX,
        wrong_start,
        wrong_end,
        "A",
    )
    .unwrap();
    let err = state.bookings().create_booking(too_far).await.unwrap_err();
    assert!(matches!(err, AppError::BookingDateOutOfRange { .. }), "{err:?}");
}

#[tokio::test]
async fn test_date_window_rules() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Window Room").await;
    let slot = first_slot(&state).await;
    let max = state.config().max_advance_days;

    let yesterday = state
        .bookings()
        .create_booking(booking_for(room.id, today() - Duration::days(1), &slot, "A"))
        .await
        .unwrap_err();
    assert!(matches!(yesterday, AppError::BookingInPast(_)));

    let too_far = state
        .bookings()
        .create_booking(booking_for(room.id, today() + Duration::days(max + 1), &slot, "A"))
        .await
        .unwrap_err();
    assert!(matches!(too_far, AppError::BookingDateOutOfRange { .. }));

    state
        .bookings()
        .create_booking(booking_for(room.id, today() + Duration::days(max), &slot, "A"))
        .await
        .expect("last day of the advance window is bookable");

    state
        .bookings()
        .create_booking(booking_for(room.id, today(), &slot, "A"))
        .await
        .expect("today's 08:00 slot has not started at 02:30 local time");
}

#[tokio::test]
async fn test_started_slot_today_is_in_the_past() {
    let state = setup_test_db().await;
    // 07:30 UTC is 09:30 in Stockholm, after the 08:00 slot started.
    let later = AppState::with_clock(
        state.db.clone(),
        BookingConfig::default(),
        Clock::Fixed(Utc.with_ymd_and_hms(2025, 6, 1, 7, 30, 0).unwrap()),
    );
    let room = create_test_room(&later, "Late Room").await;
    let slot = first_slot(&later).await;

    let err = later
        .bookings()
        .create_booking(booking_for(room.id, today(), &slot, "A"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BookingInPast(_)));

    later
        .bookings()
        .create_booking(booking_for(room.id, today() + Duration::days(1), &slot, "A"))
        .await
        .expect("tomorrow's slot is still bookable");
}

#[tokio::test]
async fn test_cancel_frees_the_slot() {
    let state = setup_test_db().await;
    let room = create_test_room(&state, "Cancel Room").await;
    let slot = first_slot(&state).await;
    let date = today() + Duration::days(4);

    let booking = state
        .bookings()
        .create_booking(booking_for(room.id, date, &slot, "A"))
        .await
        .unwrap();

    let cancelled = state.bookings().cancel_booking(booking.id).await.unwrap();
    assert_eq!(cancelled.id, booking.id);
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    // Cancelling again is a no-op.
    let again = state.bookings().cancel_booking(booking.id).await.unwrap();
    assert_eq!(again.status, BookingStatus::Cancelled);
    assert_eq!(again.updated_at, cancelled.updated_at);

    let rebooked = state
        .bookings()
        .create_booking(booking_for(room.id, date, &slot, "B"))
        .await
        .expect("cancelled slot should be bookable again");
    assert_ne!(rebooked.id, booking.id);
    assert_eq!(rebooked.booker_name, "B");
}

#[tokio::test]
async fn test_cancel_unknown_booking_is_not_found() {
    let state = setup_test_db().await;
    let id = uuid::Uuid::new_v4();

    let err = state.bookings().cancel_booking(id).await.unwrap_err();
    assert!(matches!(err, AppError::BookingNotFound(missing) if missing == id));
}

#[tokio::test]
async fn test_list_bookings_filters_by_date_and_room() {
    let state = setup_test_db().await;
    let room_a = create_test_room(&state, "List Room A").await;
    let room_b = create_test_room(&state, "List Room B").await;
    let slot = first_slot(&state).await;
    let day1 = today() + Duration::days(5);
    let day2 = today() + Duration::days(6);

    for (room_id, date) in [(room_a.id, day1), (room_a.id, day2), (room_b.id, day1)] {
        state
            .bookings()
            .create_booking(booking_for(room_id, date, &slot, "Lister"))
            .await
            .unwrap();
    }

    let room_a_bookings = state
        .bookings()
        .list_bookings(BookingFilter {
            date: None,
            room_id: Some(room_a.id),
        })
        .await
        .unwrap();
    assert_eq!(room_a_bookings.len(), 2);
    assert!(room_a_bookings[0].date < room_a_bookings[1].date);

    let day1_room_b = state
        .bookings()
        .list_bookings(BookingFilter {
            date: Some(day1),
            room_id: Some(room_b.id),
        })
        .await
        .unwrap();
    assert_eq!(day1_room_b.len(), 1);
    assert_eq!(day1_room_b[0].room_name, room_b.name);
}
