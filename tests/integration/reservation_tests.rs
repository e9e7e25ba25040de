//! Reservation transaction tests on Postgres

use std::time::Duration;

use slotbook_server::{
    config::NotificationsConfig,
    error::AppError,
    models::{
        booking::CreateBooking, BookingAction, BookingStatus, EntityType, NewBooking,
        ReservationResult,
    },
    repository::{BookingRepository, Repository},
    services::Services,
};
use uuid::Uuid;

use crate::db::{booking_day, pool, seed, Seeded};

fn new_booking(seeded: &Seeded, hour: u32, offer: bool) -> NewBooking {
    let start = booking_day().and_hms_opt(hour, 0, 0).unwrap();
    NewBooking {
        reference: Uuid::new_v4(),
        service_id: seeded.service_id,
        offer_id: offer.then_some(seeded.offer_id),
        customer_id: seeded.customer_id,
        staff_id: None,
        store_id: seeded.store_id,
        branch_id: None,
        start_time: start,
        end_time: start + chrono::Duration::minutes(60),
        status: BookingStatus::Pending,
        notes: None,
        actor_id: seeded.customer_id,
        created_at: chrono::Local::now().naive_local(),
    }
}

#[tokio::test]
#[ignore]
async fn test_concurrent_reservations_capped_by_capacity() {
    let pool = pool().await;
    let seeded = seed(&pool, 2).await;
    let repository = Repository::new(pool.clone(), None, 2_000);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let bookings = repository.bookings.clone();
            let booking = new_booking(&seeded, 10, i % 2 == 0);
            tokio::spawn(async move { bookings.reserve(booking).await })
        })
        .collect();

    let mut reserved = 0;
    for handle in handles {
        match handle.await.unwrap().expect("reservation failed") {
            ReservationResult::Reserved(_) => reserved += 1,
            ReservationResult::SlotUnavailable { capacity, .. } => assert_eq!(capacity, 2),
        }
    }
    assert_eq!(reserved, 2);

    let day = booking_day().and_hms_opt(0, 0, 0).unwrap();
    let occupancy = repository
        .bookings
        .occupancy(seeded.service_id, day, day + chrono::Duration::days(1))
        .await
        .unwrap();
    assert_eq!(occupancy.len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_non_overlapping_slots_reserve_independently() {
    let pool = pool().await;
    let seeded = seed(&pool, 1).await;
    let repository = Repository::new(pool.clone(), None, 2_000);

    let handles: Vec<_> = [9, 10, 11, 12]
        .into_iter()
        .map(|hour| {
            let bookings = repository.bookings.clone();
            let booking = new_booking(&seeded, hour, false);
            tokio::spawn(async move { bookings.reserve(booking).await })
        })
        .collect();

    for handle in handles {
        assert!(matches!(
            handle.await.unwrap().unwrap(),
            ReservationResult::Reserved(_)
        ));
    }
}

#[tokio::test]
#[ignore]
async fn test_engine_round_trip() {
    let pool = pool().await;
    let seeded = seed(&pool, 1).await;
    let repository = Repository::new(pool.clone(), None, 2_000);
    let services = Services::new(repository.clone(), &NotificationsConfig::default());

    let request = CreateBooking {
        entity_id: seeded.offer_id,
        entity_type: EntityType::Offer,
        start_time: format!("{}T14:00", booking_day()),
        customer_id: Some(seeded.customer_id),
        staff_id: None,
        store_id: Some(seeded.store_id),
        notes: Some("Window seat".to_string()),
    };

    let booking = services
        .reservations
        .reserve(request.clone(), seeded.customer_id)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.offer_id, Some(seeded.offer_id));

    let second = services
        .reservations
        .reserve(request, seeded.customer_id)
        .await;
    assert!(matches!(second, Err(AppError::SlotUnavailable(_))));

    // QR payload is written after commit
    tokio::time::sleep(Duration::from_millis(200)).await;
    let stored = repository.bookings.get_booking(booking.id).await.unwrap();
    assert!(stored.qr_payload.is_some());

    let cancelled = services
        .reservations
        .transition(booking.id, BookingAction::Cancel, 1, Some("Plans changed".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Plans changed"));
    assert!(cancelled.cancelled_at.is_some());

    let again = services
        .reservations
        .transition(booking.id, BookingAction::Cancel, 1, None)
        .await;
    assert!(matches!(again, Err(AppError::InvalidTransition(_))));

    let history = services.reservations.history(booking.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].to_status, BookingStatus::Cancelled);
}
