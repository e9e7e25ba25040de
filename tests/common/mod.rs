//! Shared fixtures: an in-memory repository behind the engine's traits

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::Mutex;

use slotbook_server::{
    error::{AppError, AppResult},
    models::{
        Booking, BookingStatus, BookingStatusChange, NewBooking, Occupancy, Offer, OfferStatus,
        ReservationResult, Service, StatusTransition, Store, StoreStatus,
    },
    repository::{BookingRepository, OfferRepository, ServiceRepository, StoreRepository},
    services::{
        capacity,
        clock::FixedClock,
        notifications::BookingNotifier,
        Services,
    },
};

pub const STORE_ID: i32 = 1;
pub const SERVICE_ID: i32 = 10;
pub const OFFER_ID: i32 = 5;
pub const CUSTOMER_ID: i32 = 3;

/// Sunday 2026-03-01, 08:00
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

pub const MONDAY: &str = "2026-03-02";

pub fn monday_at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// Open Monday to Friday, 09:00 to 17:00
pub fn store() -> Store {
    Store {
        id: STORE_ID,
        merchant_id: 1,
        name: "Corner salon".to_string(),
        opening_time: Some("09:00".to_string()),
        closing_time: Some("17:00".to_string()),
        working_days: Some(json!("monday, Tuesday,WEDNESDAY,Thursday,Friday")),
        status: StoreStatus::Active,
        created_at: None,
        updated_at: None,
    }
}

/// One hour, no buffer, two at a time
pub fn service() -> Service {
    Service {
        id: SERVICE_ID,
        store_id: STORE_ID,
        branch_id: None,
        name: "Haircut".to_string(),
        duration: 60,
        buffer_time: 0,
        max_concurrent_bookings: 2,
        min_advance_booking: 0,
        max_advance_booking: 60 * 24 * 30,
        booking_enabled: true,
        auto_confirm_bookings: false,
        price: Some(Decimal::new(2500, 2)),
        created_at: None,
        updated_at: None,
    }
}

pub fn offer() -> Offer {
    Offer {
        id: OFFER_ID,
        service_id: SERVICE_ID,
        title: "Early bird".to_string(),
        discount_percentage: Decimal::new(15, 0),
        status: OfferStatus::Active,
        expiration_date: None,
        created_at: None,
    }
}

#[derive(Default)]
struct State {
    stores: HashMap<i32, Store>,
    services: HashMap<i32, Service>,
    offers: HashMap<i32, Offer>,
    bookings: Vec<Booking>,
    log: Vec<BookingStatusChange>,
}

/// Repository kept in memory; `reserve` holds the state lock across the
/// recount and the insert, like the database transaction does.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn seeded() -> Self {
        let mut state = State::default();
        state.stores.insert(STORE_ID, store());
        state.services.insert(SERVICE_ID, service());
        state.offers.insert(OFFER_ID, offer());
        Self {
            state: Mutex::new(state),
        }
    }

    pub async fn put_service(&self, service: Service) {
        self.state.lock().await.services.insert(service.id, service);
    }

    pub async fn put_store(&self, store: Store) {
        self.state.lock().await.stores.insert(store.id, store);
    }

    pub async fn put_offer(&self, offer: Offer) {
        self.state.lock().await.offers.insert(offer.id, offer);
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.clone()
    }

    /// Active bookings of a service covering an instant
    pub async fn active_at(&self, service_id: i32, at: NaiveDateTime) -> usize {
        self.state
            .lock()
            .await
            .bookings
            .iter()
            .filter(|b| b.service_id == service_id && b.status.occupies_capacity())
            .filter(|b| b.start_time <= at && at < b.end_time)
            .count()
    }
}

fn occupancy_of(state: &State, service_id: i32, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Occupancy> {
    let offer_ids: Vec<i32> = state
        .offers
        .values()
        .filter(|o| o.service_id == service_id)
        .map(|o| o.id)
        .collect();

    state
        .bookings
        .iter()
        .filter(|b| {
            b.service_id == service_id || b.offer_id.map_or(false, |id| offer_ids.contains(&id))
        })
        .filter(|b| b.status.occupies_capacity())
        .filter(|b| capacity::overlaps(b.start_time, b.end_time, from, to))
        .map(|b| Occupancy {
            booking_id: b.id,
            start_time: b.start_time,
            end_time: b.end_time,
        })
        .collect()
}

#[async_trait]
impl StoreRepository for MemoryRepository {
    async fn get_store(&self, id: i32) -> AppResult<Store> {
        self.state
            .lock()
            .await
            .stores
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Store {} not found", id)))
    }
}

#[async_trait]
impl ServiceRepository for MemoryRepository {
    async fn get_service(&self, id: i32) -> AppResult<Service> {
        self.state
            .lock()
            .await
            .services
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))
    }
}

#[async_trait]
impl OfferRepository for MemoryRepository {
    async fn get_offer(&self, id: i32) -> AppResult<Offer> {
        self.state
            .lock()
            .await
            .offers
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Offer {} not found", id)))
    }
}

#[async_trait]
impl BookingRepository for MemoryRepository {
    async fn occupancy(
        &self,
        service_id: i32,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<Occupancy>> {
        let state = self.state.lock().await;
        Ok(occupancy_of(&state, service_id, from, to))
    }

    async fn reserve(&self, booking: NewBooking) -> AppResult<ReservationResult> {
        let mut state = self.state.lock().await;
        // Let competing attempts pile up on the lock
        tokio::task::yield_now().await;

        let capacity = state
            .services
            .get(&booking.service_id)
            .map(|s| s.max_concurrent_bookings)
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", booking.service_id)))?;

        let locked = occupancy_of(&state, booking.service_id, booking.start_time, booking.end_time);
        let overlapping = capacity::overlap_count(booking.start_time, booking.end_time, &locked);
        if capacity::remaining(capacity, overlapping) == 0 {
            return Ok(ReservationResult::SlotUnavailable {
                overlapping,
                capacity,
            });
        }

        let id = state.bookings.len() as i32 + 1;
        let actor_id = booking.actor_id;
        let created = booking.into_booking(id);
        let log_id = state.log.len() as i64 + 1;
        state.log.push(BookingStatusChange {
            id: log_id,
            booking_id: id,
            from_status: None,
            to_status: created.status,
            actor_id,
            reason: None,
            changed_at: created.created_at,
        });
        state.bookings.push(created.clone());
        Ok(ReservationResult::Reserved(created))
    }

    async fn get_booking(&self, id: i32) -> AppResult<Booking> {
        self.state
            .lock()
            .await
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    async fn list_customer_bookings(
        &self,
        customer_id: i32,
        active_only: bool,
    ) -> AppResult<Vec<Booking>> {
        Ok(self
            .state
            .lock()
            .await
            .bookings
            .iter()
            .filter(|b| b.customer_id == customer_id)
            .filter(|b| !active_only || b.status.occupies_capacity())
            .cloned()
            .collect())
    }

    async fn transition(&self, transition: StatusTransition) -> AppResult<Booking> {
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == transition.booking_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Booking {} not found", transition.booking_id))
            })?;

        if booking.status != transition.from {
            return Err(AppError::InvalidTransition(format!(
                "booking {} is now {}",
                booking.id, booking.status
            )));
        }

        booking.stamp(transition.to, transition.at);
        if transition.to == BookingStatus::Cancelled {
            booking.cancellation_reason = transition.reason.clone();
        }
        let updated = booking.clone();

        let log_id = state.log.len() as i64 + 1;
        state.log.push(BookingStatusChange {
            id: log_id,
            booking_id: updated.id,
            from_status: Some(transition.from),
            to_status: transition.to,
            actor_id: transition.actor_id,
            reason: transition.reason,
            changed_at: transition.at,
        });
        Ok(updated)
    }

    async fn history(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>> {
        Ok(self
            .state
            .lock()
            .await
            .log
            .iter()
            .filter(|c| c.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

/// Counts the hooks it receives
#[derive(Default)]
pub struct RecordingNotifier {
    pub reserved: AtomicUsize,
    pub status_changes: AtomicUsize,
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn booking_reserved(&self, _booking: Booking) -> AppResult<()> {
        self.reserved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn booking_status_changed(&self, _booking: Booking, _from: BookingStatus) -> AppResult<()> {
        self.status_changes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Every hook fails, as when the mail relay is down
pub struct FailingNotifier;

#[async_trait]
impl BookingNotifier for FailingNotifier {
    async fn booking_reserved(&self, _booking: Booking) -> AppResult<()> {
        Err(AppError::Internal("SMTP relay unreachable".to_string()))
    }

    async fn booking_status_changed(&self, _booking: Booking, _from: BookingStatus) -> AppResult<()> {
        Err(AppError::Internal("SMTP relay unreachable".to_string()))
    }
}

/// Engine wired over a seeded in-memory repository
pub fn engine(notifier: Arc<dyn BookingNotifier>) -> (Services, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::seeded());
    let services = Services::with_parts(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
        notifier,
        Arc::new(FixedClock(now())),
    );
    (services, repo)
}
