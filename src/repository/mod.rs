//! Repository layer for database operations
//!
//! The engine depends on the four accessor traits below rather than on the
//! Postgres implementations, which are wired together in [`Repository`].

pub mod bookings;
pub mod catalog;
pub mod stores;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        Booking, BookingStatusChange, NewBooking, Occupancy, Offer, ReservationResult, Service,
        StatusTransition, Store,
    },
};

/// Store lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn get_store(&self, id: i32) -> AppResult<Store>;
}

/// Service lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn get_service(&self, id: i32) -> AppResult<Service>;
}

/// Offer lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfferRepository: Send + Sync {
    async fn get_offer(&self, id: i32) -> AppResult<Offer>;
}

/// Booking reads and writes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Active bookings of a service, booked directly or through any of its
    /// offers, whose interval overlaps `[from, to)`. Takes no locks.
    async fn occupancy(
        &self,
        service_id: i32,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<Occupancy>>;

    /// Authoritative check-then-insert.
    ///
    /// Locks the overlapping active bookings of the service, recounts them
    /// against the service's current capacity and inserts the booking only
    /// when capacity remains, all inside one transaction.
    async fn reserve(&self, booking: NewBooking) -> AppResult<ReservationResult>;

    async fn get_booking(&self, id: i32) -> AppResult<Booking>;

    async fn list_customer_bookings(
        &self,
        customer_id: i32,
        active_only: bool,
    ) -> AppResult<Vec<Booking>>;

    /// Persist a status change if the booking is still in `transition.from`
    async fn transition(&self, transition: StatusTransition) -> AppResult<Booking>;

    async fn history(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>>;
}

/// Main repository struct holding database connection pools
#[derive(Clone)]
pub struct Repository {
    /// Primary (writes, reservation transactions)
    pub pool: Pool<Postgres>,
    /// Replica for availability reads; the primary when no replica is configured
    pub read_pool: Pool<Postgres>,
    pub stores: stores::StoresRepository,
    pub catalog: catalog::CatalogRepository,
    pub bookings: bookings::BookingsRepository,
}

impl Repository {
    /// Create a new repository with the given pools
    pub fn new(pool: Pool<Postgres>, read_pool: Option<Pool<Postgres>>, lock_timeout_ms: u64) -> Self {
        let read_pool = read_pool.unwrap_or_else(|| pool.clone());
        Self {
            stores: stores::StoresRepository::new(read_pool.clone()),
            catalog: catalog::CatalogRepository::new(read_pool.clone()),
            bookings: bookings::BookingsRepository::new(
                pool.clone(),
                read_pool.clone(),
                lock_timeout_ms,
            ),
            pool,
            read_pool,
        }
    }
}
