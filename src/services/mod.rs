//! Business logic services

pub mod availability;
pub mod calendar;
pub mod capacity;
pub mod clock;
pub mod email;
pub mod notifications;
pub mod reservations;
pub mod slot_grid;

use std::sync::Arc;

use crate::{
    config::NotificationsConfig,
    repository::{
        BookingRepository, OfferRepository, Repository, ServiceRepository, StoreRepository,
    },
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub availability: availability::AvailabilityService,
    pub reservations: reservations::ReservationService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, notifications: &NotificationsConfig) -> Self {
        let bookings: Arc<dyn BookingRepository> = Arc::new(repository.bookings.clone());
        let notifier = Arc::new(notifications::EmailNotifier::new(
            repository.bookings.clone(),
            notifications,
        ));
        Self::with_parts(
            Arc::new(repository.stores),
            Arc::new(repository.catalog.clone()),
            Arc::new(repository.catalog),
            bookings,
            notifier,
            Arc::new(clock::SystemClock),
        )
    }

    /// Wire services over arbitrary repository implementations
    pub fn with_parts(
        stores: Arc<dyn StoreRepository>,
        services: Arc<dyn ServiceRepository>,
        offers: Arc<dyn OfferRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn notifications::BookingNotifier>,
        clock: Arc<dyn clock::Clock>,
    ) -> Self {
        let availability = availability::AvailabilityService::new(
            stores,
            services,
            offers,
            capacity::CapacityLedger::new(bookings.clone()),
            clock.clone(),
        );
        let reservations =
            reservations::ReservationService::new(availability.clone(), bookings, notifier, clock);
        Self {
            availability,
            reservations,
        }
    }
}
