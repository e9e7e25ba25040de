//! Reservation service: booking creation and lifecycle transitions

use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;
use validator::Validate;

use super::{
    availability::AvailabilityService,
    clock::Clock,
    notifications::BookingNotifier,
    slot_grid::SlotGrid,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{Unavailability, UnavailableKind},
        booking::CreateBooking,
        Booking, BookingAction, BookingStatus, BookingStatusChange, NewBooking, ReservationResult,
        SlotCheckResult, StatusTransition,
    },
    repository::BookingRepository,
};

const START_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a local slot start such as `2026-03-02T10:00`
pub fn parse_start(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();
    START_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Map an availability failure onto the error taxonomy
fn rejection(unavailable: Unavailability) -> AppError {
    match unavailable.kind {
        UnavailableKind::NotFound => AppError::NotFound(unavailable.reason),
        UnavailableKind::InvalidInput => AppError::Validation(unavailable.reason),
        _ => AppError::BusinessRule(unavailable.reason),
    }
}

#[derive(Clone)]
pub struct ReservationService {
    availability: AvailabilityService,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn BookingNotifier>,
    clock: Arc<dyn Clock>,
}

impl ReservationService {
    pub fn new(
        availability: AvailabilityService,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn BookingNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability,
            bookings,
            notifier,
            clock,
        }
    }

    /// Reserve a slot.
    ///
    /// Validation and the capacity pre-check run without locks; the
    /// repository then repeats the capacity check under lock and inserts in
    /// the same transaction. Notifications are spawned after commit.
    pub async fn reserve(&self, request: CreateBooking, actor_id: i32) -> AppResult<Booking> {
        request.validate()?;

        let start = parse_start(&request.start_time).ok_or_else(|| {
            AppError::Validation("Invalid start_time, expected YYYY-MM-DDTHH:MM".to_string())
        })?;
        let customer_id = request.customer_id.unwrap_or(actor_id);

        let plan = self
            .availability
            .plan_day(request.entity_id, request.entity_type, start.date())
            .await?
            .map_err(rejection)?;

        if let Some(store_id) = request.store_id {
            if store_id != plan.store.id {
                return Err(AppError::Validation(format!(
                    "Service {} does not belong to store {}",
                    plan.service.id, store_id
                )));
            }
        }

        let slot = SlotGrid::find(&plan.slots, start.time()).ok_or_else(|| {
            AppError::BusinessRule(
                "The requested time is not a bookable slot for this service".to_string(),
            )
        })?;

        // Advisory only; the locked recheck below decides
        match self.availability.slot_capacity(&plan, slot).await? {
            SlotCheckResult::Available { .. } => {}
            SlotCheckResult::Full { .. } => {
                return Err(AppError::SlotUnavailable(
                    "This time slot is fully booked".to_string(),
                ))
            }
            SlotCheckResult::Unavailable(u) => return Err(rejection(u)),
        }

        let (start_time, end_time) = slot.on(plan.date);
        let now = self.clock.now();
        let new_booking = NewBooking {
            reference: Uuid::new_v4(),
            service_id: plan.service.id,
            offer_id: plan.offer.as_ref().map(|o| o.id),
            customer_id,
            staff_id: request.staff_id,
            store_id: plan.store.id,
            branch_id: plan.service.branch_id,
            start_time,
            end_time,
            status: BookingStatus::initial(plan.service.auto_confirm_bookings),
            notes: request.notes,
            actor_id,
            created_at: now,
        };

        let booking = match self.bookings.reserve(new_booking).await? {
            ReservationResult::Reserved(booking) => booking,
            ReservationResult::SlotUnavailable {
                overlapping,
                capacity,
            } => {
                tracing::info!(
                    "Slot {} of service {} filled before commit ({}/{})",
                    start_time,
                    plan.service.id,
                    overlapping,
                    capacity
                );
                return Err(AppError::SlotUnavailable(
                    "This time slot is no longer available".to_string(),
                ));
            }
        };

        tracing::info!(
            "Booking {} ({}) reserved: service {} at {} for customer {}, {}",
            booking.id,
            booking.reference,
            booking.service_id,
            booking.start_time,
            booking.customer_id,
            booking.status
        );

        let notifier = self.notifier.clone();
        let committed = booking.clone();
        tokio::spawn(async move {
            let id = committed.id;
            if let Err(e) = notifier.booking_reserved(committed).await {
                tracing::warn!("Post-commit notification failed for booking {}: {}", id, e);
            }
        });

        Ok(booking)
    }

    /// Apply a lifecycle action to a booking
    pub async fn transition(
        &self,
        booking_id: i32,
        action: BookingAction,
        actor_id: i32,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        let current = self.bookings.get_booking(booking_id).await?;
        let to = current.status.apply(action)?;

        let updated = self
            .bookings
            .transition(StatusTransition {
                booking_id,
                from: current.status,
                to,
                actor_id,
                reason,
                at: self.clock.now(),
            })
            .await?;

        tracing::info!(
            "Booking {} {} -> {} by user {}",
            booking_id,
            current.status,
            updated.status,
            actor_id
        );

        let notifier = self.notifier.clone();
        let changed = updated.clone();
        let from = current.status;
        tokio::spawn(async move {
            let id = changed.id;
            if let Err(e) = notifier.booking_status_changed(changed, from).await {
                tracing::warn!("Status notification failed for booking {}: {}", id, e);
            }
        });

        Ok(updated)
    }

    pub async fn get_booking(&self, booking_id: i32) -> AppResult<Booking> {
        self.bookings.get_booking(booking_id).await
    }

    /// Status log of a booking, oldest first
    pub async fn history(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>> {
        self.bookings.get_booking(booking_id).await?;
        self.bookings.history(booking_id).await
    }

    pub async fn list_customer_bookings(
        &self,
        customer_id: i32,
        active_only: bool,
    ) -> AppResult<Vec<Booking>> {
        self.bookings
            .list_customer_bookings(customer_id, active_only)
            .await
    }
}
