//! Availability service: slot listings and advisory slot checks
//!
//! Both operations are read-only and take no locks. `check_slot` is a fast
//! pre-check only; the reservation transaction re-verifies capacity.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use super::{
    calendar::{DayStatus, OperatingCalendar},
    capacity::{self, CapacityLedger},
    clock::Clock,
    slot_grid::{self, Slot, SlotGrid},
};
use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{SlotListing, Unavailability, UnavailableKind},
        BookingRules, DetailedSlot, EntityType, Offer, Service, SlotCheckResult, SlotsResult,
        Store,
    },
    repository::{OfferRepository, ServiceRepository, StoreRepository},
};

/// Everything needed to book an entity on one date
#[derive(Debug, Clone)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub service: Service,
    pub offer: Option<Offer>,
    pub store: Store,
    pub slots: Vec<Slot>,
}

/// Parse a `YYYY-MM-DD` calendar date
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

/// Reason a slot start falls outside the service's advance-booking window
pub fn advance_window_violation(
    rules: &BookingRules,
    start: NaiveDateTime,
    now: NaiveDateTime,
) -> Option<String> {
    let lead = start - now;
    if lead < Duration::zero() {
        return Some("This time slot has already started".to_string());
    }
    if lead < Duration::minutes(i64::from(rules.min_advance_booking)) {
        return Some(format!(
            "Bookings must be made at least {} minutes in advance",
            rules.min_advance_booking
        ));
    }
    if lead > Duration::minutes(i64::from(rules.max_advance_booking)) {
        return Some(format!(
            "Bookings cannot be made more than {} minutes in advance",
            rules.max_advance_booking
        ));
    }
    None
}

/// `Ok(None)` for a missing record, other errors untouched
fn found<T>(result: AppResult<T>) -> AppResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Clone)]
pub struct AvailabilityService {
    stores: Arc<dyn StoreRepository>,
    services: Arc<dyn ServiceRepository>,
    offers: Arc<dyn OfferRepository>,
    ledger: CapacityLedger,
    clock: Arc<dyn Clock>,
}

impl AvailabilityService {
    pub fn new(
        stores: Arc<dyn StoreRepository>,
        services: Arc<dyn ServiceRepository>,
        offers: Arc<dyn OfferRepository>,
        ledger: CapacityLedger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            services,
            offers,
            ledger,
            clock,
        }
    }

    /// Resolve an entity to its service, validate it and lay out the day's grid
    pub async fn plan_day(
        &self,
        entity_id: i32,
        entity_type: EntityType,
        date: NaiveDate,
    ) -> AppResult<Result<DayPlan, Unavailability>> {
        let now = self.clock.now();

        let (service, offer) = match entity_type {
            EntityType::Service => match found(self.services.get_service(entity_id).await)? {
                Some(service) => (service, None),
                None => {
                    return Ok(Err(Unavailability::new(
                        UnavailableKind::NotFound,
                        "Service not found",
                    )))
                }
            },
            EntityType::Offer => {
                let offer = match found(self.offers.get_offer(entity_id).await)? {
                    Some(offer) => offer,
                    None => {
                        return Ok(Err(Unavailability::new(
                            UnavailableKind::NotFound,
                            "Offer not found",
                        )))
                    }
                };
                if !offer.is_bookable(now) {
                    return Ok(Err(Unavailability::new(
                        UnavailableKind::OfferUnavailable,
                        "This offer is no longer available",
                    )));
                }
                match found(self.services.get_service(offer.service_id).await)? {
                    Some(service) => (service, Some(offer)),
                    None => {
                        return Ok(Err(Unavailability::new(
                            UnavailableKind::NotFound,
                            "Service for this offer not found",
                        )))
                    }
                }
            }
        };

        if !service.booking_enabled {
            return Ok(Err(Unavailability::new(
                UnavailableKind::BookingDisabled,
                "Online booking is not enabled for this service",
            )));
        }

        let store = match found(self.stores.get_store(service.store_id).await)? {
            Some(store) => store,
            None => {
                return Ok(Err(Unavailability::new(
                    UnavailableKind::NotFound,
                    "Store not found",
                )))
            }
        };

        let window = match OperatingCalendar::for_store(&store).is_open(date, self.clock.today()) {
            DayStatus::Open(window) => window,
            DayStatus::Closed(reason) => {
                return Ok(Err(Unavailability::new(reason.kind(), reason.to_string())))
            }
        };

        let slots = SlotGrid::generate(&service.rules(), &window);
        tracing::debug!(
            "Service {} on {}: {} grid slots between {} and {}",
            service.id,
            date,
            slots.len(),
            window.opens,
            window.closes
        );

        Ok(Ok(DayPlan {
            date,
            service,
            offer,
            store,
            slots,
        }))
    }

    /// Open slots of an entity on a date
    pub async fn list_slots(
        &self,
        entity_id: i32,
        entity_type: EntityType,
        date: &str,
    ) -> AppResult<SlotsResult> {
        let date = match parse_date(date) {
            Some(d) => d,
            None => {
                return Ok(SlotsResult::Unavailable(Unavailability::new(
                    UnavailableKind::InvalidInput,
                    "Invalid date format, expected YYYY-MM-DD",
                )))
            }
        };

        let plan = match self.plan_day(entity_id, entity_type, date).await? {
            Ok(plan) => plan,
            Err(unavailable) => return Ok(SlotsResult::Unavailable(unavailable)),
        };

        let rules = plan.service.rules();
        let occupancy = self.ledger.occupancy(plan.service.id, date).await?;
        let now = self.clock.now();

        let detailed_slots: Vec<DetailedSlot> = CapacityLedger::evaluate(
            date,
            &plan.slots,
            &occupancy,
            plan.service.max_concurrent_bookings,
        )
        .into_iter()
        .filter(|c| c.available > 0)
        .filter(|c| advance_window_violation(&rules, c.start, now).is_none())
        .map(|c| DetailedSlot {
            start: slot_grid::display_time(c.slot.start),
            end: slot_grid::display_time(c.slot.end),
            value: slot_grid::value_time(c.slot.start),
            available: c.available,
            total: c.total,
        })
        .collect();

        Ok(SlotsResult::Listed(SlotListing {
            date,
            available_slots: detailed_slots.iter().map(|s| s.start.clone()).collect(),
            detailed_slots,
            booking_rules: rules,
        }))
    }

    /// Whether one slot can currently be booked (advisory)
    pub async fn check_slot(
        &self,
        entity_id: i32,
        entity_type: EntityType,
        date: &str,
        time: &str,
    ) -> AppResult<SlotCheckResult> {
        let (date, time) = match (parse_date(date), slot_grid::parse_time_of_day(time)) {
            (Some(d), Some(t)) => (d, t),
            (None, _) => {
                return Ok(SlotCheckResult::Unavailable(Unavailability::new(
                    UnavailableKind::InvalidInput,
                    "Invalid date format, expected YYYY-MM-DD",
                )))
            }
            (_, None) => {
                return Ok(SlotCheckResult::Unavailable(Unavailability::new(
                    UnavailableKind::InvalidInput,
                    "Invalid time format, expected HH:MM",
                )))
            }
        };

        let plan = match self.plan_day(entity_id, entity_type, date).await? {
            Ok(plan) => plan,
            Err(unavailable) => return Ok(SlotCheckResult::Unavailable(unavailable)),
        };

        let slot = match SlotGrid::find(&plan.slots, time) {
            Some(slot) => slot,
            None => {
                return Ok(SlotCheckResult::Unavailable(Unavailability::new(
                    UnavailableKind::NotOnGrid,
                    "The requested time is not a bookable slot for this service",
                )))
            }
        };

        self.slot_capacity(&plan, slot).await
    }

    /// Remaining capacity of a grid slot in a plan, including the advance window check
    pub async fn slot_capacity(&self, plan: &DayPlan, slot: Slot) -> AppResult<SlotCheckResult> {
        let (start, end) = slot.on(plan.date);
        let rules = plan.service.rules();

        if let Some(reason) = advance_window_violation(&rules, start, self.clock.now()) {
            return Ok(SlotCheckResult::Unavailable(Unavailability::new(
                UnavailableKind::OutsideBookingWindow,
                reason,
            )));
        }

        let occupancy = self.ledger.occupancy(plan.service.id, plan.date).await?;
        let total = plan.service.max_concurrent_bookings;
        let remaining = capacity::remaining(total, capacity::overlap_count(start, end, &occupancy));

        Ok(if remaining > 0 {
            SlotCheckResult::Available { remaining, total }
        } else {
            SlotCheckResult::Full { total }
        })
    }
}
