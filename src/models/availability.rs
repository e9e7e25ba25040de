//! Availability query types (slot listings, slot checks)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Kind of bookable entity a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Service,
    Offer,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Service => "service",
            EntityType::Offer => "offer",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query parameters for slot listings
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SlotQuery {
    pub entity_id: i32,
    pub entity_type: EntityType,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
}

/// Query parameters for a single slot check
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SlotCheckQuery {
    pub entity_id: i32,
    pub entity_type: EntityType,
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Slot start, "HH:MM" or "h:mm AM"
    pub time: String,
}

/// Scheduling rules of the resolved service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookingRules {
    pub duration: i32,
    pub buffer_time: i32,
    pub max_concurrent_bookings: i32,
    pub min_advance_booking: i32,
    pub max_advance_booking: i32,
    pub auto_confirm: bool,
}

/// One candidate slot with its remaining capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetailedSlot {
    /// Display start time (12-hour clock)
    pub start: String,
    /// Display end time (12-hour clock)
    pub end: String,
    /// 24-hour start time to submit when booking
    pub value: String,
    pub available: i32,
    pub total: i32,
}

/// Why a query could not produce a bookable answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableKind {
    NotFound,
    InvalidInput,
    BookingDisabled,
    OfferUnavailable,
    StoreClosed,
    PastDate,
    OutsideBookingWindow,
    NotOnGrid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Unavailability {
    pub kind: UnavailableKind,
    pub reason: String,
}

impl Unavailability {
    pub fn new(kind: UnavailableKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Open slots for an entity on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SlotListing {
    pub date: NaiveDate,
    pub available_slots: Vec<String>,
    pub detailed_slots: Vec<DetailedSlot>,
    pub booking_rules: BookingRules,
}

/// Outcome of a slot listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotsResult {
    Listed(SlotListing),
    Unavailable(Unavailability),
}

/// Outcome of a single slot check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotCheckResult {
    Available { remaining: i32, total: i32 },
    Full { total: i32 },
    Unavailable(Unavailability),
}

impl SlotCheckResult {
    pub fn is_available(&self) -> bool {
        matches!(self, SlotCheckResult::Available { .. })
    }
}

/// Wire shape of a slot listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotsResponse {
    pub success: bool,
    pub date: Option<NaiveDate>,
    pub available_slots: Vec<String>,
    pub detailed_slots: Vec<DetailedSlot>,
    pub booking_rules: Option<BookingRules>,
    pub reason: Option<String>,
    pub kind: Option<UnavailableKind>,
}

impl From<SlotsResult> for SlotsResponse {
    fn from(result: SlotsResult) -> Self {
        match result {
            SlotsResult::Listed(listing) => Self {
                success: true,
                date: Some(listing.date),
                available_slots: listing.available_slots,
                detailed_slots: listing.detailed_slots,
                booking_rules: Some(listing.booking_rules),
                reason: None,
                kind: None,
            },
            SlotsResult::Unavailable(u) => Self {
                success: false,
                date: None,
                available_slots: Vec::new(),
                detailed_slots: Vec::new(),
                booking_rules: None,
                reason: Some(u.reason),
                kind: Some(u.kind),
            },
        }
    }
}

/// Wire shape of a slot check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotCheckResponse {
    pub available: bool,
    pub remaining_slots: Option<i32>,
    pub reason: Option<String>,
    pub kind: Option<UnavailableKind>,
}

impl From<SlotCheckResult> for SlotCheckResponse {
    fn from(result: SlotCheckResult) -> Self {
        let available = result.is_available();
        match result {
            SlotCheckResult::Available { remaining, .. } => Self {
                available,
                remaining_slots: Some(remaining),
                reason: None,
                kind: None,
            },
            SlotCheckResult::Full { .. } => Self {
                available,
                remaining_slots: Some(0),
                reason: Some("This time slot is fully booked".to_string()),
                kind: None,
            },
            SlotCheckResult::Unavailable(u) => Self {
                available,
                remaining_slots: None,
                reason: Some(u.reason),
                kind: Some(u.kind),
            },
        }
    }
}
