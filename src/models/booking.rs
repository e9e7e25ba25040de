//! Booking model, status state machine and related types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{availability::EntityType, text_column};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// BookingStatus
// ---------------------------------------------------------------------------

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

/// Status-changing actions a booking accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    Confirm,
    CheckIn,
    Complete,
    Cancel,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
        }
    }

    /// Status a new booking starts in
    pub fn initial(auto_confirm: bool) -> Self {
        if auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }

    /// Whether the booking holds capacity on its service
    pub fn occupies_capacity(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled | BookingStatus::NoShow)
    }

    /// Statuses that release capacity, as stored in the database
    pub const RELEASED: [&'static str; 2] = ["cancelled", "no_show"];

    /// Apply an action, returning the next status
    pub fn apply(self, action: BookingAction) -> Result<BookingStatus, AppError> {
        use BookingAction as A;
        use BookingStatus as S;

        let next = match (self, action) {
            (S::Pending, A::Confirm) => S::Confirmed,
            (S::Confirmed, A::CheckIn) => S::InProgress,
            (S::InProgress, A::Complete) => S::Completed,
            (S::Pending | S::Confirmed | S::InProgress, A::Cancel) => S::Cancelled,
            (S::Confirmed, A::NoShow) => S::NoShow,
            (from, action) => {
                let detail = if from.is_terminal() {
                    format!("booking is already {}", from)
                } else {
                    format!("cannot {} a {} booking", action, from)
                };
                return Err(AppError::InvalidTransition(detail));
            }
        };
        Ok(next)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

text_column!(BookingStatus);

impl BookingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirm",
            BookingAction::CheckIn => "check in",
            BookingAction::Complete => "complete",
            BookingAction::Cancel => "cancel",
            BookingAction::NoShow => "mark as no-show",
        }
    }
}

impl std::fmt::Display for BookingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// Reservation record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    /// Public reference (used in QR payloads)
    pub reference: Uuid,
    pub service_id: i32,
    pub offer_id: Option<i32>,
    pub customer_id: i32,
    pub staff_id: Option<i32>,
    pub store_id: i32,
    pub branch_id: Option<i32>,
    /// Local wall-clock slot start
    pub start_time: NaiveDateTime,
    /// Always `start_time + service.duration`
    pub end_time: NaiveDateTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub qr_payload: Option<String>,
    pub cancellation_reason: Option<String>,
    pub confirmed_at: Option<NaiveDateTime>,
    pub checked_in_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub no_show_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    /// Record the timestamp column matching `status`
    pub fn stamp(&mut self, status: BookingStatus, at: NaiveDateTime) {
        match status {
            BookingStatus::Confirmed => self.confirmed_at = Some(at),
            BookingStatus::InProgress => self.checked_in_at = Some(at),
            BookingStatus::Completed => self.completed_at = Some(at),
            BookingStatus::Cancelled => self.cancelled_at = Some(at),
            BookingStatus::NoShow => self.no_show_at = Some(at),
            BookingStatus::Pending => {}
        }
        self.status = status;
        self.updated_at = at;
    }
}

/// Row to insert inside the reservation transaction
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub reference: Uuid,
    pub service_id: i32,
    pub offer_id: Option<i32>,
    pub customer_id: i32,
    pub staff_id: Option<i32>,
    pub store_id: i32,
    pub branch_id: Option<i32>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
    /// User performing the reservation
    pub actor_id: i32,
    pub created_at: NaiveDateTime,
}

impl NewBooking {
    /// The row as it reads back after insertion
    pub fn into_booking(self, id: i32) -> Booking {
        let confirmed_at = (self.status == BookingStatus::Confirmed).then_some(self.created_at);
        Booking {
            id,
            reference: self.reference,
            service_id: self.service_id,
            offer_id: self.offer_id,
            customer_id: self.customer_id,
            staff_id: self.staff_id,
            store_id: self.store_id,
            branch_id: self.branch_id,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
            notes: self.notes,
            qr_payload: None,
            cancellation_reason: None,
            confirmed_at,
            checked_in_at: None,
            completed_at: None,
            cancelled_at: None,
            no_show_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Outcome of the locked reservation transaction
#[derive(Debug, Clone)]
pub enum ReservationResult {
    Reserved(Booking),
    /// Capacity exhausted at the locked recheck; nothing was written
    SlotUnavailable { overlapping: usize, capacity: i32 },
}

/// A validated status change to persist
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub booking_id: i32,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub actor_id: i32,
    pub reason: Option<String>,
    pub at: NaiveDateTime,
}

/// Active booking interval drawing from a service's capacity
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Occupancy {
    pub booking_id: i32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// Audit entry for a status transition
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookingStatusChange {
    pub id: i64,
    pub booking_id: i32,
    pub from_status: Option<BookingStatus>,
    pub to_status: BookingStatus,
    pub actor_id: i32,
    pub reason: Option<String>,
    pub changed_at: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Create booking request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBooking {
    #[validate(range(min = 1, message = "entity_id must be positive"))]
    pub entity_id: i32,
    pub entity_type: EntityType,
    /// Slot start in local time (YYYY-MM-DDTHH:MM)
    #[validate(length(min = 1, message = "start_time is required"))]
    pub start_time: String,
    /// Defaults to the authenticated user
    #[validate(range(min = 1, message = "customer_id must be positive"))]
    pub customer_id: Option<i32>,
    pub staff_id: Option<i32>,
    /// When given, must be the store owning the service
    pub store_id: Option<i32>,
    #[validate(length(max = 2000, message = "Notes are limited to 2000 characters"))]
    pub notes: Option<String>,
}

/// Body of a status transition request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct TransitionRequest {
    #[validate(length(max = 500, message = "Reason is limited to 500 characters"))]
    pub reason: Option<String>,
}

/// Query parameters for customer booking lists
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    /// Only bookings that still hold capacity
    pub active_only: Option<bool>,
}
