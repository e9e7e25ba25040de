//! Bookable service model

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::availability::BookingRules;

/// A bookable offering of a store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Service {
    pub id: i32,
    pub store_id: i32,
    pub branch_id: Option<i32>,
    pub name: String,
    /// Slot length in minutes
    pub duration: i32,
    /// Gap enforced after each slot, in minutes
    pub buffer_time: i32,
    /// Capacity per instant
    pub max_concurrent_bookings: i32,
    /// Minimum lead time between now and slot start, in minutes
    pub min_advance_booking: i32,
    /// Maximum lead time between now and slot start, in minutes
    pub max_advance_booking: i32,
    pub booking_enabled: bool,
    pub auto_confirm_bookings: bool,
    pub price: Option<Decimal>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Service {
    /// Scheduling rules exposed to clients alongside slot listings
    pub fn rules(&self) -> BookingRules {
        BookingRules {
            duration: self.duration,
            buffer_time: self.buffer_time,
            max_concurrent_bookings: self.max_concurrent_bookings,
            min_advance_booking: self.min_advance_booking,
            max_advance_booking: self.max_advance_booking,
            auto_confirm: self.auto_confirm_bookings,
        }
    }
}
