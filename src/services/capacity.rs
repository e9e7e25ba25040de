//! Capacity ledger: per-slot remaining capacity of a service

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::slot_grid::Slot;
use crate::{error::AppResult, models::Occupancy, repository::BookingRepository};

/// Half-open interval overlap: touching endpoints do not conflict
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Number of occupancy entries overlapping `[start, end)`
pub fn overlap_count(start: NaiveDateTime, end: NaiveDateTime, occupancy: &[Occupancy]) -> usize {
    occupancy
        .iter()
        .filter(|o| overlaps(o.start_time, o.end_time, start, end))
        .count()
}

/// `max(0, capacity - overlapping)`
pub fn remaining(capacity: i32, overlapping: usize) -> i32 {
    let used = i32::try_from(overlapping).unwrap_or(i32::MAX);
    capacity.saturating_sub(used).max(0)
}

/// Capacity figures of one grid slot on a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCapacity {
    pub slot: Slot,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: i32,
    pub total: i32,
}

#[derive(Clone)]
pub struct CapacityLedger {
    bookings: Arc<dyn BookingRepository>,
}

impl CapacityLedger {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    /// Active bookings of a service (direct or through any of its offers) touching `date`
    pub async fn occupancy(&self, service_id: i32, date: NaiveDate) -> AppResult<Vec<Occupancy>> {
        let from = date.and_time(NaiveTime::default());
        let to = from + Duration::days(1);
        self.bookings.occupancy(service_id, from, to).await
    }

    /// Remaining capacity of every slot
    pub fn evaluate(
        date: NaiveDate,
        slots: &[Slot],
        occupancy: &[Occupancy],
        capacity: i32,
    ) -> Vec<SlotCapacity> {
        slots
            .iter()
            .map(|slot| {
                let (start, end) = slot.on(date);
                SlotCapacity {
                    slot: *slot,
                    start,
                    end,
                    available: remaining(capacity, overlap_count(start, end, occupancy)),
                    total: capacity,
                }
            })
            .collect()
    }
}
