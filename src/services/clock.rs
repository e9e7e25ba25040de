//! Wall-clock source for the single operational time zone

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Supplies "now" as local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar day
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Server local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
