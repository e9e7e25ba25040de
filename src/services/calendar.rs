//! Operating calendar
//!
//! Normalizes a store's configured working days and hours into a weekly
//! schedule and answers whether a given date is open. Working days arrive in
//! whatever shape the store record holds them (JSON array, JSON-encoded
//! string, comma-separated string, any casing); nothing past this module sees
//! those encodings.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{availability::UnavailableKind, Store, StoreStatus};

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "monday"),
    (Weekday::Tue, "tuesday"),
    (Weekday::Wed, "wednesday"),
    (Weekday::Thu, "thursday"),
    (Weekday::Fri, "friday"),
    (Weekday::Sat, "saturday"),
    (Weekday::Sun, "sunday"),
];

/// Nesting limit when a JSON string wraps another JSON string
const MAX_DECODE_DEPTH: usize = 3;

/// Canonical set of open weekdays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdaySet([bool; 7]);

impl WeekdaySet {
    /// Build the set from a raw `working_days` value, dropping unknown names
    pub fn from_working_days(raw: Option<&Value>) -> Self {
        let mut set = WeekdaySet::default();
        let names = match raw {
            Some(value) => day_names(value, 0),
            None => Vec::new(),
        };
        for name in names {
            match weekday_from_name(&name) {
                Some(day) => set.insert(day),
                None => tracing::debug!("Ignoring unknown working day {:?}", name),
            }
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0[day.num_days_from_monday() as usize] = true;
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|open| *open)
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAYS
            .iter()
            .map(|(day, _)| *day)
            .filter(|day| self.contains(*day))
    }
}

fn day_names(value: &Value, depth: usize) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| clean_token(s).to_string())
            .collect(),
        Value::String(s) => names_from_text(s, depth),
        _ => Vec::new(),
    }
}

fn names_from_text(text: &str, depth: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if depth < MAX_DECODE_DEPTH && (trimmed.starts_with('[') || trimmed.starts_with('"')) {
        if let Ok(decoded) = serde_json::from_str::<Value>(trimmed) {
            return day_names(&decoded, depth + 1);
        }
    }
    trimmed
        .split(',')
        .map(clean_token)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_token(token: &str) -> &str {
    token
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '[' || c == ']')
        .trim()
}

/// Case-insensitive exact match on full English weekday names
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    let lowered = name.trim().to_lowercase();
    WEEKDAYS
        .iter()
        .find(|(_, label)| *label == lowered)
        .map(|(day, _)| *day)
}

pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Opening window of a day, as configured (unparsed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OperatingWindow {
    pub opens: String,
    pub closes: String,
}

/// Why a store does not take bookings on a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    PastDate,
    StoreInactive,
    NoWorkingDays,
    HoursNotConfigured,
    ClosedOnWeekday(Weekday),
}

impl ClosedReason {
    pub fn kind(&self) -> UnavailableKind {
        match self {
            ClosedReason::PastDate => UnavailableKind::PastDate,
            _ => UnavailableKind::StoreClosed,
        }
    }
}

impl std::fmt::Display for ClosedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClosedReason::PastDate => write!(f, "Cannot book past dates"),
            ClosedReason::StoreInactive => write!(f, "This store is not accepting bookings"),
            ClosedReason::NoWorkingDays => {
                write!(f, "This store has not configured its working days")
            }
            ClosedReason::HoursNotConfigured => {
                write!(f, "This store has not configured its opening hours")
            }
            ClosedReason::ClosedOnWeekday(day) => {
                write!(f, "The store is closed on {}", weekday_label(*day))
            }
        }
    }
}

/// Answer to "is the store open on this date?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayStatus {
    Open(OperatingWindow),
    Closed(ClosedReason),
}

/// Weekly schedule of one store
#[derive(Debug, Clone)]
pub struct OperatingCalendar {
    active: bool,
    days: WeekdaySet,
    window: Option<OperatingWindow>,
}

impl OperatingCalendar {
    pub fn for_store(store: &Store) -> Self {
        let window = match (&store.opening_time, &store.closing_time) {
            (Some(opens), Some(closes)) => Some(OperatingWindow {
                opens: opens.clone(),
                closes: closes.clone(),
            }),
            _ => None,
        };

        Self {
            active: store.status == StoreStatus::Active,
            days: WeekdaySet::from_working_days(store.working_days.as_ref()),
            window,
        }
    }

    /// Whether `date` takes bookings, judged against the local calendar day `today`
    pub fn is_open(&self, date: NaiveDate, today: NaiveDate) -> DayStatus {
        if date < today {
            return DayStatus::Closed(ClosedReason::PastDate);
        }
        if !self.active {
            return DayStatus::Closed(ClosedReason::StoreInactive);
        }
        if self.days.is_empty() {
            return DayStatus::Closed(ClosedReason::NoWorkingDays);
        }
        let weekday = date.weekday();
        if !self.days.contains(weekday) {
            return DayStatus::Closed(ClosedReason::ClosedOnWeekday(weekday));
        }
        match &self.window {
            Some(window) => DayStatus::Open(window.clone()),
            None => DayStatus::Closed(ClosedReason::HoursNotConfigured),
        }
    }
}
