//! Slot grid generation

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::calendar::OperatingWindow;
use crate::models::BookingRules;

/// Accepted time-of-day encodings for store hours and slot requests
const TIME_FORMATS: [&str; 5] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p", "%I:%M:%S %p"];

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A candidate booking window within a day. `end` is wall-clock time, so a
/// slot ending at midnight has `end` 00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub minutes: i32,
}

impl Slot {
    /// Anchor the slot on a calendar date
    pub fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.start);
        (start, booking_end(start, self.minutes))
    }
}

/// Parse a wall-clock time, truncated to the minute
pub fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    let trimmed = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
}

/// 12-hour display form, e.g. "9:30 AM"
pub fn display_time(t: NaiveTime) -> String {
    t.format("%-I:%M %p").to_string()
}

/// 24-hour form used in requests, e.g. "09:30"
pub fn value_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

fn minutes_of_day(t: NaiveTime) -> i64 {
    i64::from(t.num_seconds_from_midnight() / 60)
}

fn time_from_minutes(minutes: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(minutes * 60).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
}

pub struct SlotGrid;

impl SlotGrid {
    /// Candidate slots for one day, in start order.
    ///
    /// Starts at `opens` and advances by `duration + buffer_time`; a slot is
    /// kept while its end does not pass `closes`. A closing time of 00:00 means
    /// midnight. Unparseable hours, or hours closing before they open, yield an
    /// empty grid.
    pub fn generate(rules: &BookingRules, window: &OperatingWindow) -> Vec<Slot> {
        let (opens, closes) = match (
            parse_time_of_day(&window.opens),
            parse_time_of_day(&window.closes),
        ) {
            (Some(o), Some(c)) => (minutes_of_day(o), minutes_of_day(c)),
            _ => {
                tracing::warn!(
                    "Unparseable operating window {:?}-{:?}",
                    window.opens,
                    window.closes
                );
                return Vec::new();
            }
        };
        let closes = if closes == 0 { MINUTES_PER_DAY } else { closes };
        if closes <= opens {
            tracing::warn!(
                "Operating window {}-{} closes before it opens",
                window.opens,
                window.closes
            );
            return Vec::new();
        }

        let duration = i64::from(rules.duration);
        if duration <= 0 {
            return Vec::new();
        }
        let step = duration + i64::from(rules.buffer_time.max(0));

        let mut slots = Vec::new();
        let mut start = opens;
        while start + duration <= closes {
            let end = (start + duration) % MINUTES_PER_DAY;
            match (time_from_minutes(start), time_from_minutes(end)) {
                (Some(s), Some(e)) => slots.push(Slot {
                    start: s,
                    end: e,
                    minutes: rules.duration,
                }),
                _ => break,
            }
            start += step;
        }
        slots
    }

    /// The grid slot beginning exactly at `start`
    pub fn find(slots: &[Slot], start: NaiveTime) -> Option<Slot> {
        slots.iter().copied().find(|slot| slot.start == start)
    }
}

/// End of a booking starting at `start` for a service of `duration` minutes
pub fn booking_end(start: NaiveDateTime, duration: i32) -> NaiveDateTime {
    start + Duration::minutes(i64::from(duration))
}
