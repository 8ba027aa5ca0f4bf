//! # Clock and Tick Units
//!
//! Time and date strings for the face, and the [`TimeUnits`] bit set the tick
//! handler receives to tell it which calendar fields rolled over since the last tick.

use bitflags::bitflags;
use chrono::{Datelike, NaiveDateTime, Timelike};

bitflags! {
    /// Calendar units that changed between two ticks.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TimeUnits: u8 {
        const SECOND = 1 << 0;
        const MINUTE = 1 << 1;
        const HOUR = 1 << 2;
        const DAY = 1 << 3;
        const MONTH = 1 << 4;
        const YEAR = 1 << 5;
    }
}

impl TimeUnits {
    /// Units the face subscribes to.
    pub const FACE_SUBSCRIPTION: TimeUnits = TimeUnits::MINUTE
        .union(TimeUnits::HOUR)
        .union(TimeUnits::DAY);

    /// Units whose value differs between `prev` and `now`.
    ///
    /// A rollover of a larger unit implies the smaller ones down to MINUTE
    /// rolled over too, even when the field value happens to match (e.g. the
    /// 10:00 of one day against 10:00 of the next).
    pub fn between(prev: NaiveDateTime, now: NaiveDateTime) -> TimeUnits {
        let mut units = TimeUnits::empty();

        if now.year() != prev.year() {
            units |= TimeUnits::YEAR;
        }
        if !units.is_empty() || now.month() != prev.month() {
            units |= TimeUnits::MONTH;
        }
        if !units.is_empty() || now.date() != prev.date() {
            units |= TimeUnits::DAY;
        }
        if !units.is_empty() || now.hour() != prev.hour() {
            units |= TimeUnits::HOUR;
        }
        if !units.is_empty() || now.minute() != prev.minute() {
            units |= TimeUnits::MINUTE;
        }
        if !units.is_empty() || now.second() != prev.second() {
            units |= TimeUnits::SECOND;
        }

        units
    }
}

/// Hours and minutes, e.g. "07:45" or "19:45".
pub fn format_time(time: &NaiveDateTime, use_24h: bool) -> String {
    let fmt = if use_24h { "%H:%M" } else { "%I:%M" };
    time.format(fmt).to_string()
}

/// Abbreviated weekday, month and day of month, e.g. "Sat Oct 17".
pub fn format_date(time: &NaiveDateTime) -> String {
    time.format("%a %b %d").to_string()
}
