//! Calendar helpers for overlaying years and enumerating target months.
//!
//! Alignment policy: a date is placed at the ordinal its month/day would have
//! in a leap year. Feb 29 is always position 60 and Mar 1 is always 61, so the
//! same month/day lines up across leap and non-leap years.

use chrono::{Datelike, NaiveDate};

/// Leap year used as the reference calendar for alignment.
const REFERENCE_LEAP_YEAR: i32 = 2000;

/// Number of aligned positions in a year (1..=366).
pub const ALIGNED_DAYS: u16 = 366;

const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Position of `date` on the shared annual axis (1..=366).
pub fn aligned_position(date: NaiveDate) -> u16 {
    // Every valid (month, day) exists in a leap year.
    NaiveDate::from_ymd_opt(REFERENCE_LEAP_YEAR, date.month(), date.day())
        .map(|d| d.ordinal() as u16)
        .unwrap_or_else(|| date.ordinal() as u16)
}

/// Aligned position of the first day of `month` (1-based).
pub fn month_start_position(month: u32) -> u16 {
    NaiveDate::from_ymd_opt(REFERENCE_LEAP_YEAR, month, 1)
        .map(|d| d.ordinal() as u16)
        .unwrap_or(1)
}

/// "Mon DD" label of an aligned position, e.g. `60` is "Feb 29".
pub fn position_label(position: u16) -> Option<String> {
    NaiveDate::from_yo_opt(REFERENCE_LEAP_YEAR, u32::from(position)).map(|d| d.format("%b %d").to_string())
}

/// Calendar quarter (1..=4).
pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// ISO-8601 week number (1..=53).
///
/// Early-January days can belong to week 52/53 of the previous ISO year; they
/// stay grouped with the calendar year they were observed in.
pub fn iso_week(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

pub fn month_abbr(month: u32) -> &'static str {
    MONTH_ABBR
        .get((month as usize).wrapping_sub(1))
        .copied()
        .unwrap_or("?")
}

/// Every date of the given month, in order.
///
/// Returns an empty vector for an invalid year/month.
pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month && d.year() == year)
        .collect()
}
