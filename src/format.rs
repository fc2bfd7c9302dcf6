//! Number and time formatting used to render display strings
//!
//! Rounding happens here and nowhere earlier, so derived values keep full precision
//! until they are turned into text.

use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Suffix ladder for magnitude abbreviation
pub const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Render `n` with a K/M/B/T suffix and `precision` decimals
///
/// The suffix index is `floor(log10(|n|) / 3)` clamped to the ladder. Zero (and any
/// non-finite input) stays unscaled.
pub fn abbreviate(n: f64, precision: usize) -> String {
    let index = if n == 0.0 || !n.is_finite() {
        0
    } else {
        let raw = (n.abs().log10() / 3.0).floor();
        (raw.max(0.0) as usize).min(SUFFIXES.len() - 1)
    };

    let scaled = n / 10f64.powi(3 * index as i32);
    format!("{scaled:.precision$}{}", SUFFIXES[index])
}

/// Fixed-precision rendering
pub fn roundf(n: f64, precision: usize) -> String {
    format!("{n:.precision$}")
}

/// Division that yields 0 instead of infinity or NaN for a zero denominator
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Fractional days from `now` until `then`; negative when `then` is in the past
pub fn days_until(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (then - now).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Describe an epoch window relative to `now`
pub fn epoch_phrase(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let start_days = days_until(start, now);
    let end_days = days_until(end, now);

    if start_days > 0.0 {
        format!("starts in {} days", roundf(start_days, 1))
    } else if end_days > 0.0 {
        format!("ends in {} days", roundf(end_days, 1))
    } else {
        format!("ended {} days ago", roundf(end_days.abs(), 1))
    }
}
