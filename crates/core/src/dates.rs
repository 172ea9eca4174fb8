//! Elapsed-day arithmetic for stage timelines.
//!
//! All dates are UTC instants. A "day" is 86 400 seconds of elapsed time and
//! partial days round up, so a stage started 25 hours ago counts as 2 days.
//! Start dates in the future yield 0.

use chrono::Utc;

use crate::types::Timestamp;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `start` and `end` (defaulting to now), rounded up.
pub fn days_since(start: Timestamp, end: Option<Timestamp>) -> i64 {
    let end = end.unwrap_or_else(Utc::now);
    let elapsed = end.signed_duration_since(start).num_seconds();
    if elapsed <= 0 {
        return 0;
    }
    (elapsed + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Whether a stage that began at `date` has run longer than `threshold` days.
///
/// Completed stages and stages without a start date are never overdue.
pub fn is_overdue(date: Option<Timestamp>, completed: bool, threshold: i64) -> bool {
    if completed {
        return false;
    }
    match date {
        Some(date) => days_since(date, None) > threshold,
        None => false,
    }
}
