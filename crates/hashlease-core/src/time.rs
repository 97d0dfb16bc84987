//! Unix-time helpers for expiry window queries.
//!
//! The sweep's "expiring soon" window is one UTC calendar day, computed
//! with plain integer arithmetic on Unix seconds. All stored instants are
//! Unix seconds, so no calendar library is involved.

/// Seconds in one UTC day.
pub const SECS_PER_DAY: i64 = 86_400;

/// The UTC calendar-day bucket containing `ts`.
///
/// Returns `(start, end)` where `start` is 00:00:00 and `end` is 23:59:59
/// of that day, both inclusive.
pub const fn day_bucket(ts: i64) -> (i64, i64) {
    let start = ts.div_euclid(SECS_PER_DAY) * SECS_PER_DAY;
    (start, start + SECS_PER_DAY - 1)
}
