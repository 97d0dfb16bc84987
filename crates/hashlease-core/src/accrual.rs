//! Reward accrual calculator.
//!
//! Pure functions over a rental's time window. The accrual is a linear
//! interpolation between the rental's start and expiry instants, so it is
//! safe to recompute on every read (including a once-per-second countdown)
//! without touching any state.

use serde::{Deserialize, Serialize};

/// Reward terms attached to a rentable device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardTerms {
    /// Reward accrued per full day of the rental.
    pub base_daily_reward: f64,
    /// Bonus percentage applied on top of the base reward.
    pub bonus_percent: f64,
    /// Rental term length in days.
    pub duration_days: i64,
}

impl RewardTerms {
    /// Total reward promised over the whole rental window.
    #[allow(clippy::cast_precision_loss)]
    pub fn total_promised(&self) -> f64 {
        self.base_daily_reward * self.duration_days as f64 * (1.0 + self.bonus_percent / 100.0)
    }
}

/// Snapshot of how much of a promised reward has accrued at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accrual {
    /// Fraction of the rental window elapsed, in `[0.0, 1.0]`.
    pub progress: f64,
    /// Reward earned so far, in `[0.0, total_promised]`.
    pub amount: f64,
}

impl Accrual {
    /// Progress as a percentage in `[0.0, 100.0]`.
    pub fn progress_percent(&self) -> f64 {
        self.progress * 100.0
    }

    const fn complete(total_promised: f64) -> Self {
        Self {
            progress: 1.0,
            amount: total_promised,
        }
    }
}

/// Compute the reward accrued at `now` for a rental window.
///
/// A missing `started_at` or `expires_at`, or a window where
/// `expires_at <= started_at`, is treated as already complete: progress is
/// 1.0 and the full promised amount is returned. Otherwise progress is the
/// elapsed fraction of the window clamped to `[0, 1]`; clock skew that puts
/// `now` before `started_at` clamps to zero, never negative.
#[allow(clippy::cast_precision_loss)]
pub fn accrued(
    now: i64,
    started_at: Option<i64>,
    expires_at: Option<i64>,
    total_promised: f64,
) -> Accrual {
    let (Some(start), Some(end)) = (started_at, expires_at) else {
        return Accrual::complete(total_promised);
    };
    if end <= start {
        return Accrual::complete(total_promised);
    }

    let progress = ((now - start) as f64 / (end - start) as f64).clamp(0.0, 1.0);
    Accrual {
        progress,
        amount: progress * total_promised,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    use crate::time::SECS_PER_DAY;

    const T: i64 = 1_700_000_000;

    #[test]
    fn zero_before_start() {
        let a = accrued(T - 50, Some(T), Some(T + 100), 42.0);
        assert_eq!(a.progress, 0.0);
        assert_eq!(a.amount, 0.0);
    }

    #[test]
    fn zero_exactly_at_start() {
        let a = accrued(T, Some(T), Some(T + 100), 42.0);
        assert_eq!(a.amount, 0.0);
    }

    #[test]
    fn full_at_expiry() {
        let a = accrued(T + 100, Some(T), Some(T + 100), 42.0);
        assert_eq!(a.progress, 1.0);
        assert_eq!(a.amount, 42.0);
    }

    #[test]
    fn full_after_expiry() {
        let a = accrued(T + 5000, Some(T), Some(T + 100), 42.0);
        assert_eq!(a.progress, 1.0);
        assert_eq!(a.amount, 42.0);
    }

    #[test]
    fn halfway_through_ten_day_window() {
        // startedAt = T, expiresAt = T+10d, promised 100 -> 50 at T+5d
        let a = accrued(
            T + 5 * SECS_PER_DAY,
            Some(T),
            Some(T + 10 * SECS_PER_DAY),
            100.0,
        );
        assert_eq!(a.amount, 50.0);
        assert_eq!(a.progress_percent(), 50.0);
    }

    #[test]
    fn missing_start_is_complete() {
        let a = accrued(T, None, Some(T + 100), 42.0);
        assert_eq!(a.progress, 1.0);
        assert_eq!(a.amount, 42.0);
    }

    #[test]
    fn missing_expiry_is_complete() {
        let a = accrued(T, Some(T), None, 42.0);
        assert_eq!(a.amount, 42.0);
    }

    #[test]
    fn inverted_window_is_complete() {
        let a = accrued(T, Some(T + 100), Some(T), 42.0);
        assert_eq!(a.progress, 1.0);
        assert_eq!(a.amount, 42.0);
    }

    #[test]
    fn zero_length_window_is_complete() {
        let a = accrued(T, Some(T), Some(T), 42.0);
        assert_eq!(a.amount, 42.0);
    }

    #[test]
    fn strictly_increasing_and_bounded_inside_window() {
        let start = T;
        let end = T + 1000;
        let mut previous = 0.0;
        for now in (start + 1..end).step_by(97) {
            let a = accrued(now, Some(start), Some(end), 100.0);
            assert!(a.amount > previous, "accrual must increase at {now}");
            assert!(a.amount > 0.0 && a.amount < 100.0);
            previous = a.amount;
        }
    }

    #[test]
    fn total_promised_formula() {
        let terms = RewardTerms {
            base_daily_reward: 2.5,
            bonus_percent: 20.0,
            duration_days: 30,
        };
        assert_eq!(terms.total_promised(), 2.5 * 30.0 * 1.2);
    }

    #[test]
    fn total_promised_without_bonus() {
        let terms = RewardTerms {
            base_daily_reward: 1.0,
            bonus_percent: 0.0,
            duration_days: 10,
        };
        assert_eq!(terms.total_promised(), 10.0);
    }
}
