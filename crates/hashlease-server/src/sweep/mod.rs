//! Rental expiry sweep job.
//!
//! One sweep pass does two scans over the rental store: rentals whose
//! expiry falls inside the warning-day bucket get a one-time "expiring
//! soon" notification, and rentals already past expiry are removed with
//! their capacity contribution reclaimed. Every action is safe to repeat,
//! so overlapping or re-run invocations converge on the same final state:
//! the rental delete is delete-if-exists, warnings are deduplicated by a
//! trailing 24-hour window, and the capacity deduction clamps at zero.

mod pool;

pub use pool::{PoolError, PoolPermit, WorkerPool};

use std::future::Future;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use hashlease_core::accrual::accrued;
use hashlease_core::time::{day_bucket, SECS_PER_DAY};

use crate::storage::{DatabaseError, Rental, RentalDatabase};

/// Default number of days ahead of expiry at which a warning is sent.
pub const DEFAULT_WARNING_LEAD_DAYS: i64 = 7;

/// Result summary of one sweep pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub success: bool,
    /// Number of "expiring soon" warnings inserted.
    pub expiring_notified: u64,
    /// Number of expired rentals removed.
    pub expired_removed: u64,
    /// Unix seconds the sweep ran at, rendered as a string in JSON.
    #[serde(serialize_with = "timestamp_as_string")]
    pub timestamp: i64,
}

fn timestamp_as_string<S: serde::Serializer>(ts: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(ts)
}

/// Errors that abort a whole sweep pass.
///
/// Per-rental failures are not represented here; they are logged and the
/// affected rental stays eligible for the next pass.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Store query failed: {0}")]
    Store(#[from] DatabaseError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// The expiry sweep orchestrator.
///
/// Per-rental units fan out over a bounded [`WorkerPool`]; units touch
/// disjoint rows and carry no ordering requirement between each other.
pub struct SweepJob {
    db: RentalDatabase,
    pool: WorkerPool,
    warning_lead_days: i64,
}

impl SweepJob {
    /// Create a sweep job over the given store.
    ///
    /// `warning_lead_days` of zero falls back to the default lead of
    /// [`DEFAULT_WARNING_LEAD_DAYS`]; `max_concurrency` of zero falls back
    /// to the pool default.
    pub fn new(db: RentalDatabase, warning_lead_days: i64, max_concurrency: usize) -> Self {
        let lead = if warning_lead_days == 0 {
            DEFAULT_WARNING_LEAD_DAYS
        } else {
            warning_lead_days
        };

        Self {
            db,
            pool: WorkerPool::new(max_concurrency),
            warning_lead_days: lead,
        }
    }

    /// Run one sweep pass at the given instant.
    ///
    /// A failure listing rentals aborts the pass with nothing mutated;
    /// per-rental failures are logged and skipped.
    pub async fn run(&self, now: i64) -> Result<SweepSummary, SweepError> {
        let expiring_notified = self.notify_expiring(now).await?;
        let expired_removed = self.remove_expired(now).await?;

        info!(now, expiring_notified, expired_removed, "Sweep pass complete");

        Ok(SweepSummary {
            success: true,
            expiring_notified,
            expired_removed,
            timestamp: now,
        })
    }

    /// Warn about rentals expiring inside the lead-day bucket.
    ///
    /// The window is the single UTC calendar day exactly `warning_lead_days`
    /// ahead of `now`, not a rolling cutoff.
    async fn notify_expiring(&self, now: i64) -> Result<u64, SweepError> {
        let (start, end) = day_bucket(now + self.warning_lead_days * SECS_PER_DAY);
        let rentals = self.db.list_rentals_expiring_between(start, end).await?;

        self.fan_out(rentals, now, |db, rental, now| async move {
            warn_expiring(&db, &rental, now).await
        })
        .await
    }

    /// Remove rentals already past expiry.
    async fn remove_expired(&self, now: i64) -> Result<u64, SweepError> {
        let rentals = self.db.list_expired_rentals(now).await?;

        self.fan_out(rentals, now, |db, rental, now| async move {
            remove_expired_rental(&db, &rental, now).await
        })
        .await
    }

    /// Run one unit per rental across the worker pool and count the units
    /// that reported an effect. Unit errors are logged and skipped.
    async fn fan_out<F, Fut>(&self, rentals: Vec<Rental>, now: i64, unit: F) -> Result<u64, SweepError>
    where
        F: Fn(RentalDatabase, Rental, i64) -> Fut,
        Fut: Future<Output = Result<bool, DatabaseError>> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(rentals.len());
        for rental in rentals {
            let permit = self.pool.acquire().await?;
            let rental_id = rental.id.clone();
            let fut = unit(self.db.clone(), rental, now);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                match fut.await {
                    Ok(effect) => effect,
                    Err(e) => {
                        warn!(rental_id = %rental_id, error = %e, "Skipping rental this pass");
                        false
                    }
                }
            }));
        }

        let mut count = 0u64;
        for handle in handles {
            match handle.await {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Sweep unit task failed"),
            }
        }

        Ok(count)
    }
}

/// Title of the warning notification; doubles as the dedup key per
/// (user, device-name) pair.
fn expiring_title(device_name: &str) -> String {
    format!("Rental expiring soon: {device_name}")
}

/// Title of the removal notification.
fn ended_title(device_name: &str) -> String {
    format!("Rental ended: {device_name}")
}

/// One warning unit: dedup-check the sink, insert the warning if absent.
///
/// Returns `true` if a notification was inserted. The check and the insert
/// are not transactional; the 24-hour dedup window stays much wider than
/// the sweep cadence to bound the duplicate risk of overlapping passes.
async fn warn_expiring(
    db: &RentalDatabase,
    rental: &Rental,
    now: i64,
) -> Result<bool, DatabaseError> {
    let device = db.get_device(&rental.device_id).await?;
    let title = expiring_title(&device.name);

    if db
        .has_recent_notification(&rental.user_id, &title, now - SECS_PER_DAY)
        .await?
    {
        return Ok(false);
    }

    let days_left = rental
        .expires_at
        .map_or(0, |expires| (expires - now).max(0) / SECS_PER_DAY);
    let body = format!(
        "Your {} rental ends in {days_left} days. Accrued rewards are credited automatically when it completes.",
        device.name
    );
    db.insert_notification(&Uuid::new_v4().to_string(), &rental.user_id, &title, &body)
        .await?;

    Ok(true)
}

/// One removal unit: reclaim capacity, delete the rental, notify.
///
/// Order matters: the capacity deduction completes before the delete, and
/// the delete precedes the notification. The delete is the authoritative
/// done signal -- a row that is already gone means another pass finished
/// this rental, and the unit stops uncounted. A notification failure after
/// a confirmed delete is logged and never retried; the rental row no
/// longer exists to re-drive it.
async fn remove_expired_rental(
    db: &RentalDatabase,
    rental: &Rental,
    now: i64,
) -> Result<bool, DatabaseError> {
    let device = db.get_device(&rental.device_id).await?;

    db.deduct_user_power_clamped(&rental.user_id, device.capacity)
        .await?;

    if !db.delete_rental(&rental.id).await? {
        return Ok(false);
    }

    let reward = accrued(
        now,
        rental.started_at,
        rental.expires_at,
        device.reward_terms().total_promised(),
    );
    let title = ended_title(&device.name);
    let body = format!(
        "Your {} rental has ended. {:.2} credited in rewards over the rental term.",
        device.name, reward.amount
    );
    if let Err(e) = db
        .insert_notification(&Uuid::new_v4().to_string(), &rental.user_id, &title, &body)
        .await
    {
        warn!(rental_id = %rental.id, error = %e, "Removal notification failed");
    }

    Ok(true)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    use hashlease_core::db::unix_timestamp;

    async fn test_db() -> RentalDatabase {
        RentalDatabase::open_in_memory().await.unwrap()
    }

    /// User `u1` plus a device of capacity 5.0 promising 1.0/day over 10
    /// days (total 10.0, no bonus).
    async fn seed(db: &RentalDatabase) {
        db.create_user("u1", "alice").await.unwrap();
        db.create_device("d1", "Antminer S19", 5.0, 1.0, 0.0, 10)
            .await
            .unwrap();
    }

    fn job(db: &RentalDatabase) -> SweepJob {
        SweepJob::new(db.clone(), DEFAULT_WARNING_LEAD_DAYS, 2)
    }

    /// An instant safely inside the calendar day `lead` days ahead of `now`.
    fn inside_lead_bucket(now: i64, lead: i64) -> i64 {
        day_bucket(now + lead * SECS_PER_DAY).0 + 3600
    }

    #[tokio::test]
    async fn warning_sent_once_for_bucket_expiry() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        let expires = inside_lead_bucket(now, DEFAULT_WARNING_LEAD_DAYS);
        db.create_rental("r1", "u1", "d1", Some(now), Some(expires))
            .await
            .unwrap();

        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expiring_notified, 1);
        assert_eq!(summary.expired_removed, 0);

        let notifications = db.list_notifications_for_user("u1").await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Rental expiring soon: Antminer S19");

        // Second pass within the dedup window inserts nothing.
        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expiring_notified, 0);
        assert_eq!(db.list_notifications_for_user("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_warning_outside_bucket() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        // Six days ahead is always a different calendar day than seven.
        db.create_rental("r1", "u1", "d1", Some(now), Some(now + 6 * SECS_PER_DAY))
            .await
            .unwrap();
        db.create_rental("r2", "u1", "d1", Some(now), Some(now + 30 * SECS_PER_DAY))
            .await
            .unwrap();

        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expiring_notified, 0);
        assert!(db.list_notifications_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_rental_removed_capacity_reclaimed() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        db.create_rental(
            "r1",
            "u1",
            "d1",
            Some(now - 10 * SECS_PER_DAY),
            Some(now - 1),
        )
        .await
        .unwrap();
        assert_eq!(db.get_user("u1").await.unwrap().total_computing_power, 5.0);

        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expired_removed, 1);

        assert_eq!(db.get_user("u1").await.unwrap().total_computing_power, 0.0);
        assert!(db.get_rental("r1").await.is_err());

        let notifications = db.list_notifications_for_user("u1").await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Rental ended: Antminer S19");
        // Full promised reward: 1.0/day over 10 days.
        assert!(notifications[0].body.contains("10.00"));
    }

    #[tokio::test]
    async fn stale_capacity_clamps_at_zero() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        db.create_rental("r1", "u1", "d1", Some(now - 100), Some(now - 1))
            .await
            .unwrap();
        // Force the counter inconsistent, as a previous partial failure would.
        db.deduct_user_power_clamped("u1", 5.0).await.unwrap();
        assert_eq!(db.get_user("u1").await.unwrap().total_computing_power, 0.0);

        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expired_removed, 1);
        assert_eq!(db.get_user("u1").await.unwrap().total_computing_power, 0.0);
    }

    #[tokio::test]
    async fn sweep_is_idempotent_across_immediate_reruns() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        db.create_rental(
            "warn",
            "u1",
            "d1",
            Some(now),
            Some(inside_lead_bucket(now, DEFAULT_WARNING_LEAD_DAYS)),
        )
        .await
        .unwrap();
        db.create_rental("gone", "u1", "d1", Some(now - 100), Some(now - 1))
            .await
            .unwrap();

        let first = job(&db).run(now).await.unwrap();
        assert_eq!(first.expiring_notified, 1);
        assert_eq!(first.expired_removed, 1);

        let second = job(&db).run(now).await.unwrap();
        assert_eq!(second.expiring_notified, 0);
        assert_eq!(second.expired_removed, 0);
    }

    #[tokio::test]
    async fn indefinite_rentals_are_never_swept() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        db.create_rental("forever", "u1", "d1", Some(now - 365 * SECS_PER_DAY), None)
            .await
            .unwrap();

        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expiring_notified, 0);
        assert_eq!(summary.expired_removed, 0);
        assert!(db.get_rental("forever").await.is_ok());
    }

    #[tokio::test]
    async fn unstarted_expired_rental_credits_full_reward() {
        let db = test_db().await;
        seed(&db).await;
        let now = unix_timestamp();

        // Never started but past expiry: the invalid window counts as
        // complete, so the full promised reward is credited.
        db.create_rental("r1", "u1", "d1", None, Some(now - 1))
            .await
            .unwrap();

        let summary = job(&db).run(now).await.unwrap();
        assert_eq!(summary.expired_removed, 1);

        let notifications = db.list_notifications_for_user("u1").await.unwrap();
        assert!(notifications[0].body.contains("10.00"));
    }

    #[tokio::test]
    async fn listing_failure_aborts_whole_sweep() {
        let db = test_db().await;
        seed(&db).await;
        let sweep = job(&db);

        db.pool().close().await;

        let err = sweep.run(unix_timestamp()).await.unwrap_err();
        assert!(matches!(err, SweepError::Store(_)));
    }

    #[test]
    fn summary_serializes_camel_case_with_string_timestamp() {
        let summary = SweepSummary {
            success: true,
            expiring_notified: 2,
            expired_removed: 1,
            timestamp: 1_700_000_000,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["expiringNotified"], 2);
        assert_eq!(json["expiredRemoved"], 1);
        assert_eq!(json["timestamp"], "1700000000");
    }
}
