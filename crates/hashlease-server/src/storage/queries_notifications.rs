//! Notification sink queries.
//!
//! The sink is a plain append-only log with a windowed existence check.
//! The check backs the sweep's dedup discipline: the check and the insert
//! are not one transaction, so the dedup window must stay much wider than
//! the sweep cadence to bound the duplicate risk.

use hashlease_core::db::unix_timestamp;

use super::db::{DatabaseError, RentalDatabase};
use super::models::Notification;

impl RentalDatabase {
    // =========================================================================
    // Notification queries
    // =========================================================================

    /// Insert a notification for a user.
    pub async fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        title: &str,
        body: &str,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            r"
            INSERT INTO notifications (id, user_id, title, body, is_read, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Whether the user already has a notification with this title created
    /// at or after `since`.
    pub async fn has_recent_notification(
        &self,
        user_id: &str,
        title: &str,
        since: i64,
    ) -> Result<bool, DatabaseError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND title = ? AND created_at >= ?",
        )
        .bind(user_id)
        .bind(title)
        .bind(since)
        .fetch_one(self.pool())
        .await?;

        Ok(count > 0)
    }

    /// List a user's notifications, newest first.
    pub async fn list_notifications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Notification>, DatabaseError> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(notifications)
    }

    /// Mark a notification as read.
    ///
    /// Returns `true` if a row was updated, `false` if the ID was unknown.
    pub async fn mark_notification_read(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
