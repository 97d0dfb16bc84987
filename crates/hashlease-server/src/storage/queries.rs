//! Database queries for the `HashLease` rental store.

use hashlease_core::db::unix_timestamp;

use super::db::{DatabaseError, RentalDatabase};
use super::models::{Device, Rental, User};

impl RentalDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user with zero computing power.
    pub async fn create_user(&self, id: &str, username: &str) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            r"
            INSERT INTO users (id, username, total_computing_power, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?)
            ",
        )
        .bind(id)
        .bind(username)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Subtract `delta` from a user's computing power, clamping at zero.
    ///
    /// The subtraction and the floor are a single SQL statement, so a stale
    /// or already-inconsistent counter can never go negative and concurrent
    /// rental creation cannot lose an update.
    pub async fn deduct_user_power_clamped(
        &self,
        user_id: &str,
        delta: f64,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "UPDATE users SET total_computing_power = MAX(0, total_computing_power - ?), updated_at = ? WHERE id = ?",
        )
        .bind(delta)
        .bind(now)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    // =========================================================================
    // Device queries
    // =========================================================================

    /// Create a device in the catalog.
    pub async fn create_device(
        &self,
        id: &str,
        name: &str,
        capacity: f64,
        base_daily_reward: f64,
        bonus_percent: f64,
        duration_days: i64,
    ) -> Result<Device, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            r"
            INSERT INTO devices (id, name, capacity, base_daily_reward, bonus_percent, duration_days, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id)
        .bind(name)
        .bind(capacity)
        .bind(base_daily_reward)
        .bind(bonus_percent)
        .bind(duration_days)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_device(id).await
    }

    /// Get a device by ID.
    pub async fn get_device(&self, id: &str) -> Result<Device, DatabaseError> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Device {id}")))
    }

    // =========================================================================
    // Rental queries
    // =========================================================================

    /// Create a rental and add the device's capacity to the owner's
    /// computing power in one transaction.
    pub async fn create_rental(
        &self,
        id: &str,
        user_id: &str,
        device_id: &str,
        started_at: Option<i64>,
        expires_at: Option<i64>,
    ) -> Result<Rental, DatabaseError> {
        let now = unix_timestamp();

        let mut tx = self.pool().begin().await?;

        let capacity: f64 = sqlx::query_scalar("SELECT capacity FROM devices WHERE id = ?")
            .bind(device_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Device {device_id}")))?;

        sqlx::query(
            r"
            INSERT INTO rentals (id, user_id, device_id, started_at, expires_at, active, created_at)
            VALUES (?, ?, ?, ?, ?, 1, ?)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(device_id)
        .bind(started_at)
        .bind(expires_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET total_computing_power = total_computing_power + ?, updated_at = ? WHERE id = ?",
        )
        .bind(capacity)
        .bind(now)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_rental(id).await
    }

    /// Get a rental by ID.
    pub async fn get_rental(&self, id: &str) -> Result<Rental, DatabaseError> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Rental {id}")))
    }

    /// List a user's rentals, newest first.
    pub async fn list_rentals_for_user(&self, user_id: &str) -> Result<Vec<Rental>, DatabaseError> {
        let rentals = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rentals)
    }

    /// List active rentals whose expiry falls inside `[start, end]`.
    ///
    /// Indefinite rentals (`expires_at IS NULL`) are excluded.
    pub async fn list_rentals_expiring_between(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<Rental>, DatabaseError> {
        let rentals = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE active = 1 AND expires_at IS NOT NULL AND expires_at BETWEEN ? AND ?",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;

        Ok(rentals)
    }

    /// List active rentals whose expiry is strictly before `now`.
    pub async fn list_expired_rentals(&self, now: i64) -> Result<Vec<Rental>, DatabaseError> {
        let rentals = sqlx::query_as::<_, Rental>(
            "SELECT * FROM rentals WHERE active = 1 AND expires_at IS NOT NULL AND expires_at < ?",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        Ok(rentals)
    }

    /// Delete a rental by ID.
    ///
    /// Returns `true` if a row was deleted, `false` if it was already gone.
    pub async fn delete_rental(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM rentals WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
