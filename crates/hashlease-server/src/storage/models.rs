//! Database models for the `HashLease` rental store.

use serde::{Deserialize, Serialize};

use hashlease_core::accrual::RewardTerms;

/// User record from the database.
///
/// `total_computing_power` is the aggregate capacity counter: the sum of
/// device capacity contributions across the user's active rentals. It is
/// mutated only by rental creation and the expiry sweep.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub total_computing_power: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Rentable device record from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Hash-power contribution added to the owner's capacity while rented.
    pub capacity: f64,
    pub base_daily_reward: f64,
    pub bonus_percent: f64,
    pub duration_days: i64,
    pub created_at: i64,
}

impl Device {
    /// Reward terms for rentals of this device.
    pub const fn reward_terms(&self) -> RewardTerms {
        RewardTerms {
            base_daily_reward: self.base_daily_reward,
            bonus_percent: self.bonus_percent,
            duration_days: self.duration_days,
        }
    }
}

/// Rental record from the database.
///
/// `expires_at` of `NULL` marks an indefinite rental, which the sweep
/// never touches. A rental leaves the store only by deletion.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rental {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub started_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub active: i64,
    pub created_at: i64,
}

/// Notification record from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub is_read: i64,
    pub created_at: i64,
}
