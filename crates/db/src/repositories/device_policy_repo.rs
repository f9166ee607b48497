//! Repository for the `user_device_policies` table.

use precinct_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::device_policy::DevicePolicy;

/// Provides read and upsert access to per-user device caps.
pub struct DevicePolicyRepo;

impl DevicePolicyRepo {
    /// Effective cap for a user: the stored value, or `default_max` if none.
    ///
    /// Takes any executor so admission can read it inside its transaction.
    pub async fn max_devices_for(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        default_max: i32,
    ) -> Result<i32, sqlx::Error> {
        let stored: Option<i32> =
            sqlx::query_scalar("SELECT max_devices FROM user_device_policies WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(executor)
                .await?;
        Ok(stored.unwrap_or(default_max))
    }

    /// Set a user's cap. Last writer wins.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        max_devices: i32,
    ) -> Result<DevicePolicy, sqlx::Error> {
        sqlx::query_as::<_, DevicePolicy>(
            "INSERT INTO user_device_policies (user_id, max_devices)
             VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET max_devices = EXCLUDED.max_devices
             RETURNING user_id, max_devices, updated_at",
        )
        .bind(user_id)
        .bind(max_devices)
        .fetch_one(pool)
        .await
    }

    /// List every stored policy.
    pub async fn list(pool: &PgPool) -> Result<Vec<DevicePolicy>, sqlx::Error> {
        sqlx::query_as::<_, DevicePolicy>(
            "SELECT user_id, max_devices, updated_at FROM user_device_policies",
        )
        .fetch_all(pool)
        .await
    }
}
