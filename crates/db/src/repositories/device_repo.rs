//! Repository for the `devices` table.

use precinct_core::types::DbId;
use sqlx::PgPool;

use crate::models::device::Device;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, user_id, fingerprint, label, is_active, is_primary, \
                                  first_seen_at, last_seen_at, login_count, notes, \
                                  created_at, updated_at";

/// Provides CRUD operations for registered devices.
pub struct DeviceRepo;

impl DeviceRepo {
    /// List a user's devices, primary first, then most recently seen.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices WHERE user_id = $1
             ORDER BY is_primary DESC, last_seen_at DESC"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// List every device, grouped by user in the same order as [`Self::list_for_user`].
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Device>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM devices
             ORDER BY user_id, is_primary DESC, last_seen_at DESC"
        );
        sqlx::query_as::<_, Device>(&query).fetch_all(pool).await
    }

    /// Delete a single device. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every device a user registered. Returns the count removed.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
