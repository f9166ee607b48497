//! Repository for the `blocked_attempts` table.

use precinct_core::types::DbId;
use sqlx::PgPool;

use crate::models::blocked_attempt::BlockedAttempt;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, user_id, fingerprint, geo_location, ip_address, \
                                  user_agent, reason, created_at";

/// Provides access to the pending blocked-attempt log.
pub struct BlockedAttemptRepo;

impl BlockedAttemptRepo {
    /// Find an attempt by internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BlockedAttempt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blocked_attempts WHERE id = $1");
        sqlx::query_as::<_, BlockedAttempt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List pending attempts, newest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<BlockedAttempt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blocked_attempts ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, BlockedAttempt>(&query)
            .fetch_all(pool)
            .await
    }

    /// Number of pending attempts.
    pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM blocked_attempts")
            .fetch_one(pool)
            .await
    }
}
