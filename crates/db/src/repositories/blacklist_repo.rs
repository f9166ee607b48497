//! Repository for the `blacklisted_fingerprints` table.

use sqlx::PgPool;

use crate::models::blacklist::BlacklistedFingerprint;

/// Read access to the fingerprint blacklist. Writes happen inside
/// [`DeviceTrustRepo::blacklist_attempt`](super::DeviceTrustRepo::blacklist_attempt).
pub struct BlacklistRepo;

impl BlacklistRepo {
    /// Whether `fingerprint` is permanently denied.
    pub async fn is_blacklisted(pool: &PgPool, fingerprint: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blacklisted_fingerprints WHERE fingerprint = $1)",
        )
        .bind(fingerprint)
        .fetch_one(pool)
        .await
    }

    /// List blacklisted fingerprints, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<BlacklistedFingerprint>, sqlx::Error> {
        sqlx::query_as::<_, BlacklistedFingerprint>(
            "SELECT id, fingerprint, reason, blacklisted_by, created_at
             FROM blacklisted_fingerprints ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}
