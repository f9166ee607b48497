//! Blacklisted fingerprint model.

use precinct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `blacklisted_fingerprints` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlacklistedFingerprint {
    pub id: DbId,
    pub fingerprint: String,
    pub reason: String,
    pub blacklisted_by: Option<DbId>,
    pub created_at: Timestamp,
}
