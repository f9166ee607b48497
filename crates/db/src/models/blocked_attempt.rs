//! Blocked login attempt model and DTOs.

use precinct_core::review::PendingAttempt;
use precinct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `blocked_attempts` table. Never updated once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlockedAttempt {
    pub id: DbId,
    pub user_id: DbId,
    pub fingerprint: String,
    pub geo_location: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub reason: String,
    pub created_at: Timestamp,
}

impl From<BlockedAttempt> for PendingAttempt {
    fn from(a: BlockedAttempt) -> Self {
        PendingAttempt {
            id: a.id,
            user_id: a.user_id,
            fingerprint: a.fingerprint,
            geo_location: a.geo_location,
            ip_address: a.ip_address,
            user_agent: a.user_agent,
            reason: a.reason,
            created_at: a.created_at,
        }
    }
}
