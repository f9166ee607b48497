//! Device entity model and DTOs.

use precinct_core::review::DeviceSummary;
use precinct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: DbId,
    pub user_id: DbId,
    pub fingerprint: String,
    pub label: Option<String>,
    pub is_active: bool,
    pub is_primary: bool,
    pub first_seen_at: Timestamp,
    pub last_seen_at: Timestamp,
    pub login_count: i64,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Device> for DeviceSummary {
    fn from(d: Device) -> Self {
        DeviceSummary {
            id: d.id,
            user_id: d.user_id,
            fingerprint: d.fingerprint,
            label: d.label,
            is_active: d.is_active,
            is_primary: d.is_primary,
            first_seen_at: d.first_seen_at,
            last_seen_at: d.last_seen_at,
            login_count: d.login_count,
            notes: d.notes,
        }
    }
}
