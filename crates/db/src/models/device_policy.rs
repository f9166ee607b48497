//! Per-user device cap model.

use precinct_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_device_policies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DevicePolicy {
    pub user_id: DbId,
    pub max_devices: i32,
    pub updated_at: Timestamp,
}
