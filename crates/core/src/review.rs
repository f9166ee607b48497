//! Typed RPC for the device review surface.
//!
//! Every operator action travels as one [`ReviewRequest`] variant and comes
//! back as the matching [`ReviewResponse`] variant, wrapped in the standard
//! `{ "data": ... }` envelope. The server and the review client share these
//! definitions, so an action name or payload field can never drift between
//! them.

use serde::{Deserialize, Serialize};

use crate::device_policy::{is_at_limit, validate_max_devices};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Wire entities
// ---------------------------------------------------------------------------

/// A registered device as presented to operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
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
}

/// A rejected login attempt awaiting operator review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAttempt {
    pub id: DbId,
    pub user_id: DbId,
    pub fingerprint: String,
    pub geo_location: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub reason: String,
    pub created_at: Timestamp,
}

/// A user together with their device cap and registered devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceUser {
    pub user_id: DbId,
    pub username: String,
    pub full_name: Option<String>,
    pub max_devices: i32,
    pub devices: Vec<DeviceSummary>,
}

impl DeviceUser {
    pub fn is_at_limit(&self) -> bool {
        is_at_limit(self.devices.len() as i64, self.max_devices)
    }
}

/// Aggregate counters shown above the device list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub total_users: i64,
    pub total_devices: i64,
    pub active_devices: i64,
    pub users_at_limit: i64,
    pub pending_attempts: i64,
}

impl DeviceStats {
    /// Derive the counters from a user list and a pending-attempt count.
    pub fn from_users(users: &[DeviceUser], pending_attempts: i64) -> Self {
        let devices = users.iter().flat_map(|u| u.devices.iter());
        let (total_devices, active_devices) = devices.fold((0, 0), |(total, active), d| {
            (total + 1, active + i64::from(d.is_active))
        });
        Self {
            total_users: users.len() as i64,
            total_devices,
            active_devices,
            users_at_limit: users.iter().filter(|u| u.is_at_limit()).count() as i64,
            pending_attempts,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// An operator action against the device registry or the blocked-attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewRequest {
    ListUsersWithDevices,
    ListBlockedAttempts,
    ApproveAttempt { attempt_id: DbId },
    BlacklistAttempt { attempt_id: DbId },
    DeleteDevice { device_id: DbId },
    ResetAllDevices { user_id: DbId },
    SetMaxDevices { user_id: DbId, max_devices: i32 },
}

impl ReviewRequest {
    /// Stable action name, used in logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::ListUsersWithDevices => "list_users_with_devices",
            Self::ListBlockedAttempts => "list_blocked_attempts",
            Self::ApproveAttempt { .. } => "approve_attempt",
            Self::BlacklistAttempt { .. } => "blacklist_attempt",
            Self::DeleteDevice { .. } => "delete_device",
            Self::ResetAllDevices { .. } => "reset_all_devices",
            Self::SetMaxDevices { .. } => "set_max_devices",
        }
    }

    /// Reject payloads that must never reach the store.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::SetMaxDevices { max_devices, .. } => validate_max_devices(*max_devices),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Result of a [`ReviewRequest`]. Each request has exactly one success variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewResponse {
    UsersWithDevices {
        users: Vec<DeviceUser>,
        stats: DeviceStats,
    },
    BlockedAttempts {
        attempts: Vec<PendingAttempt>,
    },
    AttemptApproved {
        attempt_id: DbId,
        device: DeviceSummary,
    },
    AttemptBlacklisted {
        attempt_id: DbId,
        fingerprint: String,
    },
    DeviceDeleted {
        device_id: DbId,
    },
    DevicesReset {
        user_id: DbId,
        removed: u64,
    },
    MaxDevicesSet {
        user_id: DbId,
        max_devices: i32,
    },
}

impl ReviewResponse {
    /// Stable variant name, matching the `kind` tag on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UsersWithDevices { .. } => "users_with_devices",
            Self::BlockedAttempts { .. } => "blocked_attempts",
            Self::AttemptApproved { .. } => "attempt_approved",
            Self::AttemptBlacklisted { .. } => "attempt_blacklisted",
            Self::DeviceDeleted { .. } => "device_deleted",
            Self::DevicesReset { .. } => "devices_reset",
            Self::MaxDevicesSet { .. } => "max_devices_set",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn device(id: DbId, user_id: DbId, is_active: bool) -> DeviceSummary {
        let now = Utc::now();
        DeviceSummary {
            id,
            user_id,
            fingerprint: format!("fp{id}"),
            label: None,
            is_active,
            is_primary: false,
            first_seen_at: now,
            last_seen_at: now,
            login_count: 1,
            notes: None,
        }
    }

    fn user(user_id: DbId, max_devices: i32, devices: Vec<DeviceSummary>) -> DeviceUser {
        DeviceUser {
            user_id,
            username: format!("user{user_id}"),
            full_name: None,
            max_devices,
            devices,
        }
    }

    #[test]
    fn test_request_uses_action_tag() {
        let value = serde_json::to_value(ReviewRequest::ApproveAttempt { attempt_id: 7 }).unwrap();
        assert_eq!(value, json!({ "action": "approve_attempt", "attempt_id": 7 }));

        let parsed: ReviewRequest =
            serde_json::from_value(json!({ "action": "list_blocked_attempts" })).unwrap();
        assert_eq!(parsed, ReviewRequest::ListBlockedAttempts);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let parsed = serde_json::from_value::<ReviewRequest>(json!({ "action": "drop_table" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_action_names_match_serde_tags() {
        let requests = [
            ReviewRequest::ListUsersWithDevices,
            ReviewRequest::ListBlockedAttempts,
            ReviewRequest::ApproveAttempt { attempt_id: 1 },
            ReviewRequest::BlacklistAttempt { attempt_id: 1 },
            ReviewRequest::DeleteDevice { device_id: 1 },
            ReviewRequest::ResetAllDevices { user_id: 1 },
            ReviewRequest::SetMaxDevices { user_id: 1, max_devices: 2 },
        ];
        for request in requests {
            let value = serde_json::to_value(&request).unwrap();
            assert_eq!(value["action"], request.action());
        }
    }

    #[test]
    fn test_set_max_devices_validated() {
        let bad = ReviewRequest::SetMaxDevices { user_id: 1, max_devices: 0 };
        assert!(bad.validate().is_err());
        let good = ReviewRequest::SetMaxDevices { user_id: 1, max_devices: 4 };
        assert!(good.validate().is_ok());
        assert!(ReviewRequest::ListUsersWithDevices.validate().is_ok());
    }

    #[test]
    fn test_stats_from_users() {
        let users = vec![
            user(1, 2, vec![device(10, 1, true), device(11, 1, false)]),
            user(2, 3, vec![device(20, 2, true)]),
            user(3, 1, vec![]),
        ];
        let stats = DeviceStats::from_users(&users, 4);
        assert_eq!(
            stats,
            DeviceStats {
                total_users: 3,
                total_devices: 3,
                active_devices: 2,
                users_at_limit: 1,
                pending_attempts: 4,
            }
        );
    }

    #[test]
    fn test_response_uses_kind_tag() {
        let value = serde_json::to_value(ReviewResponse::DevicesReset { user_id: 5, removed: 2 })
            .unwrap();
        assert_eq!(value, json!({ "kind": "devices_reset", "user_id": 5, "removed": 2 }));
    }
}
