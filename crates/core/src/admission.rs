//! Per-login device admission rules.
//!
//! The authentication layer asks, after a successful credential check,
//! whether the presenting device may proceed. The answer depends only on
//! a handful of facts gathered from the store, so the decision itself is a
//! pure function over [`AdmissionFacts`].

use serde::{Deserialize, Serialize};

use crate::device_policy::is_at_limit;
use crate::error::CoreError;
use crate::fingerprint::{validate_fingerprint, validate_label};
use crate::review::DeviceSummary;
use crate::types::DbId;

/// Why a login was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    FingerprintBlacklisted,
    DeviceDeactivated,
    DeviceLimitReached,
}

impl BlockReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FingerprintBlacklisted => "fingerprint_blacklisted",
            Self::DeviceDeactivated => "device_deactivated",
            Self::DeviceLimitReached => "device_limit_reached",
        }
    }

    /// Text stored on the blocked-attempt row and shown to reviewers.
    pub fn message(self) -> &'static str {
        match self {
            Self::FingerprintBlacklisted => "Fingerprint is blacklisted",
            Self::DeviceDeactivated => "Device has been deactivated",
            Self::DeviceLimitReached => "Device limit reached",
        }
    }
}

/// What the store knows about a (user, fingerprint) pair at login time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionFacts {
    pub blacklisted: bool,
    /// `Some(is_active)` when the user already registered this fingerprint.
    pub existing_device: Option<bool>,
    pub device_count: i64,
    pub max_devices: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Known, active device: bump its activity counters.
    Touch,
    /// New device under the cap. The user's first device becomes primary.
    Register { is_primary: bool },
    Block(BlockReason),
}

/// Decide whether a login may proceed.
///
/// Blacklisting wins over everything, including an already registered
/// device with the same fingerprint.
pub fn decide(facts: &AdmissionFacts) -> AdmissionDecision {
    if facts.blacklisted {
        return AdmissionDecision::Block(BlockReason::FingerprintBlacklisted);
    }
    match facts.existing_device {
        Some(true) => AdmissionDecision::Touch,
        Some(false) => AdmissionDecision::Block(BlockReason::DeviceDeactivated),
        None if is_at_limit(facts.device_count, facts.max_devices) => {
            AdmissionDecision::Block(BlockReason::DeviceLimitReached)
        }
        None => AdmissionDecision::Register {
            is_primary: facts.device_count == 0,
        },
    }
}

/// Body of `POST /api/v1/devices/check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub user_id: DbId,
    pub fingerprint: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub geo_location: Option<String>,
}

impl AdmissionRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_fingerprint(&self.fingerprint)?;
        if let Some(label) = &self.label {
            validate_label(label)?;
        }
        Ok(())
    }
}

/// Answer returned to the authentication layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    Allowed {
        device: DeviceSummary,
        is_new: bool,
    },
    /// `attempt_id` is absent when the fingerprint is blacklisted: such
    /// logins are refused outright and never queued for review.
    Blocked {
        attempt_id: Option<DbId>,
        reason: BlockReason,
    },
}
