//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod blacklist_repo;
pub mod blocked_attempt_repo;
pub mod device_policy_repo;
pub mod device_repo;
pub mod device_trust_repo;
pub mod user_repo;

pub use blacklist_repo::BlacklistRepo;
pub use blocked_attempt_repo::BlockedAttemptRepo;
pub use device_policy_repo::DevicePolicyRepo;
pub use device_repo::DeviceRepo;
pub use device_trust_repo::{
    AdmitResult, ApproveResult, BlacklistResult, DeviceTrustRepo,
};
pub use user_repo::UserRepo;
