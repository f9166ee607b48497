//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row; `user` also carries the create DTO used for seeding.

pub mod blacklist;
pub mod blocked_attempt;
pub mod device;
pub mod device_policy;
pub mod user;
