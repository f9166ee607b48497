//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role (device review).
//! - [`rbac::RequireService`] -- Requires `service` or `admin` (admission checks).

pub mod auth;
pub mod rbac;
