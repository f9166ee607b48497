//! Well-known role name constants carried in access-token claims.
//!
//! Any other role (such as `officer`) is refused by both device routes.

/// Operators who review devices and blocked attempts.
pub const ROLE_ADMIN: &str = "admin";

/// The authentication layer, which calls the admission check on each login.
pub const ROLE_SERVICE: &str = "service";
