pub mod device_review;
pub mod devices;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /device-review                 typed review RPC (POST, admin only)
/// /devices/check                 per-login admission check (POST, service or admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Operator review of devices and blocked attempts.
        .nest("/device-review", device_review::router())
        // Admission checks from the authentication layer.
        .nest("/devices", devices::router())
}
