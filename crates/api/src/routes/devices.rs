//! Route definitions for the `/devices` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;

/// Routes mounted at `/devices`.
///
/// ```text
/// POST /check   -> check_device
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/check", post(devices::check_device))
}
