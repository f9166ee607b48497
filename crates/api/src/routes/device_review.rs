//! Route definitions for the `/device-review` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::device_review;
use crate::state::AppState;

/// Routes mounted at `/device-review`.
///
/// ```text
/// POST /   -> dispatch (body: tagged ReviewRequest)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(device_review::dispatch))
}
