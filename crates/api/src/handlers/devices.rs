//! Handler for the per-login admission check (`POST /devices/check`).
//!
//! Called by the authentication layer after credentials are verified.
//! A blocked answer has already been written to the blocked-attempt log
//! by the time it is returned, unless the fingerprint is blacklisted.

use axum::extract::State;
use axum::Json;
use precinct_core::admission::{AdmissionOutcome, AdmissionRequest};
use precinct_core::error::CoreError;
use precinct_core::fingerprint::abbreviate;
use precinct_db::repositories::{AdmitResult, DeviceTrustRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireService;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/devices/check
pub async fn check_device(
    State(state): State<AppState>,
    RequireService(_caller): RequireService,
    Json(input): Json<AdmissionRequest>,
) -> AppResult<Json<DataResponse<AdmissionOutcome>>> {
    input.validate()?;

    let result = DeviceTrustRepo::admit(&state.pool, &input, state.config.default_max_devices)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }))?;

    let outcome = match result {
        AdmitResult::Allowed { device, is_new } => {
            if is_new {
                tracing::info!(
                    user_id = input.user_id,
                    device_id = device.id,
                    fingerprint = %abbreviate(&input.fingerprint),
                    "New device registered"
                );
            }
            AdmissionOutcome::Allowed {
                device: device.into(),
                is_new,
            }
        }
        AdmitResult::Blocked { attempt, reason } => {
            let attempt_id = attempt.map(|a| a.id);
            tracing::warn!(
                user_id = input.user_id,
                attempt_id,
                reason = reason.as_str(),
                fingerprint = %abbreviate(&input.fingerprint),
                "Login blocked"
            );
            AdmissionOutcome::Blocked { attempt_id, reason }
        }
        AdmitResult::UserInactive => {
            tracing::warn!(user_id = input.user_id, "Login refused for inactive user");
            return Err(AppError::Core(CoreError::Forbidden(
                "User account is inactive".into(),
            )));
        }
    };

    Ok(Json(DataResponse { data: outcome }))
}
