//! Handler for the typed device review RPC (`POST /device-review`).
//!
//! One endpoint receives every [`ReviewRequest`] variant and answers with
//! the matching [`ReviewResponse`]. All actions require the `admin` role.

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use precinct_core::error::CoreError;
use precinct_core::fingerprint::abbreviate;
use precinct_core::review::{
    DeviceStats, DeviceSummary, DeviceUser, PendingAttempt, ReviewRequest, ReviewResponse,
};
use precinct_core::types::DbId;
use precinct_db::repositories::{
    ApproveResult, BlacklistResult, BlockedAttemptRepo, DevicePolicyRepo, DeviceRepo,
    DeviceTrustRepo, UserRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/device-review
///
/// Validate and dispatch a review action.
pub async fn dispatch(
    State(state): State<AppState>,
    RequireAdmin(operator): RequireAdmin,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<ReviewResponse>>> {
    request.validate()?;

    tracing::debug!(
        action = request.action(),
        operator_id = operator.user_id,
        "Device review request"
    );

    let response = match request {
        ReviewRequest::ListUsersWithDevices => list_users_with_devices(&state).await?,
        ReviewRequest::ListBlockedAttempts => list_blocked_attempts(&state).await?,
        ReviewRequest::ApproveAttempt { attempt_id } => {
            approve_attempt(&state, &operator, attempt_id).await?
        }
        ReviewRequest::BlacklistAttempt { attempt_id } => {
            blacklist_attempt(&state, &operator, attempt_id).await?
        }
        ReviewRequest::DeleteDevice { device_id } => {
            delete_device(&state, &operator, device_id).await?
        }
        ReviewRequest::ResetAllDevices { user_id } => {
            reset_all_devices(&state, &operator, user_id).await?
        }
        ReviewRequest::SetMaxDevices {
            user_id,
            max_devices,
        } => set_max_devices(&state, &operator, user_id, max_devices).await?,
    };

    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

async fn list_users_with_devices(state: &AppState) -> AppResult<ReviewResponse> {
    let users = UserRepo::list_active(&state.pool).await?;
    let devices = DeviceRepo::list_all(&state.pool).await?;
    let policies = DevicePolicyRepo::list(&state.pool).await?;
    let pending = BlockedAttemptRepo::count_pending(&state.pool).await?;

    let caps: HashMap<DbId, i32> = policies
        .into_iter()
        .map(|p| (p.user_id, p.max_devices))
        .collect();

    let mut by_user: HashMap<DbId, Vec<DeviceSummary>> = HashMap::new();
    for device in devices {
        by_user
            .entry(device.user_id)
            .or_default()
            .push(device.into());
    }

    let users: Vec<DeviceUser> = users
        .into_iter()
        .map(|u| DeviceUser {
            user_id: u.id,
            max_devices: caps
                .get(&u.id)
                .copied()
                .unwrap_or(state.config.default_max_devices),
            devices: by_user.remove(&u.id).unwrap_or_default(),
            username: u.username,
            full_name: u.full_name,
        })
        .collect();

    let stats = DeviceStats::from_users(&users, pending);
    Ok(ReviewResponse::UsersWithDevices { users, stats })
}

async fn list_blocked_attempts(state: &AppState) -> AppResult<ReviewResponse> {
    let attempts: Vec<PendingAttempt> = BlockedAttemptRepo::list_pending(&state.pool)
        .await?
        .into_iter()
        .map(PendingAttempt::from)
        .collect();
    Ok(ReviewResponse::BlockedAttempts { attempts })
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

async fn approve_attempt(
    state: &AppState,
    operator: &AuthUser,
    attempt_id: DbId,
) -> AppResult<ReviewResponse> {
    match DeviceTrustRepo::approve_attempt(&state.pool, attempt_id).await? {
        ApproveResult::Approved { attempt, device } => {
            tracing::info!(
                attempt_id,
                device_id = device.id,
                user_id = attempt.user_id,
                fingerprint = %abbreviate(&attempt.fingerprint),
                operator_id = operator.user_id,
                "Blocked attempt approved"
            );
            Ok(ReviewResponse::AttemptApproved {
                attempt_id,
                device: device.into(),
            })
        }
        ApproveResult::AttemptNotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "BlockedAttempt",
            id: attempt_id,
        })),
        ApproveResult::FingerprintBlacklisted => Err(AppError::Core(CoreError::Conflict(
            "Fingerprint is blacklisted and cannot be approved".into(),
        ))),
    }
}

async fn blacklist_attempt(
    state: &AppState,
    operator: &AuthUser,
    attempt_id: DbId,
) -> AppResult<ReviewResponse> {
    match DeviceTrustRepo::blacklist_attempt(&state.pool, attempt_id, operator.user_id).await? {
        BlacklistResult::Blacklisted {
            attempt,
            removed_devices,
            cleared_attempts,
        } => {
            tracing::warn!(
                attempt_id,
                user_id = attempt.user_id,
                fingerprint = %abbreviate(&attempt.fingerprint),
                removed_devices,
                cleared_attempts,
                operator_id = operator.user_id,
                "Fingerprint blacklisted"
            );
            Ok(ReviewResponse::AttemptBlacklisted {
                attempt_id,
                fingerprint: attempt.fingerprint,
            })
        }
        BlacklistResult::AttemptNotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "BlockedAttempt",
            id: attempt_id,
        })),
    }
}

async fn delete_device(
    state: &AppState,
    operator: &AuthUser,
    device_id: DbId,
) -> AppResult<ReviewResponse> {
    if !DeviceRepo::delete(&state.pool, device_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Device",
            id: device_id,
        }));
    }
    tracing::info!(device_id, operator_id = operator.user_id, "Device deleted");
    Ok(ReviewResponse::DeviceDeleted { device_id })
}

async fn reset_all_devices(
    state: &AppState,
    operator: &AuthUser,
    user_id: DbId,
) -> AppResult<ReviewResponse> {
    ensure_user_exists(state, user_id).await?;
    let removed = DeviceRepo::delete_all_for_user(&state.pool, user_id).await?;
    tracing::info!(user_id, removed, operator_id = operator.user_id, "Devices reset");
    Ok(ReviewResponse::DevicesReset { user_id, removed })
}

async fn set_max_devices(
    state: &AppState,
    operator: &AuthUser,
    user_id: DbId,
    max_devices: i32,
) -> AppResult<ReviewResponse> {
    ensure_user_exists(state, user_id).await?;
    let policy = DevicePolicyRepo::upsert(&state.pool, user_id, max_devices).await?;
    tracing::info!(
        user_id,
        max_devices = policy.max_devices,
        operator_id = operator.user_id,
        "Device cap updated"
    );
    Ok(ReviewResponse::MaxDevicesSet {
        user_id,
        max_devices: policy.max_devices,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_user_exists(state: &AppState, user_id: DbId) -> AppResult<()> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .map(|_| ())
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
}
