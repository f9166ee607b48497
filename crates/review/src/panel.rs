//! The operator review workflow.
//!
//! A [`ReviewPanel`] is the single owner of the local [`DeviceStore`]. Reads
//! replace one view each; writes are one backend call followed by a targeted
//! store patch and a reconciling [`refresh`](ReviewPanel::refresh). Every
//! outcome is reported as a one-shot [`Notice`]. Nothing is retried.

use std::sync::Arc;

use precinct_core::fingerprint::abbreviate;
use precinct_core::review::{ReviewRequest, ReviewResponse};
use precinct_core::types::DbId;

use crate::backend::ReviewBackend;
use crate::error::ReviewError;
use crate::optimistic::Tentative;
use crate::store::DeviceStore;

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A one-shot message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Operator answer to a destructive-action prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

pub struct ReviewPanel {
    backend: Arc<dyn ReviewBackend>,
    store: DeviceStore,
    notices: Vec<Notice>,
}

impl ReviewPanel {
    pub fn new(backend: Arc<dyn ReviewBackend>) -> Self {
        Self {
            backend,
            store: DeviceStore::new(),
            notices: Vec::new(),
        }
    }

    pub fn store(&self) -> &DeviceStore {
        &self.store
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain pending notices. Each notice is delivered once.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Reload users, their devices, and the stats block.
    pub async fn list_users_with_devices(&mut self) -> Result<(), ReviewError> {
        let result = self.backend.call(ReviewRequest::ListUsersWithDevices).await;
        self.apply_users(result)
    }

    /// Reload the pending-attempt log.
    pub async fn list_blocked_attempts(&mut self) -> Result<(), ReviewError> {
        let result = self.backend.call(ReviewRequest::ListBlockedAttempts).await;
        self.apply_attempts(result)
    }

    /// Reload both views concurrently.
    ///
    /// Each view is applied independently; on partial failure the failed
    /// view keeps its previous contents. Returns the first error, if any.
    pub async fn refresh(&mut self) -> Result<(), ReviewError> {
        let (users, attempts) = tokio::join!(
            self.backend.call(ReviewRequest::ListUsersWithDevices),
            self.backend.call(ReviewRequest::ListBlockedAttempts),
        );
        let users = self.apply_users(users);
        let attempts = self.apply_attempts(attempts);
        users.and(attempts)
    }

    // -----------------------------------------------------------------------
    // Attempt resolution
    // -----------------------------------------------------------------------

    /// Approve a pending attempt, registering its fingerprint as a device.
    pub async fn approve(&mut self, attempt_id: DbId) -> Result<(), ReviewError> {
        let tentative = Tentative::remove_attempt(&mut self.store, attempt_id);
        let request = ReviewRequest::ApproveAttempt { attempt_id };
        let action = request.action();

        let result = self.backend.call(request).await;
        match result {
            Ok(ReviewResponse::AttemptApproved { device, .. }) => {
                tentative.commit();
                let message = format!("Device {} approved", abbreviate(&device.fingerprint));
                self.store.upsert_device(device);
                self.notify_success(message);
                self.reconcile().await;
                Ok(())
            }
            other => {
                tentative.revert(&mut self.store);
                let err = into_failure(action, other);
                self.notify_error(format!("Failed to approve attempt {attempt_id}: {err}"));
                Err(err)
            }
        }
    }

    /// Blacklist the fingerprint of a pending attempt.
    pub async fn blacklist(&mut self, attempt_id: DbId) -> Result<(), ReviewError> {
        let tentative = Tentative::remove_attempt(&mut self.store, attempt_id);
        let request = ReviewRequest::BlacklistAttempt { attempt_id };
        let action = request.action();

        let result = self.backend.call(request).await;
        match result {
            Ok(ReviewResponse::AttemptBlacklisted { fingerprint, .. }) => {
                tentative.commit();
                self.store.purge_fingerprint(&fingerprint);
                self.notify_success(format!("Fingerprint {} blacklisted", abbreviate(&fingerprint)));
                self.reconcile().await;
                Ok(())
            }
            other => {
                tentative.revert(&mut self.store);
                let err = into_failure(action, other);
                self.notify_error(format!("Failed to blacklist attempt {attempt_id}: {err}"));
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Device and policy mutations
    // -----------------------------------------------------------------------

    /// Change a user's device cap. Out-of-range values never reach the backend.
    pub async fn set_max_devices(
        &mut self,
        user_id: DbId,
        max_devices: i32,
    ) -> Result<(), ReviewError> {
        let request = ReviewRequest::SetMaxDevices {
            user_id,
            max_devices,
        };
        if let Err(e) = request.validate() {
            let err = ReviewError::from(e);
            self.notify_error(err.to_string());
            return Err(err);
        }
        let action = request.action();
        let tentative = Tentative::set_max_devices(&mut self.store, user_id, max_devices);

        let result = self.backend.call(request).await;
        match result {
            Ok(ReviewResponse::MaxDevicesSet { max_devices, .. }) => {
                tentative.commit();
                self.store.set_max_devices(user_id, max_devices);
                self.notify_success(format!("Device limit set to {max_devices}"));
                self.reconcile().await;
                Ok(())
            }
            other => {
                tentative.revert(&mut self.store);
                let err = into_failure(action, other);
                self.notify_error(format!("Failed to update device limit: {err}"));
                Err(err)
            }
        }
    }

    /// Remove one registered device. Does nothing unless confirmed.
    pub async fn delete_device(
        &mut self,
        device_id: DbId,
        confirmation: Confirmation,
    ) -> Result<(), ReviewError> {
        if confirmation == Confirmation::Declined {
            tracing::debug!(device_id, "Device deletion declined");
            return Ok(());
        }
        let request = ReviewRequest::DeleteDevice { device_id };
        let action = request.action();

        let result = self.backend.call(request).await;
        match result {
            Ok(ReviewResponse::DeviceDeleted { device_id }) => {
                self.store.remove_device(device_id);
                self.notify_success("Device removed".to_string());
                self.reconcile().await;
                Ok(())
            }
            other => {
                let err = into_failure(action, other);
                self.notify_error(format!("Failed to remove device {device_id}: {err}"));
                Err(err)
            }
        }
    }

    /// Remove every device of one user. Does nothing unless confirmed.
    pub async fn reset_all_devices(
        &mut self,
        user_id: DbId,
        confirmation: Confirmation,
    ) -> Result<(), ReviewError> {
        if confirmation == Confirmation::Declined {
            tracing::debug!(user_id, "Device reset declined");
            return Ok(());
        }
        let request = ReviewRequest::ResetAllDevices { user_id };
        let action = request.action();

        let result = self.backend.call(request).await;
        match result {
            Ok(ReviewResponse::DevicesReset { user_id, removed }) => {
                self.store.clear_devices(user_id);
                self.notify_success(format!("{removed} device(s) reset"));
                self.reconcile().await;
                Ok(())
            }
            other => {
                let err = into_failure(action, other);
                self.notify_error(format!("Failed to reset devices: {err}"));
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn apply_users(
        &mut self,
        result: Result<ReviewResponse, ReviewError>,
    ) -> Result<(), ReviewError> {
        match result {
            Ok(ReviewResponse::UsersWithDevices { users, stats }) => {
                tracing::debug!(users = users.len(), "Device view refreshed");
                self.store.replace_users(users, stats);
                Ok(())
            }
            other => {
                let err = into_failure("list_users_with_devices", other);
                self.notify_error(format!("Failed to load devices: {err}"));
                Err(err)
            }
        }
    }

    fn apply_attempts(
        &mut self,
        result: Result<ReviewResponse, ReviewError>,
    ) -> Result<(), ReviewError> {
        match result {
            Ok(ReviewResponse::BlockedAttempts { attempts }) => {
                tracing::debug!(attempts = attempts.len(), "Attempt view refreshed");
                self.store.replace_attempts(attempts);
                Ok(())
            }
            other => {
                let err = into_failure("list_blocked_attempts", other);
                self.notify_error(format!("Failed to load blocked attempts: {err}"));
                Err(err)
            }
        }
    }

    /// Re-fetch after a successful write. Failures already raised a notice.
    async fn reconcile(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Reconciling refresh incomplete");
        }
    }

    fn notify_success(&mut self, message: String) {
        tracing::info!(%message, "Review notice");
        self.notices.push(Notice {
            level: NoticeLevel::Success,
            message,
        });
    }

    fn notify_error(&mut self, message: String) {
        tracing::warn!(%message, "Review notice");
        self.notices.push(Notice {
            level: NoticeLevel::Error,
            message,
        });
    }
}

/// Turn a non-matching call result into an error.
fn into_failure(
    action: &'static str,
    result: Result<ReviewResponse, ReviewError>,
) -> ReviewError {
    match result {
        Ok(response) => ReviewError::UnexpectedResponse {
            action,
            kind: response.kind().to_string(),
        },
        Err(e) => e,
    }
}
