//! Transactional device trust workflows spanning several tables.
//!
//! Every method here runs in a single transaction so that a fingerprint is
//! never simultaneously a registered device, a pending attempt, and a
//! blacklisted entry. Each transaction first takes a transaction-scoped
//! advisory lock keyed on the fingerprint, so admission, approval and
//! blacklisting of the same fingerprint run one at a time. The plain
//! per-table repos are used for reads only.

use precinct_core::admission::{
    decide, AdmissionDecision, AdmissionFacts, AdmissionRequest, BlockReason,
};
use precinct_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use super::blocked_attempt_repo::COLUMNS as ATTEMPT_COLUMNS;
use super::device_policy_repo::DevicePolicyRepo;
use super::device_repo::COLUMNS as DEVICE_COLUMNS;
use crate::models::blocked_attempt::BlockedAttempt;
use crate::models::device::Device;

/// Outcome of a login admission check.
#[derive(Debug)]
pub enum AdmitResult {
    Allowed { device: Device, is_new: bool },
    /// `attempt` is `None` for a blacklisted fingerprint, which is refused
    /// without entering the pending review queue.
    Blocked {
        attempt: Option<BlockedAttempt>,
        reason: BlockReason,
    },
    /// The user exists but their account is deactivated.
    UserInactive,
}

/// Outcome of approving a blocked attempt.
#[derive(Debug)]
pub enum ApproveResult {
    Approved { attempt: BlockedAttempt, device: Device },
    AttemptNotFound,
    /// The fingerprint was blacklisted after the attempt was logged.
    FingerprintBlacklisted,
}

/// Outcome of blacklisting a blocked attempt's fingerprint.
#[derive(Debug)]
pub enum BlacklistResult {
    Blacklisted {
        attempt: BlockedAttempt,
        removed_devices: u64,
        cleared_attempts: u64,
    },
    AttemptNotFound,
}

/// Multi-table device trust operations.
pub struct DeviceTrustRepo;

impl DeviceTrustRepo {
    /// Decide whether a login from `input.fingerprint` may proceed, and
    /// persist the consequence (touch, register, or log a blocked attempt).
    ///
    /// Returns `None` if the user does not exist. A blacklisted fingerprint
    /// is refused without logging a pending attempt.
    pub async fn admit(
        pool: &PgPool,
        input: &AdmissionRequest,
        default_max_devices: i32,
    ) -> Result<Option<AdmitResult>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::lock_fingerprint(&mut tx, &input.fingerprint).await?;

        // Row lock on the user serializes admissions, so two concurrent
        // logins cannot both take the last free slot.
        let user_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM users WHERE id = $1 FOR UPDATE")
                .bind(input.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        match user_active {
            None => return Ok(None),
            Some(false) => return Ok(Some(AdmitResult::UserInactive)),
            Some(true) => {}
        }

        let blacklisted = Self::is_blacklisted(&mut tx, &input.fingerprint).await?;

        let query = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE user_id = $1 AND fingerprint = $2");
        let existing = sqlx::query_as::<_, Device>(&query)
            .bind(input.user_id)
            .bind(&input.fingerprint)
            .fetch_optional(&mut *tx)
            .await?;

        let device_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices WHERE user_id = $1")
            .bind(input.user_id)
            .fetch_one(&mut *tx)
            .await?;

        let max_devices =
            DevicePolicyRepo::max_devices_for(&mut *tx, input.user_id, default_max_devices).await?;

        let facts = AdmissionFacts {
            blacklisted,
            existing_device: existing.as_ref().map(|d| d.is_active),
            device_count,
            max_devices,
        };

        let result = match decide(&facts) {
            AdmissionDecision::Touch => {
                let id = existing.map(|d| d.id).ok_or(sqlx::Error::RowNotFound)?;
                let query = format!(
                    "UPDATE devices SET last_seen_at = NOW(), login_count = login_count + 1
                     WHERE id = $1
                     RETURNING {DEVICE_COLUMNS}"
                );
                let device = sqlx::query_as::<_, Device>(&query)
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await?;
                AdmitResult::Allowed { device, is_new: false }
            }
            AdmissionDecision::Register { is_primary } => {
                let label = input
                    .label
                    .as_deref()
                    .map(str::trim)
                    .filter(|l| !l.is_empty());
                let query = format!(
                    "INSERT INTO devices (user_id, fingerprint, label, is_primary)
                     VALUES ($1, $2, $3, $4)
                     RETURNING {DEVICE_COLUMNS}"
                );
                let device = sqlx::query_as::<_, Device>(&query)
                    .bind(input.user_id)
                    .bind(&input.fingerprint)
                    .bind(label)
                    .bind(is_primary)
                    .fetch_one(&mut *tx)
                    .await?;
                AdmitResult::Allowed { device, is_new: true }
            }
            AdmissionDecision::Block(BlockReason::FingerprintBlacklisted) => AdmitResult::Blocked {
                attempt: None,
                reason: BlockReason::FingerprintBlacklisted,
            },
            AdmissionDecision::Block(reason) => {
                let query = format!(
                    "INSERT INTO blocked_attempts
                        (user_id, fingerprint, geo_location, ip_address, user_agent, reason)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     RETURNING {ATTEMPT_COLUMNS}"
                );
                let attempt = sqlx::query_as::<_, BlockedAttempt>(&query)
                    .bind(input.user_id)
                    .bind(&input.fingerprint)
                    .bind(&input.geo_location)
                    .bind(&input.ip_address)
                    .bind(&input.user_agent)
                    .bind(reason.message())
                    .fetch_one(&mut *tx)
                    .await?;
                AdmitResult::Blocked {
                    attempt: Some(attempt),
                    reason,
                }
            }
        };

        tx.commit().await?;
        Ok(Some(result))
    }

    /// Approve a pending attempt: register (or reactivate) the device and
    /// clear every pending attempt for the same user and fingerprint.
    ///
    /// Approval is an operator override and ignores the user's device cap.
    pub async fn approve_attempt(
        pool: &PgPool,
        attempt_id: DbId,
    ) -> Result<ApproveResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(attempt) = Self::lock_attempt(&mut tx, attempt_id).await? else {
            return Ok(ApproveResult::AttemptNotFound);
        };

        if Self::is_blacklisted(&mut tx, &attempt.fingerprint).await? {
            return Ok(ApproveResult::FingerprintBlacklisted);
        }

        let query = format!(
            "INSERT INTO devices (user_id, fingerprint, is_primary, notes)
             VALUES ($1, $2, NOT EXISTS (SELECT 1 FROM devices WHERE user_id = $1), $3)
             ON CONFLICT ON CONSTRAINT uq_devices_user_fingerprint
             DO UPDATE SET is_active = true, last_seen_at = NOW()
             RETURNING {DEVICE_COLUMNS}"
        );
        let device = sqlx::query_as::<_, Device>(&query)
            .bind(attempt.user_id)
            .bind(&attempt.fingerprint)
            .bind(format!("Approved from blocked attempt #{}", attempt.id))
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM blocked_attempts WHERE user_id = $1 AND fingerprint = $2")
            .bind(attempt.user_id)
            .bind(&attempt.fingerprint)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ApproveResult::Approved { attempt, device })
    }

    /// Blacklist the attempt's fingerprint for every user, removing any
    /// devices and pending attempts that carry it.
    ///
    /// `actor` is recorded as `blacklisted_by` when it names an existing user.
    pub async fn blacklist_attempt(
        pool: &PgPool,
        attempt_id: DbId,
        actor: DbId,
    ) -> Result<BlacklistResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(attempt) = Self::lock_attempt(&mut tx, attempt_id).await? else {
            return Ok(BlacklistResult::AttemptNotFound);
        };

        sqlx::query(
            "INSERT INTO blacklisted_fingerprints (fingerprint, reason, blacklisted_by)
             VALUES ($1, $2, (SELECT id FROM users WHERE id = $3))
             ON CONFLICT ON CONSTRAINT uq_blacklisted_fingerprints_fingerprint DO NOTHING",
        )
        .bind(&attempt.fingerprint)
        .bind(&attempt.reason)
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        let removed_devices = sqlx::query("DELETE FROM devices WHERE fingerprint = $1")
            .bind(&attempt.fingerprint)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let cleared_attempts = sqlx::query("DELETE FROM blocked_attempts WHERE fingerprint = $1")
            .bind(&attempt.fingerprint)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(BlacklistResult::Blacklisted {
            attempt,
            removed_devices,
            cleared_attempts,
        })
    }

    // ---- private helpers ----

    /// Lock a pending attempt and its fingerprint for the rest of the
    /// transaction. A concurrent resolution that already committed makes
    /// this return `None`.
    async fn lock_attempt(
        tx: &mut Transaction<'_, Postgres>,
        attempt_id: DbId,
    ) -> Result<Option<BlockedAttempt>, sqlx::Error> {
        let fingerprint: Option<String> =
            sqlx::query_scalar("SELECT fingerprint FROM blocked_attempts WHERE id = $1")
                .bind(attempt_id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some(fingerprint) = fingerprint else {
            return Ok(None);
        };

        // The fingerprint lock must come before the row lock, matching the
        // order `admit` takes them in. Re-read after waiting.
        Self::lock_fingerprint(tx, &fingerprint).await?;
        let query = format!("SELECT {ATTEMPT_COLUMNS} FROM blocked_attempts WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, BlockedAttempt>(&query)
            .bind(attempt_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Transaction-scoped advisory lock keyed on the fingerprint text.
    async fn lock_fingerprint(
        tx: &mut Transaction<'_, Postgres>,
        fingerprint: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(fingerprint)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn is_blacklisted(
        tx: &mut Transaction<'_, Postgres>,
        fingerprint: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blacklisted_fingerprints WHERE fingerprint = $1)",
        )
        .bind(fingerprint)
        .fetch_one(&mut **tx)
        .await
    }
}
