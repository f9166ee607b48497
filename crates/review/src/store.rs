//! Local, id-keyed copy of the device registry and the blocked-attempt log.
//!
//! Both views are replaced wholesale by a refresh and patched in place by
//! successful mutations. The two regions are disjoint: replacing one never
//! touches the other, so a partially failed refresh leaves one view fresh
//! and the other as it was.

use std::collections::BTreeMap;

use precinct_core::review::{DeviceStats, DeviceSummary, DeviceUser, PendingAttempt};
use precinct_core::types::DbId;

/// Operator-side state for the review panel.
#[derive(Debug, Clone, Default)]
pub struct DeviceStore {
    users: BTreeMap<DbId, DeviceUser>,
    attempts: BTreeMap<DbId, PendingAttempt>,
    stats: DeviceStats,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Wholesale replacement (refresh)
    // -----------------------------------------------------------------------

    /// Replace the device view with authoritative data.
    pub fn replace_users(&mut self, users: Vec<DeviceUser>, stats: DeviceStats) {
        self.users = users.into_iter().map(|u| (u.user_id, u)).collect();
        self.stats = stats;
    }

    /// Replace the pending-attempt view with authoritative data.
    pub fn replace_attempts(&mut self, attempts: Vec<PendingAttempt>) {
        self.attempts = attempts.into_iter().map(|a| (a.id, a)).collect();
        self.stats.pending_attempts = self.attempts.len() as i64;
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn users(&self) -> impl Iterator<Item = &DeviceUser> {
        self.users.values()
    }

    pub fn user(&self, user_id: DbId) -> Option<&DeviceUser> {
        self.users.get(&user_id)
    }

    pub fn attempts(&self) -> impl Iterator<Item = &PendingAttempt> {
        self.attempts.values()
    }

    pub fn attempt(&self, attempt_id: DbId) -> Option<&PendingAttempt> {
        self.attempts.get(&attempt_id)
    }

    pub fn device(&self, device_id: DbId) -> Option<&DeviceSummary> {
        self.users
            .values()
            .flat_map(|u| u.devices.iter())
            .find(|d| d.id == device_id)
    }

    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    // -----------------------------------------------------------------------
    // Targeted patches
    // -----------------------------------------------------------------------

    pub fn remove_attempt(&mut self, attempt_id: DbId) -> Option<PendingAttempt> {
        let removed = self.attempts.remove(&attempt_id);
        if removed.is_some() {
            self.recompute_stats();
        }
        removed
    }

    pub fn insert_attempt(&mut self, attempt: PendingAttempt) {
        self.attempts.insert(attempt.id, attempt);
        self.recompute_stats();
    }

    /// Insert or replace a device under its owner. Returns `false` when the
    /// owner is not in the local view.
    pub fn upsert_device(&mut self, device: DeviceSummary) -> bool {
        let Some(user) = self.users.get_mut(&device.user_id) else {
            return false;
        };
        match user.devices.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => *existing = device,
            None => user.devices.push(device),
        }
        self.recompute_stats();
        true
    }

    pub fn remove_device(&mut self, device_id: DbId) -> Option<DeviceSummary> {
        let removed = self.users.values_mut().find_map(|u| {
            let pos = u.devices.iter().position(|d| d.id == device_id)?;
            Some(u.devices.remove(pos))
        });
        if removed.is_some() {
            self.recompute_stats();
        }
        removed
    }

    /// Drop every device of one user, returning how many were removed.
    pub fn clear_devices(&mut self, user_id: DbId) -> usize {
        let removed = self
            .users
            .get_mut(&user_id)
            .map(|u| std::mem::take(&mut u.devices).len())
            .unwrap_or(0);
        self.recompute_stats();
        removed
    }

    /// Set a user's cap, returning the previous value.
    pub fn set_max_devices(&mut self, user_id: DbId, max_devices: i32) -> Option<i32> {
        let user = self.users.get_mut(&user_id)?;
        let previous = std::mem::replace(&mut user.max_devices, max_devices);
        self.recompute_stats();
        Some(previous)
    }

    /// Remove every device and pending attempt carrying `fingerprint`.
    pub fn purge_fingerprint(&mut self, fingerprint: &str) {
        for user in self.users.values_mut() {
            user.devices.retain(|d| d.fingerprint != fingerprint);
        }
        self.attempts.retain(|_, a| a.fingerprint != fingerprint);
        self.recompute_stats();
    }

    fn recompute_stats(&mut self) {
        let users: Vec<DeviceUser> = self.users.values().cloned().collect();
        self.stats = DeviceStats::from_users(&users, self.attempts.len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn device(id: DbId, user_id: DbId, fingerprint: &str) -> DeviceSummary {
        let now = Utc::now();
        DeviceSummary {
            id,
            user_id,
            fingerprint: fingerprint.to_string(),
            label: None,
            is_active: true,
            is_primary: false,
            first_seen_at: now,
            last_seen_at: now,
            login_count: 1,
            notes: None,
        }
    }

    fn attempt(id: DbId, user_id: DbId, fingerprint: &str) -> PendingAttempt {
        PendingAttempt {
            id,
            user_id,
            fingerprint: fingerprint.to_string(),
            geo_location: None,
            ip_address: None,
            user_agent: None,
            reason: "Device limit reached".to_string(),
            created_at: Utc::now(),
        }
    }

    fn store() -> DeviceStore {
        let users = vec![DeviceUser {
            user_id: 1,
            username: "officer".to_string(),
            full_name: None,
            max_devices: 2,
            devices: vec![device(10, 1, "fp-a"), device(11, 1, "fp-b")],
        }];
        let stats = DeviceStats::from_users(&users, 2);
        let mut store = DeviceStore::new();
        store.replace_users(users, stats);
        store.replace_attempts(vec![attempt(100, 1, "fp-c"), attempt(101, 1, "fp-a")]);
        store
    }

    #[test]
    fn test_replace_attempts_keeps_users() {
        let mut store = store();
        store.replace_attempts(vec![]);
        assert_eq!(store.attempts().count(), 0);
        assert_eq!(store.user(1).unwrap().devices.len(), 2);
        assert_eq!(store.stats().pending_attempts, 0);
    }

    #[test]
    fn test_upsert_device_replaces_by_id() {
        let mut store = store();
        let mut updated = device(10, 1, "fp-a");
        updated.login_count = 9;
        assert!(store.upsert_device(updated));
        assert!(store.upsert_device(device(12, 1, "fp-c")));
        assert_eq!(store.device(10).unwrap().login_count, 9);
        assert_eq!(store.stats().total_devices, 3);
        assert!(!store.upsert_device(device(13, 99, "fp-z")));
    }

    #[test]
    fn test_remove_device_and_clear() {
        let mut store = store();
        assert_eq!(store.remove_device(10).map(|d| d.id), Some(10));
        assert!(store.remove_device(10).is_none());
        assert_eq!(store.clear_devices(1), 1);
        assert_eq!(store.stats().total_devices, 0);
    }

    #[test]
    fn test_set_max_devices_returns_previous() {
        let mut store = store();
        assert_eq!(store.stats().users_at_limit, 1);

        assert_eq!(store.set_max_devices(1, 3), Some(2));
        assert_eq!(store.stats().users_at_limit, 0);

        assert_eq!(store.set_max_devices(1, 2), Some(3));
        assert_eq!(store.stats().users_at_limit, 1);

        assert_eq!(store.set_max_devices(42, 5), None);
        assert_eq!(store.stats().total_users, 1);
    }

    #[test]
    fn test_purge_fingerprint_clears_devices_and_attempts() {
        let mut store = store();
        store.purge_fingerprint("fp-a");
        assert!(store.device(10).is_none());
        assert!(store.attempt(101).is_none());
        assert!(store.attempt(100).is_some());
        assert_eq!(store.stats().pending_attempts, 1);
    }
}
