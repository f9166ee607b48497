//! Two-phase local updates: apply now, then commit or revert once the
//! backend has answered.

use precinct_core::review::PendingAttempt;
use precinct_core::types::DbId;

use crate::store::DeviceStore;

/// Undo information for a change already applied to a [`DeviceStore`].
pub trait Revert {
    fn revert(self, store: &mut DeviceStore);
}

/// A local change made ahead of backend confirmation.
///
/// Dropping a `Tentative` without calling [`commit`](Self::commit) or
/// [`revert`](Self::revert) keeps the change, which is the same as a commit.
#[must_use = "a tentative change must be committed or reverted"]
#[derive(Debug)]
pub struct Tentative<T: Revert> {
    undo: T,
}

impl<T: Revert> Tentative<T> {
    /// Apply `change` to `store` and hold on to the undo data it returns.
    pub fn apply(store: &mut DeviceStore, change: impl FnOnce(&mut DeviceStore) -> T) -> Self {
        Self {
            undo: change(store),
        }
    }

    /// Keep the change. Returns the undo data for inspection.
    pub fn commit(self) -> T {
        self.undo
    }

    /// Roll the store back to its state before [`apply`](Self::apply).
    pub fn revert(self, store: &mut DeviceStore) {
        self.undo.revert(store);
    }
}

/// Undo data for the panel's optimistic edits.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A pending attempt left the local log. `None` if it was not there.
    AttemptRemoved(Option<PendingAttempt>),
    /// A user's cap was overwritten. `previous` is `None` for unknown users.
    MaxDevicesChanged { user_id: DbId, previous: Option<i32> },
}

impl Revert for StoreChange {
    fn revert(self, store: &mut DeviceStore) {
        match self {
            StoreChange::AttemptRemoved(Some(attempt)) => store.insert_attempt(attempt),
            StoreChange::AttemptRemoved(None) => {}
            StoreChange::MaxDevicesChanged {
                user_id,
                previous: Some(previous),
            } => {
                store.set_max_devices(user_id, previous);
            }
            StoreChange::MaxDevicesChanged { previous: None, .. } => {}
        }
    }
}

impl Tentative<StoreChange> {
    /// Remove a pending attempt from the local log.
    pub fn remove_attempt(store: &mut DeviceStore, attempt_id: DbId) -> Self {
        Self::apply(store, |s| {
            StoreChange::AttemptRemoved(s.remove_attempt(attempt_id))
        })
    }

    /// Overwrite a user's cap locally.
    pub fn set_max_devices(store: &mut DeviceStore, user_id: DbId, max_devices: i32) -> Self {
        Self::apply(store, |s| StoreChange::MaxDevicesChanged {
            user_id,
            previous: s.set_max_devices(user_id, max_devices),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use precinct_core::review::{DeviceStats, DeviceUser};

    use super::*;

    fn store() -> DeviceStore {
        let mut store = DeviceStore::new();
        store.replace_users(
            vec![DeviceUser {
                user_id: 1,
                username: "officer".to_string(),
                full_name: None,
                max_devices: 3,
                devices: vec![],
            }],
            DeviceStats::default(),
        );
        store.replace_attempts(vec![PendingAttempt {
            id: 7,
            user_id: 1,
            fingerprint: "fp-7".to_string(),
            geo_location: None,
            ip_address: None,
            user_agent: None,
            reason: "Device limit reached".to_string(),
            created_at: Utc::now(),
        }]);
        store
    }

    #[test]
    fn test_remove_attempt_revert_restores_it() {
        let mut store = store();
        let tentative = Tentative::remove_attempt(&mut store, 7);
        assert!(store.attempt(7).is_none());
        tentative.revert(&mut store);
        assert_eq!(store.attempt(7).map(|a| a.fingerprint.as_str()), Some("fp-7"));
    }

    #[test]
    fn test_remove_attempt_commit_keeps_removal() {
        let mut store = store();
        let undo = Tentative::remove_attempt(&mut store, 7).commit();
        assert_matches!(undo, StoreChange::AttemptRemoved(Some(_)));
        assert!(store.attempt(7).is_none());
    }

    #[test]
    fn test_revert_of_missing_attempt_is_noop() {
        let mut store = store();
        Tentative::remove_attempt(&mut store, 99).revert(&mut store);
        assert_eq!(store.attempts().count(), 1);
    }

    #[test]
    fn test_set_max_devices_revert() {
        let mut store = store();
        let tentative = Tentative::set_max_devices(&mut store, 1, 8);
        assert_eq!(store.user(1).unwrap().max_devices, 8);
        tentative.revert(&mut store);
        assert_eq!(store.user(1).unwrap().max_devices, 3);
    }
}
