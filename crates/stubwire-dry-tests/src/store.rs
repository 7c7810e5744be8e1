// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory fixture store fake for testing without filesystem I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stubwire_core::{FixtureError, FixtureStore};

/// In-memory implementation of [`FixtureStore`] for testing.
///
/// Tracks load/save call counts and can be told to fail, so fixture loading
/// paths can be exercised without touching the filesystem.
///
/// # Example
///
/// ```
/// use stubwire_dry_tests::InMemoryFixtureStore;
/// use stubwire_core::{FixtureService, FixtureSet};
///
/// let store = InMemoryFixtureStore::new();
/// let service = FixtureService::new(store.clone());
///
/// service.save("empty", &FixtureSet::default()).unwrap();
/// assert_eq!(store.load_count(), 0);
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryFixtureStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryFixtureStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `json` under `name`.
    pub fn with_fixture(name: &str, json: &str) -> Self {
        let store = Self::new();
        store.lock().data.insert(name.to_owned(), json.as_bytes().to_vec());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Number of `save_raw` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Check if a fixture exists in the store.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().data.contains_key(name)
    }

    /// Raw bytes stored under `name`.
    pub fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().data.get(name).cloned()
    }
}

impl FixtureStore for InMemoryFixtureStore {
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, FixtureError> {
        let mut inner = self.lock();
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(FixtureError::Other("simulated load failure".into()));
        }

        inner.data.get(name).cloned().ok_or(FixtureError::NotFound)
    }

    fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), FixtureError> {
        let mut inner = self.lock();
        inner.save_count += 1;

        if inner.fail_on_save {
            return Err(FixtureError::Other("simulated save failure".into()));
        }

        inner.data.insert(name.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_save_load() {
        let store = InMemoryFixtureStore::new();
        store.save_raw("set", b"{}").unwrap();
        assert_eq!(store.load_raw("set").unwrap(), b"{}");
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn load_missing_returns_not_found() {
        let store = InMemoryFixtureStore::new();
        assert!(matches!(store.load_raw("missing"), Err(FixtureError::NotFound)));
    }

    #[test]
    fn failures_still_count_and_store_nothing() {
        let store = InMemoryFixtureStore::new();
        store.set_fail_on_save(true);
        assert!(matches!(
            store.save_raw("set", b"{}"),
            Err(FixtureError::Other(_))
        ));
        assert!(!store.contains("set"));
        assert_eq!(store.save_count(), 1);

        store.set_fail_on_load(true);
        assert!(store.load_raw("set").is_err());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryFixtureStore::with_fixture("set", "{}");
        let b = a.clone();
        assert_eq!(b.raw("set"), Some(b"{}".to_vec()));
        b.set_fail_on_load(true);
        assert!(a.load_raw("set").is_err());
    }
}
