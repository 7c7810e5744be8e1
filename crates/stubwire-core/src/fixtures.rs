// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixture sets and the storage port used to load them.
//!
//! A fixture set bundles transport configuration with the subscriptions and
//! responses a test expects. Sets are stored as JSON blobs behind
//! [`FixtureStore`] so tests can keep them on disk (`stubwire-fixtures-fs`)
//! or in memory (`stubwire-dry-tests`).

use crate::config::TransportConfig;
use crate::error::MockError;
use crate::mocks::{MockedResponse, MockedSubscription};
use crate::responses::MockResponses;
use crate::subscriptions::MockSubscriptionTransport;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Storage port for raw fixture blobs (keyed by logical name).
pub trait FixtureStore {
    /// Load a raw fixture blob. Returns `NotFound` when missing.
    fn load_raw(&self, name: &str) -> Result<Vec<u8>, FixtureError>;
    /// Persist a raw fixture blob.
    fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), FixtureError>;
}

/// Error type for fixture operations.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Fixture not present in store.
    #[error("fixture not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Fixture loaded but its requests cannot be keyed.
    #[error("invalid fixture: {0}")]
    Invalid(#[from] MockError),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Everything a test registers with the double.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Transport configuration.
    #[serde(default)]
    pub config: TransportConfig,
    /// Expected subscriptions.
    #[serde(default)]
    pub subscriptions: Vec<MockedSubscription>,
    /// Expected single-shot requests.
    #[serde(default)]
    pub responses: Vec<MockedResponse>,
}

impl FixtureSet {
    /// Build a subscription transport (which also answers the responses).
    pub fn into_transport(self) -> Result<MockSubscriptionTransport, MockError> {
        MockSubscriptionTransport::with_config(self.subscriptions, self.responses, self.config)
    }

    /// Build a single-shot mock from the responses only.
    pub fn into_responses(self) -> Result<MockResponses, MockError> {
        MockResponses::with_marker(self.responses, &self.config.shape_marker)
    }
}

/// Thin service that serializes fixture sets and delegates storage to a
/// [`FixtureStore`].
pub struct FixtureService<S> {
    store: S,
}

impl<S> FixtureService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> FixtureService<S>
where
    S: FixtureStore,
{
    /// Load fixture set `name`. Returns `Ok(None)` if missing or empty.
    pub fn load(&self, name: &str) -> Result<Option<FixtureSet>, FixtureError> {
        match self.store.load_raw(name) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let set: FixtureSet = serde_json::from_slice(&bytes)?;
                debug!(
                    name,
                    subscriptions = set.subscriptions.len(),
                    responses = set.responses.len(),
                    "fixture set loaded"
                );
                Ok(Some(set))
            }
            Err(FixtureError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist fixture set `name`.
    pub fn save(&self, name: &str, set: &FixtureSet) -> Result<(), FixtureError> {
        let data = serde_json::to_vec_pretty(set)?;
        self.store.save_raw(name, &data)
    }

    /// Load fixture set `name` and build a transport from it.
    ///
    /// A missing fixture is an error here: a test asking for a transport
    /// cannot proceed without its registrations.
    pub fn transport(&self, name: &str) -> Result<MockSubscriptionTransport, FixtureError> {
        let set = self.load(name)?.ok_or(FixtureError::NotFound)?;
        Ok(set.into_transport()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MapStore(RefCell<BTreeMap<String, Vec<u8>>>);

    impl FixtureStore for MapStore {
        fn load_raw(&self, name: &str) -> Result<Vec<u8>, FixtureError> {
            self.0.borrow().get(name).cloned().ok_or(FixtureError::NotFound)
        }

        fn save_raw(&self, name: &str, data: &[u8]) -> Result<(), FixtureError> {
            self.0.borrow_mut().insert(name.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_fixture_loads_as_none() {
        let service = FixtureService::new(MapStore::default());
        assert!(service.load("absent").unwrap().is_none());
        assert!(matches!(
            service.transport("absent"),
            Err(FixtureError::NotFound)
        ));
    }

    #[test]
    fn empty_blob_loads_as_none() {
        let store = MapStore::default();
        store.save_raw("blank", b"").unwrap();
        let service = FixtureService::new(store);
        assert!(service.load("blank").unwrap().is_none());
    }

    #[test]
    fn garbage_blob_is_a_serde_error() {
        let store = MapStore::default();
        store.save_raw("bad", b"{not json").unwrap();
        let service = FixtureService::new(store);
        assert!(matches!(service.load("bad"), Err(FixtureError::Serde(_))));
    }

    #[test]
    fn default_set_builds_empty_transport() {
        let service = FixtureService::new(MapStore::default());
        service.save("empty", &FixtureSet::default()).unwrap();
        let transport = service.transport("empty").unwrap();
        assert!(transport.subscriptions_by_key().is_empty());
        assert_eq!(transport.responses().remaining(), 0);
    }
}
