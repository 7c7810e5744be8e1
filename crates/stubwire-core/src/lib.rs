// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic stand-in for a live GraphQL transport.
#![forbid(unsafe_code)]
//!
//! Tests register the requests they expect together with scripted outcomes.
//! At runtime the double keys every incoming request with the same
//! canonicalizer used at registration time and answers through the callback
//! contract a real transport would use. No I/O happens and time is simulated,
//! so delivery order is fully reproducible.
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request keys (document + variables)
//! - [`config`] - Transport configuration (shape marker, unsubscribe policy)
//! - [`error`] - Error kinds raised synchronously at the point of misuse
//! - [`fixtures`] - Fixture sets and the storage port used to load them
//! - [`mocks`] - Registration types (requests, outcomes, mocked entries)
//! - [`responses`] - Single-shot request/response matching
//! - [`subscriptions`] - Subscription engine with ordered, delayed delivery
//! - [`timeline`] - Simulated clock driving deferred deliveries

pub mod canonical;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod mocks;
pub mod responses;
pub mod subscriptions;
pub mod timeline;

pub use canonical::{canonical_key, CanonicalKey};
pub use config::{InFlightPolicy, TransportConfig};
pub use error::{MockError, ScriptedError};
pub use fixtures::{FixtureError, FixtureService, FixtureSet, FixtureStore};
pub use mocks::{Delivery, MockedResponse, MockedSubscription, Outcome, Request, Variables};
pub use responses::{build_response_map, MockResponses};
pub use subscriptions::{MockSubscriptionTransport, RegistrationGroup, SubscriptionId};
pub use timeline::Timeline;

pub use stubwire_doc as doc;
