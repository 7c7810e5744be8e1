// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for stubwire crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`documents`] - Canned query documents (the user-info query, etc.)
//! - [`recorder`] - Handler that records every delivery for assertions
//! - [`registrations`] - Builders for mocked subscriptions and responses
//! - [`store`] - In-memory fixture store fake for testing without filesystem
//! - [`logging`] - Test-friendly tracing subscriber

pub mod documents;
pub mod logging;
pub mod recorder;
pub mod registrations;
pub mod store;

// Re-export commonly used items at crate root for convenience
pub use documents::{hello_query, user_info_query, user_info_request, user_subscription};
pub use logging::init_tracing;
pub use recorder::Recorder;
pub use registrations::{user_payload, ResponseBuilder, SubscriptionBuilder};
pub use store::InMemoryFixtureStore;
