// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builders for mocked subscriptions and responses.

use serde_json::json;
use stubwire_core::{MockedResponse, MockedSubscription, Outcome, Request};

/// `{"data": {"user": {"name": <name>}}}`.
pub fn user_payload(name: &str) -> serde_json::Value {
    json!({"data": {"user": {"name": name}}})
}

/// Builder for creating [`MockedSubscription`] instances in tests.
///
/// # Example
///
/// ```
/// use stubwire_dry_tests::{user_info_request, SubscriptionBuilder};
///
/// let sub = SubscriptionBuilder::new(user_info_request("Changping Chen"))
///     .declared_id(0)
///     .user_result("Dhaivat Pandya", 50)
///     .user_result("Vyacheslav Kim", 50)
///     .build();
///
/// assert_eq!(sub.results.len(), 2);
/// assert_eq!(sub.results[0].delay_ms, 50);
/// ```
pub struct SubscriptionBuilder {
    request: Request,
    declared_id: u64,
    results: Vec<Outcome>,
}

impl SubscriptionBuilder {
    /// Start a registration for `request` (declared id 0, no results).
    pub fn new(request: Request) -> Self {
        Self {
            request,
            declared_id: 0,
            results: Vec::new(),
        }
    }

    /// Set the caller-declared id.
    pub fn declared_id(mut self, id: u64) -> Self {
        self.declared_id = id;
        self
    }

    /// Append an arbitrary outcome.
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.results.push(outcome);
        self
    }

    /// Append a successful outcome.
    pub fn result(self, payload: serde_json::Value, delay_ms: u64) -> Self {
        self.outcome(Outcome::data(payload).delayed(delay_ms))
    }

    /// Append a [`user_payload`] outcome.
    pub fn user_result(self, name: &str, delay_ms: u64) -> Self {
        self.result(user_payload(name), delay_ms)
    }

    /// Append a scripted failure.
    pub fn failure(self, message: &str, delay_ms: u64) -> Self {
        self.outcome(Outcome::failure(message).delayed(delay_ms))
    }

    /// Build the registration.
    pub fn build(self) -> MockedSubscription {
        MockedSubscription {
            request: self.request,
            declared_id: self.declared_id,
            results: self.results,
        }
    }
}

/// Builder for creating [`MockedResponse`] instances in tests.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stubwire_dry_tests::{hello_query, ResponseBuilder};
/// use stubwire_core::Request;
///
/// let resp = ResponseBuilder::new(Request::new(hello_query()))
///     .data(json!({"data": {"hello": "world"}}))
///     .build();
///
/// assert!(resp.outcome.error.is_none());
/// ```
pub struct ResponseBuilder {
    request: Request,
    outcome: Outcome,
}

impl ResponseBuilder {
    /// Start a response for `request` (empty payload).
    pub fn new(request: Request) -> Self {
        Self {
            request,
            outcome: Outcome::default(),
        }
    }

    /// Answer with `payload`.
    pub fn data(mut self, payload: serde_json::Value) -> Self {
        self.outcome.result = Some(payload);
        self
    }

    /// Answer with a scripted failure.
    pub fn failure(mut self, message: &str) -> Self {
        self.outcome = Outcome::failure(message);
        self
    }

    /// Build the registration.
    pub fn build(self) -> MockedResponse {
        MockedResponse::new(self.request, self.outcome)
    }
}
