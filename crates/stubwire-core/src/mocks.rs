// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registration types: requests, scripted outcomes and mocked entries.
//!
//! All types are serde-friendly so that fixture sets can be stored as JSON
//! (see [`crate::fixtures`]).

use crate::canonical::{canonical_key, CanonicalKey};
use crate::error::{MockError, ScriptedError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use stubwire_doc::Document;

/// Variable bindings. Ordered so that iteration is deterministic.
pub type Variables = BTreeMap<String, serde_json::Value>;

/// What a handler receives for one delivered outcome.
///
/// Exactly one side is populated: either a success payload (possibly absent)
/// or the scripted error.
pub type Delivery = Result<Option<serde_json::Value>, ScriptedError>;

/// A request as issued by a client: document, variables and whether the
/// client applies shape normalization before sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Parsed query document.
    pub query: Document,
    /// Bound variables.
    #[serde(default)]
    pub variables: Variables,
    /// Apply shape normalization before keying.
    #[serde(default, alias = "add_typename")]
    pub normalize_shape: bool,
}

impl Request {
    /// Request with no variables and no shape normalization.
    pub fn new(query: Document) -> Self {
        Self {
            query,
            variables: Variables::new(),
            normalize_shape: false,
        }
    }

    /// Bind a variable.
    pub fn variable(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.variables.insert(name.to_owned(), value.into());
        self
    }

    /// Enable or disable shape normalization.
    pub fn with_shape_normalization(mut self, enabled: bool) -> Self {
        self.normalize_shape = enabled;
        self
    }

    /// Canonical key of this request using `marker` for shape normalization.
    pub fn key(&self, marker: &str) -> Result<CanonicalKey, MockError> {
        canonical_key(self, marker)
    }
}

/// One scripted result: payload or error, delivered after `delay_ms`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outcome {
    /// Success payload (usually `{"data": ...}`).
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Scripted failure; wins over `result` when both are set.
    #[serde(default)]
    pub error: Option<ScriptedError>,
    /// Delay in milliseconds between firing and delivery.
    #[serde(default)]
    pub delay_ms: u64,
}

impl Outcome {
    /// Successful outcome carrying `payload`.
    pub fn data(payload: serde_json::Value) -> Self {
        Self {
            result: Some(payload),
            ..Self::default()
        }
    }

    /// Failing outcome carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(ScriptedError::new(message)),
            ..Self::default()
        }
    }

    /// Set the delivery delay.
    pub fn delayed(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Delivery delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// What a handler receives for this outcome.
    pub fn to_delivery(&self) -> Delivery {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.result.clone()),
        }
    }
}

/// Expected subscription request with its queue of outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockedSubscription {
    /// Request the subscription must match.
    pub request: Request,
    /// Caller-assigned id. Informational only: the engine assigns its own.
    #[serde(rename = "id", default)]
    pub declared_id: u64,
    /// Outcomes in delivery order. May be empty; firing then fails.
    #[serde(default)]
    pub results: Vec<Outcome>,
}

impl MockedSubscription {
    /// Registration for `request` with no outcomes yet.
    pub fn new(request: Request, declared_id: u64) -> Self {
        Self {
            request,
            declared_id,
            results: Vec::new(),
        }
    }

    /// Append an outcome to the queue.
    pub fn result(mut self, outcome: Outcome) -> Self {
        self.results.push(outcome);
        self
    }
}

/// Expected single-shot request with its outcome.
///
/// The single-shot variant has no clock: `delay_ms` is accepted so that
/// outcomes share one shape, but the answer is returned immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockedResponse {
    /// Request the response must match.
    pub request: Request,
    /// Scripted answer.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl MockedResponse {
    /// Pair `request` with `outcome`.
    pub fn new(request: Request, outcome: Outcome) -> Self {
        Self { request, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_wins_over_payload() {
        let outcome = Outcome {
            result: Some(json!({"data": 1})),
            error: Some(ScriptedError::new("boom")),
            delay_ms: 0,
        };
        assert_eq!(outcome.to_delivery(), Err(ScriptedError::new("boom")));
    }

    #[test]
    fn absent_payload_delivers_none() {
        assert_eq!(Outcome::default().to_delivery(), Ok(None));
    }

    #[test]
    fn subscription_without_results_deserializes_with_empty_queue() {
        let raw = json!({
            "request": {
                "query": {"definitions": [{
                    "kind": "Operation",
                    "operation": "subscription",
                    "selection_set": [{"kind": "Field", "name": "ticks"}]
                }]}
            },
            "id": 7
        });
        let sub: MockedSubscription = serde_json::from_value(raw).unwrap();
        assert_eq!(sub.declared_id, 7);
        assert!(sub.results.is_empty());
        assert!(!sub.request.normalize_shape);
    }

    #[test]
    fn response_outcome_is_flattened() {
        let raw = json!({
            "request": {
                "query": {"definitions": [{
                    "kind": "Operation",
                    "operation": "query",
                    "selection_set": [{"kind": "Field", "name": "hello"}]
                }]},
                "add_typename": true
            },
            "result": {"data": {"hello": "world"}},
            "delay_ms": 5
        });
        let resp: MockedResponse = serde_json::from_value(raw).unwrap();
        assert!(resp.request.normalize_shape);
        assert_eq!(resp.outcome.delay(), Duration::from_millis(5));
        assert_eq!(
            resp.outcome.to_delivery(),
            Ok(Some(json!({"data": {"hello": "world"}})))
        );
    }
}
