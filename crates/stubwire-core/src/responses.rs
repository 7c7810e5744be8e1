// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-shot request/response matching.
//!
//! Each registered response answers exactly one matching request, in
//! registration order. There is no clock here: a match answers immediately.

use crate::canonical::{canonical_key, CanonicalKey};
use crate::error::MockError;
use crate::mocks::{MockedResponse, Request};
use std::collections::{BTreeMap, VecDeque};
use stubwire_doc::TYPENAME_FIELD;
use tracing::{debug, trace};

/// Group `responses` by canonical key, preserving registration order.
pub fn build_response_map(
    responses: Vec<MockedResponse>,
    marker: &str,
) -> Result<BTreeMap<CanonicalKey, VecDeque<MockedResponse>>, MockError> {
    let mut by_key: BTreeMap<CanonicalKey, VecDeque<MockedResponse>> = BTreeMap::new();
    for response in responses {
        let key = canonical_key(&response.request, marker)?;
        by_key.entry(key).or_default().push_back(response);
    }
    Ok(by_key)
}

/// Single-shot mock: answers queries from scripted responses.
#[derive(Debug, Clone)]
pub struct MockResponses {
    shape_marker: String,
    responses_by_key: BTreeMap<CanonicalKey, VecDeque<MockedResponse>>,
}

impl Default for MockResponses {
    fn default() -> Self {
        Self {
            shape_marker: TYPENAME_FIELD.to_owned(),
            responses_by_key: BTreeMap::new(),
        }
    }
}

impl MockResponses {
    /// Build from `responses` using the default shape marker.
    pub fn new(responses: Vec<MockedResponse>) -> Result<Self, MockError> {
        Self::with_marker(responses, TYPENAME_FIELD)
    }

    /// Build from `responses` using `marker` for shape normalization.
    pub fn with_marker(responses: Vec<MockedResponse>, marker: &str) -> Result<Self, MockError> {
        let responses_by_key = build_response_map(responses, marker)?;
        debug!(keys = responses_by_key.len(), "mocked responses registered");
        Ok(Self {
            shape_marker: marker.to_owned(),
            responses_by_key,
        })
    }

    /// Register one more response. Returns its key.
    pub fn add(&mut self, response: MockedResponse) -> Result<CanonicalKey, MockError> {
        let key = canonical_key(&response.request, &self.shape_marker)?;
        self.responses_by_key
            .entry(key.clone())
            .or_default()
            .push_back(response);
        Ok(key)
    }

    /// Answer `request` with the next response registered for its key.
    ///
    /// The answer is immediate; any `delay_ms` on the outcome is ignored.
    /// A scripted error surfaces as [`MockError::Scripted`]. Each response is
    /// consumed; an unknown or drained key fails with
    /// [`MockError::NoMatchingMock`].
    pub fn query(&mut self, request: &Request) -> Result<Option<serde_json::Value>, MockError> {
        let key = canonical_key(request, &self.shape_marker)?;
        let response = self
            .responses_by_key
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let Some(response) = response else {
            debug!(key = %key.label(), "no mocked response left for request");
            return Err(MockError::NoMatchingMock { key });
        };
        if response.outcome.delay_ms > 0 {
            trace!(
                key = %key.label(),
                delay_ms = response.outcome.delay_ms,
                "single-shot responses ignore delay_ms"
            );
        }
        trace!(key = %key.label(), "answering mocked query");
        response.outcome.to_delivery().map_err(MockError::Scripted)
    }

    /// Remaining responses grouped by key.
    pub fn responses_by_key(&self) -> &BTreeMap<CanonicalKey, VecDeque<MockedResponse>> {
        &self.responses_by_key
    }

    /// Number of responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses_by_key.values().map(VecDeque::len).sum()
    }
}
