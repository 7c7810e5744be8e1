// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error kinds for the mock transport.
//!
//! Every variant is returned synchronously by the call that misused the
//! double. Nothing is routed through the delayed delivery path, so a broken
//! fixture fails the test at the line that exercised it.

use crate::canonical::CanonicalKey;
use crate::subscriptions::SubscriptionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use stubwire_doc::DocumentError;
use thiserror::Error;

/// Error type for mock transport operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MockError {
    /// The request document could not be printed, so it has no key.
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] DocumentError),
    /// No registration (or no unclaimed registration) exists for the key.
    #[error("no mock registered for request (key {})", .key.label())]
    NoMatchingMock {
        /// Key computed for the unmatched request.
        key: CanonicalKey,
    },
    /// The id was never issued or has already been unsubscribed.
    #[error("no active subscription with id {0}")]
    UnknownSubscription(SubscriptionId),
    /// Fired more often than the registration has outcomes.
    #[error("subscription {id} has no results left to fire ({fired} already fired)")]
    ResultsExhausted {
        /// Subscription that was fired.
        id: SubscriptionId,
        /// Outcomes already scheduled for this subscription.
        fired: usize,
    },
    /// A single-shot registration scripted this failure.
    #[error("scripted failure: {0}")]
    Scripted(ScriptedError),
}

/// Failure scripted into a fixture in place of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedError {
    /// Human readable message delivered to the caller.
    pub message: String,
}

impl ScriptedError {
    /// Create a scripted error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ScriptedError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_id() {
        assert_eq!(
            MockError::UnknownSubscription(4).to_string(),
            "no active subscription with id 4"
        );
        assert_eq!(
            MockError::ResultsExhausted { id: 0, fired: 4 }.to_string(),
            "subscription 0 has no results left to fire (4 already fired)"
        );
    }

    #[test]
    fn document_errors_convert_to_malformed_request() {
        let err: MockError = DocumentError::Empty.into();
        assert!(matches!(err, MockError::MalformedRequest(DocumentError::Empty)));
    }
}
