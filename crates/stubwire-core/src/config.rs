// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transport configuration.

use serde::{Deserialize, Serialize};
use stubwire_doc::TYPENAME_FIELD;

/// What happens to deliveries already scheduled when their subscription is
/// unsubscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InFlightPolicy {
    /// Scheduled deliveries still reach the handler; only new fires fail.
    #[default]
    Deliver,
    /// Scheduled deliveries are dropped silently.
    Suppress,
}

/// Knobs shared by the single-shot and subscription doubles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Field injected by shape normalization.
    pub shape_marker: String,
    /// Policy for deliveries in flight at unsubscribe time.
    pub in_flight_on_unsubscribe: InFlightPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            shape_marker: TYPENAME_FIELD.to_owned(),
            in_flight_on_unsubscribe: InFlightPolicy::Deliver,
        }
    }
}
