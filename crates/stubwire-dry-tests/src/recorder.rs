// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Handler that records deliveries for later assertions.

use std::cell::RefCell;
use std::rc::Rc;
use stubwire_core::Delivery;

/// Shared log of deliveries. Clones share the same log.
///
/// # Example
///
/// ```
/// use stubwire_dry_tests::Recorder;
///
/// let rec = Recorder::new();
/// let mut handler = rec.handler();
/// handler(Ok(None));
/// assert_eq!(rec.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Rc<RefCell<Vec<Delivery>>>,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler closure that appends to this recorder.
    pub fn handler(&self) -> impl FnMut(Delivery) + 'static {
        let seen = Rc::clone(&self.seen);
        move |delivery| seen.borrow_mut().push(delivery)
    }

    /// Snapshot of everything delivered so far.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.seen.borrow().clone()
    }

    /// Success payloads delivered so far (errors and empty payloads skipped).
    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|d| d.as_ref().ok().cloned().flatten())
            .collect()
    }

    /// Number of deliveries recorded.
    pub fn len(&self) -> usize {
        self.seen.borrow().len()
    }

    /// True when nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.seen.borrow().is_empty()
    }
}
