// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Subscription engine.
//!
//! Registrations are grouped by canonical key at construction. `subscribe`
//! claims the next unclaimed registration of the request's group under a
//! fresh id; `fire_result` schedules that registration's next outcome on the
//! engine's [`Timeline`]; advancing the timeline hands due outcomes to the
//! subscription's handler.
//!
//! Lifecycle per id: `unregistered -> active -> retired`. Ids are allocated
//! from a per-engine counter starting at 0 and are never reused.
//!
//! Deliveries already scheduled when an id is retired follow
//! [`TransportConfig::in_flight_on_unsubscribe`].

use crate::canonical::{canonical_key, CanonicalKey};
use crate::config::{InFlightPolicy, TransportConfig};
use crate::error::MockError;
use crate::mocks::{Delivery, MockedResponse, MockedSubscription, Request};
use crate::responses::MockResponses;
use crate::timeline::Timeline;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Engine-assigned subscription identifier.
pub type SubscriptionId = u64;

type Handler = Box<dyn FnMut(Delivery)>;

/// Registrations sharing one canonical key, claimed front to back.
///
/// Claimed registrations stay in place; `claimed` is the cursor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrationGroup {
    registrations: Vec<MockedSubscription>,
    claimed: usize,
}

impl RegistrationGroup {
    /// All registrations in insertion order, claimed or not.
    pub fn registrations(&self) -> &[MockedSubscription] {
        &self.registrations
    }

    /// How many registrations have been claimed by `subscribe`.
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// How many registrations are still available.
    pub fn unclaimed(&self) -> usize {
        self.registrations.len() - self.claimed
    }

    fn claim(&mut self) -> Option<usize> {
        if self.claimed < self.registrations.len() {
            self.claimed += 1;
            Some(self.claimed - 1)
        } else {
            None
        }
    }
}

struct ActiveSubscription {
    key: CanonicalKey,
    slot: usize,
    cursor: usize,
}

struct PendingDelivery {
    id: SubscriptionId,
    delivery: Delivery,
}

#[derive(Default)]
struct HandlerSlot {
    handler: Option<Handler>,
    in_flight: usize,
}

/// Mock transport answering subscriptions (and single-shot queries) from
/// scripted registrations.
pub struct MockSubscriptionTransport {
    config: TransportConfig,
    responses: MockResponses,
    subscriptions_by_key: BTreeMap<CanonicalKey, RegistrationGroup>,
    active: BTreeMap<SubscriptionId, ActiveSubscription>,
    handlers: BTreeMap<SubscriptionId, HandlerSlot>,
    next_id: SubscriptionId,
    timeline: Timeline<PendingDelivery>,
}

impl MockSubscriptionTransport {
    /// Engine over `subscriptions` with default configuration.
    pub fn new(subscriptions: Vec<MockedSubscription>) -> Result<Self, MockError> {
        Self::with_config(subscriptions, Vec::new(), TransportConfig::default())
    }

    /// Engine over `subscriptions` that also answers `responses` via
    /// [`query`](Self::query).
    ///
    /// Only keys are computed here; empty outcome queues are accepted and
    /// reported when fired.
    pub fn with_config(
        subscriptions: Vec<MockedSubscription>,
        responses: Vec<MockedResponse>,
        config: TransportConfig,
    ) -> Result<Self, MockError> {
        let mut subscriptions_by_key: BTreeMap<CanonicalKey, RegistrationGroup> = BTreeMap::new();
        for sub in subscriptions {
            let key = canonical_key(&sub.request, &config.shape_marker)?;
            subscriptions_by_key
                .entry(key)
                .or_default()
                .registrations
                .push(sub);
        }
        let responses = MockResponses::with_marker(responses, &config.shape_marker)?;
        debug!(
            keys = subscriptions_by_key.len(),
            "mocked subscriptions registered"
        );
        Ok(Self {
            config,
            responses,
            subscriptions_by_key,
            active: BTreeMap::new(),
            handlers: BTreeMap::new(),
            next_id: 0,
            timeline: Timeline::new(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Canonical key this engine computes for `request`.
    pub fn key_for(&self, request: &Request) -> Result<CanonicalKey, MockError> {
        canonical_key(request, &self.config.shape_marker)
    }

    fn alloc_id(&mut self) -> SubscriptionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Claim the next registration matching `request` and bind `handler`.
    ///
    /// The handler is never invoked from inside this call.
    pub fn subscribe<F>(&mut self, request: &Request, handler: F) -> Result<SubscriptionId, MockError>
    where
        F: FnMut(Delivery) + 'static,
    {
        let key = self.key_for(request)?;
        let slot = self
            .subscriptions_by_key
            .get_mut(&key)
            .and_then(RegistrationGroup::claim);
        let Some(slot) = slot else {
            debug!(key = %key.label(), "no unclaimed subscription for request");
            return Err(MockError::NoMatchingMock { key });
        };
        let id = self.alloc_id();
        debug!(id, slot, key = %key.label(), "subscription claimed");
        self.active.insert(
            id,
            ActiveSubscription {
                key,
                slot,
                cursor: 0,
            },
        );
        self.handlers.insert(
            id,
            HandlerSlot {
                handler: Some(Box::new(handler)),
                in_flight: 0,
            },
        );
        Ok(id)
    }

    /// Like [`subscribe`](Self::subscribe) but deliveries arrive on a channel.
    pub fn subscribe_channel(
        &mut self,
        request: &Request,
    ) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<Delivery>), MockError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(request, move |delivery| {
            if tx.send(delivery).is_err() {
                trace!("subscription receiver dropped; delivery discarded");
            }
        })?;
        Ok((id, rx))
    }

    /// Schedule the next outcome of subscription `id`.
    ///
    /// Returns as soon as the delivery is queued; the handler runs once the
    /// outcome's delay has elapsed on the timeline.
    pub fn fire_result(&mut self, id: SubscriptionId) -> Result<(), MockError> {
        let active = self
            .active
            .get_mut(&id)
            .ok_or(MockError::UnknownSubscription(id))?;
        let registration = self
            .subscriptions_by_key
            .get(&active.key)
            .and_then(|group| group.registrations.get(active.slot))
            .ok_or(MockError::UnknownSubscription(id))?;
        let outcome = registration
            .results
            .get(active.cursor)
            .ok_or(MockError::ResultsExhausted {
                id,
                fired: active.cursor,
            })?;
        let delay = outcome.delay();
        let delivery = outcome.to_delivery();
        active.cursor += 1;

        let due = self
            .timeline
            .schedule(delay, PendingDelivery { id, delivery });
        self.handlers.entry(id).or_default().in_flight += 1;
        trace!(id, due = ?due, "result scheduled");
        Ok(())
    }

    /// Retire subscription `id`.
    ///
    /// Retiring an id that is not active fails with
    /// [`MockError::UnknownSubscription`].
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), MockError> {
        self.active
            .remove(&id)
            .ok_or(MockError::UnknownSubscription(id))?;
        if self.config.in_flight_on_unsubscribe == InFlightPolicy::Suppress {
            let dropped = self.timeline.retain(|pending| pending.id != id);
            if dropped > 0 {
                trace!(id, dropped, "in-flight deliveries suppressed");
            }
            self.handlers.remove(&id);
        } else if self.handlers.get(&id).is_some_and(|slot| slot.in_flight == 0) {
            self.handlers.remove(&id);
        }
        debug!(id, "subscription retired");
        Ok(())
    }

    /// Advance virtual time by `by`, running every delivery that falls due.
    ///
    /// Returns the number of handler invocations.
    pub fn advance(&mut self, by: Duration) -> usize {
        let horizon = self.timeline.now().saturating_add(by);
        self.advance_to(horizon)
    }

    /// Run every scheduled delivery, advancing time as far as needed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(due) = self.timeline.next_due() {
            delivered += self.advance_to(due);
        }
        delivered
    }

    fn advance_to(&mut self, horizon: Duration) -> usize {
        let mut delivered = 0;
        while let Some(pending) = self.timeline.pop_due(horizon) {
            if self.dispatch(pending) {
                delivered += 1;
            }
        }
        self.timeline.settle_at(horizon);
        delivered
    }

    fn dispatch(&mut self, pending: PendingDelivery) -> bool {
        let PendingDelivery { id, delivery } = pending;
        let retired = !self.active.contains_key(&id);
        let Some(slot) = self.handlers.get_mut(&id) else {
            trace!(id, "delivery suppressed after unsubscribe");
            return false;
        };
        slot.in_flight = slot.in_flight.saturating_sub(1);
        let delivered = match slot.handler.as_mut() {
            Some(handler) => {
                handler(delivery);
                true
            }
            None => false,
        };
        if retired && slot.in_flight == 0 {
            self.handlers.remove(&id);
        }
        trace!(id, now = ?self.timeline.now(), "result delivered");
        delivered
    }

    /// Answer a single-shot query from the attached responses.
    pub fn query(&mut self, request: &Request) -> Result<Option<serde_json::Value>, MockError> {
        self.responses.query(request)
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    /// Deliveries scheduled but not yet run.
    ///
    /// Deliveries suppressed by an unsubscribe are no longer counted.
    pub fn pending_deliveries(&self) -> usize {
        self.timeline.len()
    }

    /// Registration groups keyed by canonical key.
    pub fn subscriptions_by_key(&self) -> &BTreeMap<CanonicalKey, RegistrationGroup> {
        &self.subscriptions_by_key
    }

    /// Registration currently bound to active subscription `id`.
    pub fn subscription(&self, id: SubscriptionId) -> Option<&MockedSubscription> {
        let active = self.active.get(&id)?;
        self.subscriptions_by_key
            .get(&active.key)?
            .registrations
            .get(active.slot)
    }

    /// Outcomes already fired for active subscription `id`.
    pub fn fired(&self, id: SubscriptionId) -> Option<usize> {
        self.active.get(&id).map(|active| active.cursor)
    }

    /// Ids currently active, ascending.
    pub fn active_ids(&self) -> Vec<SubscriptionId> {
        self.active.keys().copied().collect()
    }

    /// Single-shot responses attached to this transport.
    pub fn responses(&self) -> &MockResponses {
        &self.responses
    }

    /// Remaining single-shot responses grouped by key.
    pub fn responses_by_key(&self) -> &BTreeMap<CanonicalKey, VecDeque<MockedResponse>> {
        self.responses.responses_by_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::Outcome;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use stubwire_doc::{Document, Field, OperationDefinition, OperationKind};

    fn ticks() -> Request {
        Request::new(Document::operation(
            OperationDefinition::new(OperationKind::Subscription, Some("Ticks"))
                .select(Field::new("tick")),
        ))
    }

    fn recorder() -> (Rc<RefCell<Vec<Delivery>>>, impl FnMut(Delivery) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |d| sink.borrow_mut().push(d))
    }

    #[test]
    fn ids_start_at_zero_and_increase() {
        let sub = MockedSubscription::new(ticks(), 9).result(Outcome::data(json!(1)));
        let mut engine = MockSubscriptionTransport::new(vec![sub.clone(), sub]).unwrap();
        assert_eq!(engine.subscribe(&ticks(), |_| {}).unwrap(), 0);
        assert_eq!(engine.subscribe(&ticks(), |_| {}).unwrap(), 1);
        assert_eq!(engine.active_ids(), vec![0, 1]);
    }

    #[test]
    fn handler_is_not_called_synchronously() {
        let sub = MockedSubscription::new(ticks(), 0).result(Outcome::data(json!(1)));
        let mut engine = MockSubscriptionTransport::new(vec![sub]).unwrap();
        let (seen, handler) = recorder();
        let id = engine.subscribe(&ticks(), handler).unwrap();
        engine.fire_result(id).unwrap();
        assert!(seen.borrow().is_empty());
        assert_eq!(engine.pending_deliveries(), 1);
        assert_eq!(engine.advance(Duration::ZERO), 1);
        assert_eq!(*seen.borrow(), vec![Ok(Some(json!(1)))]);
    }

    #[test]
    fn shorter_delay_overtakes_earlier_fire() {
        let sub = MockedSubscription::new(ticks(), 0)
            .result(Outcome::data(json!("slow")).delayed(30))
            .result(Outcome::data(json!("fast")).delayed(10));
        let mut engine = MockSubscriptionTransport::new(vec![sub]).unwrap();
        let (seen, handler) = recorder();
        let id = engine.subscribe(&ticks(), handler).unwrap();
        engine.fire_result(id).unwrap();
        engine.fire_result(id).unwrap();
        assert_eq!(engine.run_until_idle(), 2);
        assert_eq!(
            *seen.borrow(),
            vec![Ok(Some(json!("fast"))), Ok(Some(json!("slow")))]
        );
        assert_eq!(engine.now(), Duration::from_millis(30));
    }

    #[test]
    fn in_flight_delivery_survives_unsubscribe_by_default() {
        let sub = MockedSubscription::new(ticks(), 0).result(Outcome::data(json!(1)).delayed(5));
        let mut engine = MockSubscriptionTransport::new(vec![sub]).unwrap();
        let (seen, handler) = recorder();
        let id = engine.subscribe(&ticks(), handler).unwrap();
        engine.fire_result(id).unwrap();
        engine.unsubscribe(id).unwrap();
        assert_eq!(engine.run_until_idle(), 1);
        assert_eq!(seen.borrow().len(), 1);
        assert!(engine.handlers.is_empty());
    }

    #[test]
    fn suppress_policy_drops_in_flight_delivery() {
        let sub = MockedSubscription::new(ticks(), 0).result(Outcome::data(json!(1)).delayed(5));
        let config = TransportConfig {
            in_flight_on_unsubscribe: InFlightPolicy::Suppress,
            ..TransportConfig::default()
        };
        let mut engine =
            MockSubscriptionTransport::with_config(vec![sub], Vec::new(), config).unwrap();
        let (seen, handler) = recorder();
        let id = engine.subscribe(&ticks(), handler).unwrap();
        engine.fire_result(id).unwrap();
        engine.unsubscribe(id).unwrap();
        assert_eq!(engine.run_until_idle(), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn suppressed_deliveries_leave_the_queue() {
        let sub = MockedSubscription::new(ticks(), 0)
            .result(Outcome::data(json!(1)).delayed(5))
            .result(Outcome::data(json!(2)).delayed(5));
        let other = MockedSubscription::new(ticks(), 1).result(Outcome::data(json!(3)).delayed(5));
        let config = TransportConfig {
            in_flight_on_unsubscribe: InFlightPolicy::Suppress,
            ..TransportConfig::default()
        };
        let mut engine =
            MockSubscriptionTransport::with_config(vec![sub, other], Vec::new(), config).unwrap();
        let (seen, handler) = recorder();
        let gone = engine.subscribe(&ticks(), |_| {}).unwrap();
        let kept = engine.subscribe(&ticks(), handler).unwrap();
        engine.fire_result(gone).unwrap();
        engine.fire_result(gone).unwrap();
        engine.fire_result(kept).unwrap();
        assert_eq!(engine.pending_deliveries(), 3);

        engine.unsubscribe(gone).unwrap();
        assert_eq!(engine.pending_deliveries(), 1);
        assert_eq!(engine.run_until_idle(), 1);
        assert_eq!(*seen.borrow(), vec![Ok(Some(json!(3)))]);
    }

    #[test]
    fn unsubscribe_twice_fails() {
        let sub = MockedSubscription::new(ticks(), 0);
        let mut engine = MockSubscriptionTransport::new(vec![sub]).unwrap();
        let id = engine.subscribe(&ticks(), |_| {}).unwrap();
        engine.unsubscribe(id).unwrap();
        assert_eq!(
            engine.unsubscribe(id),
            Err(MockError::UnknownSubscription(id))
        );
    }

    #[test]
    fn scripted_error_reaches_handler() {
        let sub = MockedSubscription::new(ticks(), 0).result(Outcome::failure("socket closed"));
        let mut engine = MockSubscriptionTransport::new(vec![sub]).unwrap();
        let (seen, handler) = recorder();
        let id = engine.subscribe(&ticks(), handler).unwrap();
        engine.fire_result(id).unwrap();
        engine.run_until_idle();
        assert_eq!(
            *seen.borrow(),
            vec![Err(crate::ScriptedError::new("socket closed"))]
        );
    }

    #[test]
    fn claimed_registrations_stay_visible() {
        let sub = MockedSubscription::new(ticks(), 3).result(Outcome::data(json!(1)));
        let mut engine = MockSubscriptionTransport::new(vec![sub.clone()]).unwrap();
        let id = engine.subscribe(&ticks(), |_| {}).unwrap();
        let group = engine.subscriptions_by_key().values().next().unwrap();
        assert_eq!(group.registrations(), &[sub.clone()]);
        assert_eq!(group.claimed(), 1);
        assert_eq!(group.unclaimed(), 0);
        assert_eq!(engine.subscription(id), Some(&sub));
        assert_eq!(engine.fired(id), Some(0));
    }
}
