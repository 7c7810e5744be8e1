// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Simulated clock for deferred deliveries.
//!
//! Work is scheduled at `now + delay` and released in due order when the
//! owner advances virtual time. Entries with equal due times come out in the
//! order they were scheduled, which keeps equal-delay deliveries FIFO.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// Single-threaded virtual clock with a due-ordered queue of items.
pub struct Timeline<T> {
    now: Duration,
    next_seq: u64,
    pending: BinaryHeap<Reverse<Entry<T>>>,
}

struct Entry<T> {
    due: Duration,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timeline<T> {
    /// Empty timeline at virtual time zero.
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BinaryHeap::new(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of scheduled items not yet released.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Due time of the earliest scheduled item.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(entry)| entry.due)
    }

    /// Schedule `item` at `now + delay`. Returns the due time.
    pub fn schedule(&mut self, delay: Duration, item: T) -> Duration {
        let due = self.now.saturating_add(delay);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(Entry { due, seq, item }));
        due
    }

    /// Release the earliest item due at or before `horizon`.
    ///
    /// The clock moves to the released item's due time, so anything the
    /// caller schedules in response is measured from that instant.
    pub fn pop_due(&mut self, horizon: Duration) -> Option<T> {
        if self.next_due()? > horizon {
            return None;
        }
        let Reverse(entry) = self.pending.pop()?;
        self.now = self.now.max(entry.due);
        Some(entry.item)
    }

    /// Drop every scheduled item for which `keep` returns false.
    ///
    /// Returns how many items were dropped. The clock does not move.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.pending.len();
        self.pending.retain(|Reverse(entry)| keep(&entry.item));
        before - self.pending.len()
    }

    /// Move the clock forward to `instant` (never backwards).
    pub fn settle_at(&mut self, instant: Duration) {
        self.now = self.now.max(instant);
    }

    /// Advance by `by`, returning every item released in due order.
    pub fn advance(&mut self, by: Duration) -> Vec<T> {
        let horizon = self.now.saturating_add(by);
        let mut released = Vec::new();
        while let Some(item) = self.pop_due(horizon) {
            released.push(item);
        }
        self.settle_at(horizon);
        released
    }
}
