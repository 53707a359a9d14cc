//! Timer scheduler for the forwarding pipelines.
//!
//! The scheduler is an injected handle, not a process singleton: the
//! forwarder schedules against an explicit `now`, and whoever drives the
//! event loop (the node harness, or a test with virtual time) decides
//! when that clock advances.
//!
//! Events never capture table entries; they carry only names and face
//! ids, and the entry is looked up again when the timer fires. A missing
//! entry at fire time is a silent drop. Cancellation is idempotent and
//! safe on fired or unknown tokens. Events with equal deadlines fire in
//! insertion order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use nomen_core::{FaceId, Name};

/// Handle to a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// What to do when a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Finalize the PIT entry for `name`.
    InterestExpiry { name: Name },
    /// Scheduled (random-wait) relay of the pending Interest for `name`.
    InterestRelay { name: Name, out_face: FaceId },
    /// Scheduled retransmission of the pending Interest for `name`.
    InterestRetx { name: Name, out_face: FaceId },
    /// Scheduled relay of the cached Data under `name`.
    DataRelay { name: Name, out_face: FaceId },
}

#[derive(PartialEq, Eq)]
struct Slot {
    deadline: Duration,
    seq: u64,
    token: TimerToken,
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Deadline-ordered timer queue.
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Slot>>,
    pending: HashMap<TimerToken, TimerEvent>,
    next_token: u64,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            next_token: 1,
            next_seq: 0,
        }
    }

    /// Schedule `event` to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, event: TimerEvent) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(token, event);
        self.heap.push(Reverse(Slot {
            deadline: now + delay,
            seq,
            token,
        }));
        token
    }

    /// Cancel a scheduled event. A no-op for fired or unknown tokens.
    pub fn cancel(&mut self, token: TimerToken) {
        self.pending.remove(&token);
    }

    /// Pop the next event whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerEvent> {
        while let Some(Reverse(slot)) = self.heap.peek() {
            if slot.deadline > now {
                return None;
            }
            let token = slot.token;
            self.heap.pop();
            if let Some(event) = self.pending.remove(&token) {
                return Some(event);
            }
            // cancelled; keep draining
        }
        None
    }

    /// Deadline of the earliest live event, if any. Lazily discards
    /// cancelled heap slots.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        while let Some(Reverse(slot)) = self.heap.peek() {
            if self.pending.contains_key(&slot.token) {
                return Some(slot.deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Number of live (not yet fired, not cancelled) events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
