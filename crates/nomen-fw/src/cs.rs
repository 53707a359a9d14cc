//! Content Store.
//!
//! A bounded cache of Data packets keyed by exact name; reinsertion
//! overwrites. Eviction is LRU and synchronous on insert. Each entry can
//! carry a scheduled data-relay timer; eviction hands the cancelled
//! tokens back to the caller so the scheduler stays consistent.

use std::collections::VecDeque;
use std::time::Duration;

use nomen_core::{Data, Interest, Name};

use crate::nametree::NameTree;
use crate::scheduler::TimerToken;

/// Default cache capacity in entries.
pub const DEFAULT_CAPACITY: usize = 4096;

/// One cached Data packet.
pub struct CsEntry {
    pub data: Data,
    pub inserted_at: Duration,
    pub is_unsolicited: bool,
    pub relay_timer: Option<TimerToken>,
    pub relay_deadline: Option<Duration>,
}

impl CsEntry {
    /// Whether the entry still satisfies MustBeFresh Interests.
    pub fn is_fresh(&self, now: Duration) -> bool {
        now < self.inserted_at + self.data.freshness_period
    }

    /// Whether a scheduled data relay has not yet fired.
    pub fn is_relay_pending(&self, now: Duration) -> bool {
        self.relay_timer.is_some() && self.relay_deadline.is_some_and(|d| d > now)
    }
}

/// Bounded LRU cache of Data packets.
pub struct ContentStore {
    tree: NameTree<CsEntry>,
    lru: VecDeque<Name>,
    capacity: usize,
}

impl ContentStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: NameTree::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert `data`, overwriting any entry of the same name and
    /// evicting the least recently used entries past capacity. Returns
    /// the relay-timer tokens of displaced entries; the caller must
    /// cancel them.
    pub fn insert(&mut self, data: Data, is_unsolicited: bool, now: Duration) -> Vec<TimerToken> {
        let mut cancelled = Vec::new();
        let name = data.name.clone();

        if let Some(old) = self.tree.insert(
            &name,
            CsEntry {
                data,
                inserted_at: now,
                is_unsolicited,
                relay_timer: None,
                relay_deadline: None,
            },
        ) {
            cancelled.extend(old.relay_timer);
            self.lru.retain(|n| n != &name);
        }
        self.lru.push_back(name);

        while self.tree.len() > self.capacity {
            let Some(victim) = self.lru.pop_front() else {
                break;
            };
            if let Some(entry) = self.tree.remove(&victim) {
                cancelled.extend(entry.relay_timer);
            }
        }
        cancelled
    }

    /// Look up a Data packet matching `interest`: the first cached name
    /// under the Interest name, honoring MustBeFresh. A hit refreshes
    /// the entry's LRU position.
    pub fn lookup(&mut self, interest: &Interest, now: Duration) -> Option<&CsEntry> {
        let must_be_fresh = interest.must_be_fresh;
        let found = self
            .tree
            .find_descendant(&interest.name, |entry| {
                !must_be_fresh || entry.is_fresh(now)
            })?
            .data
            .name
            .clone();

        self.lru.retain(|n| n != &found);
        self.lru.push_back(found.clone());
        self.tree.get(&found)
    }

    /// Exact-name access to an entry, for relay-timer bookkeeping.
    pub fn find_mut(&mut self, name: &Name) -> Option<&mut CsEntry> {
        self.tree.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &Name) -> bool {
        self.tree.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
