//! Bounded duplicate-nonce memory.
//!
//! One structure backs both the Dead Nonce List (loop detection for
//! Interests after their PIT entries are gone) and the data nonce list
//! (emergency-flood de-duplication). Entries age out after a configured
//! lifetime and the list is additionally capped in size, evicting FIFO.
//! Age eviction is amortized: expired entries are purged on insertion.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use nomen_core::Name;

/// Default entry lifetime.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(6);

/// Default size cap.
pub const DEFAULT_CAPACITY: usize = 65536;

/// Bounded memory of recently observed (name, nonce) pairs.
pub struct NonceList {
    lifetime: Duration,
    capacity: usize,
    queue: VecDeque<(Name, u32, Duration)>,
    set: HashSet<(Name, u32)>,
}

impl NonceList {
    pub fn new(lifetime: Duration, capacity: usize) -> Self {
        Self {
            lifetime,
            capacity,
            queue: VecDeque::new(),
            set: HashSet::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_LIFETIME, DEFAULT_CAPACITY)
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Whether (name, nonce) is remembered.
    #[must_use]
    pub fn has(&self, name: &Name, nonce: u32) -> bool {
        self.set.contains(&(name.clone(), nonce))
    }

    /// Remember (name, nonce), evicting expired and overflow entries.
    pub fn add(&mut self, name: &Name, nonce: u32, now: Duration) {
        self.evict_expired(now);
        let key = (name.clone(), nonce);
        if self.set.insert(key.clone()) {
            self.queue.push_back((key.0, key.1, now + self.lifetime));
        }
        while self.queue.len() > self.capacity {
            if let Some((n, x, _)) = self.queue.pop_front() {
                self.set.remove(&(n, x));
            }
        }
    }

    /// Drop entries whose lifetime has elapsed.
    pub fn evict_expired(&mut self, now: Duration) {
        while let Some((_, _, expires)) = self.queue.front() {
            if *expires > now {
                break;
            }
            let (n, x, _) = self.queue.pop_front().expect("front exists");
            self.set.remove(&(n, x));
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    const T0: Duration = Duration::ZERO;

    #[test]
    fn test_add_and_has() {
        let mut list = NonceList::with_defaults();
        assert!(!list.has(&name("/a"), 0x55));
        list.add(&name("/a"), 0x55, T0);
        assert!(list.has(&name("/a"), 0x55));
        assert!(!list.has(&name("/a"), 0x56));
        assert!(!list.has(&name("/b"), 0x55));
    }

    #[test]
    fn test_duplicate_add_does_not_grow() {
        let mut list = NonceList::with_defaults();
        list.add(&name("/a"), 1, T0);
        list.add(&name("/a"), 1, T0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_age_eviction() {
        let mut list = NonceList::new(Duration::from_secs(6), 100);
        list.add(&name("/a"), 1, T0);
        list.add(&name("/b"), 2, Duration::from_secs(3));

        // at t=6s the first entry expires, the second survives
        list.evict_expired(Duration::from_secs(6));
        assert!(!list.has(&name("/a"), 1));
        assert!(list.has(&name("/b"), 2));
    }

    #[test]
    fn test_eviction_amortized_on_add() {
        let mut list = NonceList::new(Duration::from_secs(6), 100);
        list.add(&name("/a"), 1, T0);
        list.add(&name("/c"), 3, Duration::from_secs(7));
        assert!(!list.has(&name("/a"), 1));
        assert!(list.has(&name("/c"), 3));
    }

    #[test]
    fn test_size_cap_evicts_fifo() {
        let mut list = NonceList::new(Duration::from_secs(600), 3);
        for i in 0..5u32 {
            list.add(&name("/x"), i, T0);
        }
        assert_eq!(list.len(), 3);
        assert!(!list.has(&name("/x"), 0));
        assert!(!list.has(&name("/x"), 1));
        assert!(list.has(&name("/x"), 4));
    }
}
