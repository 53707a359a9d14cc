//! Forwarding Information Base.
//!
//! Maps name prefixes to ordered next-hop lists. Route origination is
//! outside the forwarding core; the FIB only stores what it is given.

use nomen_core::{FaceId, Name};

use crate::nametree::NameTree;

/// One next hop of a FIB entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextHop {
    pub face: FaceId,
    pub cost: u64,
}

/// A FIB entry: a prefix and its next hops, cheapest first.
#[derive(Debug, Clone)]
pub struct FibEntry {
    prefix: Name,
    next_hops: Vec<NextHop>,
}

impl FibEntry {
    fn new(prefix: Name) -> Self {
        Self {
            prefix,
            next_hops: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    /// Next hops ordered by ascending cost.
    pub fn next_hops(&self) -> &[NextHop] {
        &self.next_hops
    }

    pub fn has_next_hops(&self) -> bool {
        !self.next_hops.is_empty()
    }

    fn add_or_update_next_hop(&mut self, face: FaceId, cost: u64) {
        if let Some(hop) = self.next_hops.iter_mut().find(|h| h.face == face) {
            hop.cost = cost;
        } else {
            self.next_hops.push(NextHop { face, cost });
        }
        self.next_hops.sort_by_key(|h| h.cost);
    }

    fn remove_next_hop(&mut self, face: FaceId) -> bool {
        let before = self.next_hops.len();
        self.next_hops.retain(|h| h.face != face);
        self.next_hops.len() != before
    }
}

/// The FIB: prefix -> next hops over the name-tree backbone.
pub struct Fib {
    tree: NameTree<FibEntry>,
}

impl Fib {
    pub fn new() -> Self {
        Self {
            tree: NameTree::new(),
        }
    }

    /// Add or update a next hop under `prefix`.
    pub fn insert(&mut self, prefix: &Name, face: FaceId, cost: u64) {
        match self.tree.get_mut(prefix) {
            Some(entry) => entry.add_or_update_next_hop(face, cost),
            None => {
                let mut entry = FibEntry::new(prefix.clone());
                entry.add_or_update_next_hop(face, cost);
                self.tree.insert(prefix, entry);
            }
        }
    }

    /// Remove one next hop; the entry is dropped when its last hop goes.
    pub fn remove_next_hop(&mut self, prefix: &Name, face: FaceId) -> bool {
        let Some(entry) = self.tree.get_mut(prefix) else {
            return false;
        };
        let removed = entry.remove_next_hop(face);
        if !entry.has_next_hops() {
            self.tree.remove(prefix);
        }
        removed
    }

    /// Longest-prefix-match lookup.
    #[must_use]
    pub fn lookup(&self, name: &Name) -> Option<&FibEntry> {
        self.tree.longest_prefix_match(name).map(|(_, e)| e)
    }

    /// Exact-prefix lookup.
    #[must_use]
    pub fn get(&self, prefix: &Name) -> Option<&FibEntry> {
        self.tree.get(prefix)
    }

    /// Erase every next hop through a removed face.
    pub fn remove_face(&mut self, face: FaceId) {
        self.tree.retain(|entry| {
            entry.remove_next_hop(face);
            entry.has_next_hops()
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

impl Default for Fib {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[test]
    fn test_insert_orders_by_cost() {
        let mut fib = Fib::new();
        fib.insert(&name("/a"), FaceId(300), 20);
        fib.insert(&name("/a"), FaceId(301), 5);
        fib.insert(&name("/a"), FaceId(302), 10);

        let hops: Vec<FaceId> = fib
            .get(&name("/a"))
            .unwrap()
            .next_hops()
            .iter()
            .map(|h| h.face)
            .collect();
        assert_eq!(hops, vec![FaceId(301), FaceId(302), FaceId(300)]);
    }

    #[test]
    fn test_update_existing_hop_reorders() {
        let mut fib = Fib::new();
        fib.insert(&name("/a"), FaceId(300), 1);
        fib.insert(&name("/a"), FaceId(301), 2);
        fib.insert(&name("/a"), FaceId(300), 9);

        let entry = fib.get(&name("/a")).unwrap();
        assert_eq!(entry.next_hops().len(), 2);
        assert_eq!(entry.next_hops()[0].face, FaceId(301));
    }

    #[test]
    fn test_longest_prefix_lookup() {
        let mut fib = Fib::new();
        fib.insert(&name("/a"), FaceId(300), 1);
        fib.insert(&name("/a/b"), FaceId(301), 1);

        assert_eq!(
            fib.lookup(&name("/a/b/c")).unwrap().prefix(),
            &name("/a/b")
        );
        assert_eq!(fib.lookup(&name("/a/x")).unwrap().prefix(), &name("/a"));
        assert!(fib.lookup(&name("/z")).is_none());
    }

    #[test]
    fn test_entry_dropped_with_last_hop() {
        let mut fib = Fib::new();
        fib.insert(&name("/a"), FaceId(300), 1);
        assert!(fib.remove_next_hop(&name("/a"), FaceId(300)));
        assert!(fib.is_empty());
        assert!(!fib.remove_next_hop(&name("/a"), FaceId(300)));
    }

    #[test]
    fn test_remove_face_cleans_all_prefixes() {
        let mut fib = Fib::new();
        fib.insert(&name("/a"), FaceId(300), 1);
        fib.insert(&name("/a"), FaceId(301), 2);
        fib.insert(&name("/b"), FaceId(300), 1);

        fib.remove_face(FaceId(300));
        assert_eq!(fib.len(), 1);
        assert_eq!(fib.get(&name("/a")).unwrap().next_hops().len(), 1);
        assert!(fib.get(&name("/b")).is_none());
    }
}
