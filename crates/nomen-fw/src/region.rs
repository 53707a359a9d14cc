//! Network region table.
//!
//! Holds the producer-region names this node belongs to. An Interest's
//! forwarding hint is stripped once it reaches any of its hinted
//! regions, so the hint stops steering it from there on.

use std::collections::BTreeSet;

use nomen_core::Name;

/// The set of producer regions this node is part of.
#[derive(Default)]
pub struct NetworkRegionTable {
    regions: BTreeSet<Name>,
}

impl NetworkRegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, region: Name) {
        self.regions.insert(region);
    }

    pub fn remove(&mut self, region: &Name) -> bool {
        self.regions.remove(region)
    }

    /// Whether any hint delegation names a region this node is in: a
    /// delegation matches when it is a prefix of one of our regions.
    #[must_use]
    pub fn is_in_producer_region(&self, forwarding_hint: &[Name]) -> bool {
        forwarding_hint
            .iter()
            .any(|delegation| self.regions.iter().any(|r| delegation.is_prefix_of(r)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
