//! Pending Interest Table.
//!
//! A PIT entry tracks where an Interest came from (in-records), where it
//! was sent (out-records), and three independent timers: whole-entry
//! expiry, the scheduled random-wait relay, and the scheduled
//! retransmission. Timer tokens live on the entry; the deadlines are
//! kept alongside so "has this timer fired yet" is answerable without
//! asking the scheduler.

use std::collections::HashMap;
use std::time::Duration;

use nomen_core::{FaceId, Interest, LinkType, Name, NackReason};

use crate::nametree::NameTree;
use crate::scheduler::TimerToken;

/// Downstream record: a face the Interest arrived on.
#[derive(Debug, Clone)]
pub struct InRecord {
    pub face: FaceId,
    /// The last Interest received on this face.
    pub interest: Interest,
    pub last_nonce: u32,
    pub expiry: Duration,
}

/// Upstream record: a face the Interest was sent out on.
#[derive(Debug, Clone)]
pub struct OutRecord {
    pub face: FaceId,
    pub last_nonce: u32,
    pub expiry: Duration,
    /// When this record was last created or refreshed; the base of the
    /// retransmission-suppression window.
    pub last_renewed: Duration,
    pub incoming_nack: Option<NackReason>,
}

/// One pending Interest.
pub struct PitEntry {
    name: Name,
    interest: Interest,
    in_records: Vec<InRecord>,
    out_records: Vec<OutRecord>,
    pub is_satisfied: bool,
    pub data_freshness_period: Duration,

    pub expiry_timer: Option<TimerToken>,
    pub relay_timer: Option<TimerToken>,
    pub relay_deadline: Option<Duration>,
    pub retx_timer: Option<TimerToken>,
    pub retx_deadline: Option<Duration>,
    pub retx_count: u32,

    /// Per-upstream suppression intervals, owned by the strategy.
    pub suppression_intervals: HashMap<FaceId, Duration>,
}

impl PitEntry {
    fn new(interest: Interest) -> Self {
        Self {
            name: interest.name.clone(),
            interest,
            in_records: Vec::new(),
            out_records: Vec::new(),
            is_satisfied: false,
            data_freshness_period: Duration::ZERO,
            expiry_timer: None,
            relay_timer: None,
            relay_deadline: None,
            retx_timer: None,
            retx_deadline: None,
            retx_count: 0,
            suppression_intervals: HashMap::new(),
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The Interest this entry was created for.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    // --- in-records ---

    pub fn in_records(&self) -> &[InRecord] {
        &self.in_records
    }

    pub fn has_in_records(&self) -> bool {
        !self.in_records.is_empty()
    }

    pub fn in_record(&self, face: FaceId) -> Option<&InRecord> {
        self.in_records.iter().find(|r| r.face == face)
    }

    /// Insert or refresh the in-record for `face`. A new Interest on
    /// the same face with a new nonce updates in place.
    pub fn insert_or_update_in_record(&mut self, face: FaceId, interest: Interest, now: Duration) {
        let expiry = now + interest.lifetime;
        match self.in_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.last_nonce = interest.nonce;
                record.expiry = expiry;
                record.interest = interest;
            }
            None => self.in_records.push(InRecord {
                face,
                last_nonce: interest.nonce,
                expiry,
                interest,
            }),
        }
    }

    pub fn delete_in_record(&mut self, face: FaceId) {
        self.in_records.retain(|r| r.face != face);
    }

    pub fn clear_in_records(&mut self) {
        self.in_records.clear();
    }

    /// Faces of in-records that have not yet expired.
    pub fn live_in_record_faces(&self, now: Duration) -> Vec<FaceId> {
        self.in_records
            .iter()
            .filter(|r| r.expiry > now)
            .map(|r| r.face)
            .collect()
    }

    pub fn has_live_in_records(&self, now: Duration) -> bool {
        self.in_records.iter().any(|r| r.expiry > now)
    }

    /// The latest in-record expiry; the whole-entry expiry timer fires
    /// at or after this instant.
    pub fn max_in_record_expiry(&self) -> Option<Duration> {
        self.in_records.iter().map(|r| r.expiry).max()
    }

    // --- out-records ---

    pub fn out_records(&self) -> &[OutRecord] {
        &self.out_records
    }

    pub fn out_record(&self, face: FaceId) -> Option<&OutRecord> {
        self.out_records.iter().find(|r| r.face == face)
    }

    pub fn out_record_mut(&mut self, face: FaceId) -> Option<&mut OutRecord> {
        self.out_records.iter_mut().find(|r| r.face == face)
    }

    pub fn insert_or_update_out_record(
        &mut self,
        face: FaceId,
        nonce: u32,
        now: Duration,
        expiry: Duration,
    ) {
        match self.out_records.iter_mut().find(|r| r.face == face) {
            Some(record) => {
                record.last_nonce = nonce;
                record.expiry = expiry;
                record.last_renewed = now;
                record.incoming_nack = None;
            }
            None => self.out_records.push(OutRecord {
                face,
                last_nonce: nonce,
                expiry,
                last_renewed: now,
                incoming_nack: None,
            }),
        }
    }

    pub fn delete_out_record(&mut self, face: FaceId) {
        self.out_records.retain(|r| r.face != face);
    }

    /// Whether any upstream is still awaited: an unexpired out-record
    /// that has not been nacked.
    pub fn has_pending_out_records(&self, now: Duration) -> bool {
        self.out_records
            .iter()
            .any(|r| r.expiry > now && r.incoming_nack.is_none())
    }

    // --- timer state ---

    /// Whether a scheduled relay has not yet fired.
    pub fn is_relay_pending(&self, now: Duration) -> bool {
        self.relay_timer.is_some() && self.relay_deadline.is_some_and(|d| d > now)
    }

    /// Whether a scheduled retransmission has not yet fired.
    pub fn is_retx_pending(&self, now: Duration) -> bool {
        self.retx_timer.is_some() && self.retx_deadline.is_some_and(|d| d > now)
    }
}

/// Where a duplicate nonce was found within a PIT entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DuplicateNonce {
    /// The same face already carried this nonce (honest retransmission
    /// on point-to-point links).
    pub in_same: bool,
    /// Another face's in-record carried this nonce.
    pub in_other: bool,
    /// An out-record carried this nonce (the Interest came back).
    pub out: bool,
}

impl DuplicateNonce {
    pub fn any(&self) -> bool {
        self.in_same || self.in_other || self.out
    }

    /// Loop classification by link type. On point-to-point faces a
    /// duplicate involving the same face's in-record is an honest
    /// retransmission, never a loop.
    pub fn is_loop_for(&self, link_type: LinkType) -> bool {
        match link_type {
            LinkType::PointToPoint => self.any() && !self.in_same,
            LinkType::MultiAccess | LinkType::AdHoc => self.any(),
        }
    }
}

/// Classify where `nonce` already appears in `entry` relative to
/// `in_face`.
pub fn find_duplicate_nonce(entry: &PitEntry, nonce: u32, in_face: FaceId) -> DuplicateNonce {
    let mut result = DuplicateNonce::default();
    for record in entry.in_records() {
        if record.last_nonce == nonce {
            if record.face == in_face {
                result.in_same = true;
            } else {
                result.in_other = true;
            }
        }
    }
    result.out = entry.out_records().iter().any(|r| r.last_nonce == nonce);
    result
}

/// The PIT: pending entries keyed by Interest name.
pub struct Pit {
    tree: NameTree<PitEntry>,
}

impl Pit {
    pub fn new() -> Self {
        Self {
            tree: NameTree::new(),
        }
    }

    /// Find the entry for `interest`, creating it if absent. Returns
    /// the entry and whether it was just created.
    pub fn insert(&mut self, interest: &Interest) -> (&mut PitEntry, bool) {
        let name = interest.name.clone();
        let created = self.tree.get(&name).is_none();
        if created {
            self.tree.insert(&name, PitEntry::new(interest.clone()));
        }
        (self.tree.get_mut(&name).expect("just inserted"), created)
    }

    #[must_use]
    pub fn find(&self, name: &Name) -> Option<&PitEntry> {
        self.tree.get(name)
    }

    pub fn find_mut(&mut self, name: &Name) -> Option<&mut PitEntry> {
        self.tree.get_mut(name)
    }

    pub fn remove(&mut self, name: &Name) -> Option<PitEntry> {
        self.tree.remove(name)
    }

    /// Names of every entry a Data packet satisfies: all entries whose
    /// name is a prefix of the data name.
    pub fn find_all_data_matches(&self, data_name: &Name) -> Vec<Name> {
        self.tree
            .values_along(data_name)
            .into_iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Erase every record naming a removed face. Entries left without
    /// in-records are finalized by their expiry timers.
    pub fn remove_face(&mut self, face: FaceId) {
        self.tree.for_each_mut(|entry| {
            entry.delete_in_record(face);
            entry.delete_out_record(face);
            entry.suppression_intervals.remove(&face);
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

impl Default for Pit {
    fn default() -> Self {
        Self::new()
    }
}
