//! Strategy framework.
//!
//! A strategy decides where and when an Interest (or Data answering one)
//! goes. Hooks do not call back into the forwarder; they return a list
//! of [`StrategyAction`]s which the forwarder executes after the hook
//! returns, so a hook sees a consistent snapshot of the tables.
//!
//! Strategies are chosen per name prefix through [`StrategyChoice`];
//! `find_effective` is a longest-prefix match with the default strategy
//! (best-route v2) installed at the root.

pub mod best_route;
pub mod random_wait;
pub mod suppression;

use std::time::Duration;

use nomen_core::{Data, FaceId, FaceScope, Interest, Nack, NackReason, Name};

use crate::cs::CsEntry;
use crate::error::StrategyError;
use crate::faces::FaceTable;
use crate::fib::{Fib, FibEntry};
use crate::nametree::NameTree;
use crate::pit::PitEntry;

pub use best_route::BestRouteStrategy;
pub use random_wait::RandomWaitStrategy;

/// Name prefix every strategy instance name lives under.
pub const STRATEGY_NAME_PREFIX: &str = "/localhost/nfd/strategy";

/// An instruction returned by a strategy hook for the forwarder to
/// carry out against the current PIT entry (and, for data actions, the
/// Data packet being processed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyAction {
    /// Send the pending Interest out of `out_face` now.
    SendInterest { out_face: FaceId },
    /// Schedule the pending Interest for relay on `out_face` after
    /// `delay`; reschedules cancel any prior relay.
    ScheduleInterestRelay { out_face: FaceId, delay: Duration },
    /// Schedule a retransmission on `out_face` after `delay`;
    /// reschedules cancel any prior retransmission.
    ScheduleInterestRetx { out_face: FaceId, delay: Duration },
    /// Send the current Data out of `out_face` now.
    SendData { out_face: FaceId },
    /// Schedule the current Data for relay on `out_face` after `delay`.
    ScheduleDataRelay { out_face: FaceId, delay: Duration },
    /// Send a Nack downstream on `out_face`.
    SendNack { out_face: FaceId, reason: NackReason },
    /// Give up on the entry: its expiry timer is set to fire now.
    Reject,
    /// Cancel the entry's pending Interest relay, if any.
    CancelInterestRelay,
    /// Cancel the pending Data relay of the current Data's cache entry.
    CancelDataRelay,
}

/// Read-only view of forwarder state passed to every hook.
pub struct StrategyContext<'a> {
    pub faces: &'a FaceTable,
    pub fib: &'a Fib,
    pub now: Duration,
}

impl StrategyContext<'_> {
    /// FIB lookup honoring the forwarding hint: with a hint present the
    /// first delegation with a routable entry wins, otherwise the
    /// Interest name is looked up directly.
    pub fn lookup_fib(&self, interest: &Interest) -> Option<&FibEntry> {
        if interest.forwarding_hint.is_empty() {
            return self.fib.lookup(&interest.name);
        }
        interest
            .forwarding_hint
            .iter()
            .find_map(|delegation| self.fib.lookup(delegation))
    }
}

/// Whether forwarding from `in_face` to `out_face` would leak a scoped
/// name outside its scope.
pub fn would_violate_scope(
    ctx: &StrategyContext<'_>,
    in_face: FaceId,
    interest: &Interest,
    out_face: FaceId,
) -> bool {
    let out_scope = ctx.faces.scope_of(out_face);
    if interest.name.is_localhost_scoped() {
        return out_scope != Some(FaceScope::Local);
    }
    if interest.name.is_localhop_scoped() {
        let in_scope = ctx.faces.scope_of(in_face);
        return out_scope != Some(FaceScope::Local) && in_scope != Some(FaceScope::Local);
    }
    false
}

/// Shared Nack handling: once every upstream has answered with a Nack,
/// forward the least severe reason to all downstreams and give up.
pub fn process_nack(
    ctx: &StrategyContext<'_>,
    entry: &mut PitEntry,
    _in_face: FaceId,
    _nack: &Nack,
) -> Vec<StrategyAction> {
    if entry.out_records().is_empty() || entry.has_pending_out_records(ctx.now) {
        return Vec::new();
    }
    let mut reasons = entry.out_records().iter().filter_map(|r| r.incoming_nack);
    let Some(first) = reasons.next() else {
        return Vec::new();
    };
    let reason = reasons.fold(first, |best, r| if r.is_less_severe(best) { r } else { best });

    let mut actions: Vec<StrategyAction> = entry
        .in_records()
        .iter()
        .map(|r| StrategyAction::SendNack {
            out_face: r.face,
            reason,
        })
        .collect();
    actions.push(StrategyAction::Reject);
    actions
}

/// Hook set implemented by every forwarding strategy.
pub trait Strategy {
    /// The versioned instance name.
    fn instance_name(&self) -> &Name;

    /// An Interest was accepted and missed the cache: decide where it
    /// goes.
    fn after_receive_interest(
        &mut self,
        ctx: &StrategyContext<'_>,
        in_face: FaceId,
        interest: &Interest,
        entry: &mut PitEntry,
    ) -> Vec<StrategyAction>;

    /// Data arrived satisfying a single PIT entry: decide which
    /// downstreams receive it and when.
    fn after_receive_data(
        &mut self,
        ctx: &StrategyContext<'_>,
        entry: &mut PitEntry,
        in_face: FaceId,
        data: &Data,
    ) -> Vec<StrategyAction>;

    /// A cached Data satisfied the Interest.
    fn after_content_store_hit(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _entry: &mut PitEntry,
        in_face: FaceId,
        _data: &Data,
    ) -> Vec<StrategyAction> {
        vec![StrategyAction::SendData { out_face: in_face }]
    }

    /// Observation hook before an entry is satisfied.
    fn before_satisfy_interest(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _entry: &mut PitEntry,
        _in_face: FaceId,
        _data: &Data,
    ) {
    }

    /// Observation hook before an unsatisfied entry expires.
    fn before_expire_pending_interest(&mut self, _ctx: &StrategyContext<'_>, _entry: &mut PitEntry) {
    }

    /// A Nack arrived on an upstream with a matching out-record.
    fn after_receive_nack(
        &mut self,
        ctx: &StrategyContext<'_>,
        in_face: FaceId,
        nack: &Nack,
        entry: &mut PitEntry,
    ) -> Vec<StrategyAction> {
        process_nack(ctx, entry, in_face, nack)
    }

    /// An Interest went out on a non-local hop; strategies that
    /// retransmit schedule it here.
    fn after_send_interest(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _entry: &mut PitEntry,
        _out_face: FaceId,
        _interest: &Interest,
    ) -> Vec<StrategyAction> {
        Vec::new()
    }

    /// A face refused an outgoing Interest, or retransmissions ran out.
    fn on_dropped_interest(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _out_face: FaceId,
        _interest: &Interest,
    ) {
    }

    /// A duplicate Interest was overheard on a broadcast face while a
    /// PIT entry is alive. Only relay-scheduling strategies react.
    fn on_loop_overheard(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _entry: &mut PitEntry,
    ) -> Vec<StrategyAction> {
        Vec::new()
    }

    /// Unsolicited Data arrived whose name has a cache entry. Only
    /// relay-scheduling strategies react.
    fn on_unsolicited_data(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _entry: &mut CsEntry,
        _data: &Data,
    ) -> Vec<StrategyAction> {
        Vec::new()
    }
}

/// Decomposed strategy instance name.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedInstanceName {
    /// The strategy id, e.g. `/localhost/nfd/strategy/best-route`.
    pub id: Name,
    pub version: Option<u64>,
    pub parameters: usize,
}

/// Split a configured instance name into id, version, and trailing
/// parameter count. `id_len` is the component count of the canonical id.
pub fn parse_instance_name(name: &Name, id_len: usize) -> Result<ParsedInstanceName, StrategyError> {
    let version = match name.get(id_len) {
        None => None,
        Some(component) => {
            let text = std::str::from_utf8(component.as_bytes())
                .map_err(|_| StrategyError::MalformedVersion)?;
            Some(
                text.parse::<u64>()
                    .map_err(|_| StrategyError::MalformedVersion)?,
            )
        }
    };
    let parameters = name.len().saturating_sub(id_len + usize::from(version.is_some()));
    Ok(ParsedInstanceName {
        id: name.prefix(id_len),
        version,
        parameters,
    })
}

/// Instantiate a strategy from its configured name.
pub fn create_strategy(name: &Name) -> Result<Box<dyn Strategy>, StrategyError> {
    let prefix = Name::from_uri(STRATEGY_NAME_PREFIX).expect("static name");
    if !prefix.is_prefix_of(name) {
        return Err(StrategyError::Unknown(name.to_string()));
    }
    let id = name.get(prefix.len()).map(|c| c.as_bytes().to_vec());
    match id.as_deref() {
        Some(b"best-route") => Ok(Box::new(BestRouteStrategy::new(name)?)),
        Some(b"random-wait") => Ok(Box::new(RandomWaitStrategy::new(name)?)),
        _ => Err(StrategyError::Unknown(name.to_string())),
    }
}

/// Prefix-to-strategy mapping with a guaranteed default at the root.
pub struct StrategyChoice {
    tree: NameTree<Box<dyn Strategy>>,
}

impl StrategyChoice {
    /// Build with `default` as the root (fallback) strategy.
    pub fn new(default: Box<dyn Strategy>) -> Self {
        let mut tree = NameTree::new();
        tree.insert(&Name::root(), default);
        Self { tree }
    }

    /// Choose `strategy` for names under `prefix`.
    pub fn set(&mut self, prefix: &Name, strategy: Box<dyn Strategy>) {
        self.tree.insert(prefix, strategy);
    }

    /// Remove the choice at `prefix`; the root choice cannot be
    /// removed.
    pub fn unset(&mut self, prefix: &Name) -> bool {
        if prefix.is_empty() {
            return false;
        }
        self.tree.remove(prefix).is_some()
    }

    /// The strategy responsible for `name` (longest prefix match).
    pub fn find_effective(&mut self, name: &Name) -> &mut dyn Strategy {
        self.tree
            .longest_prefix_match_mut(name)
            .expect("root strategy always present")
            .1
            .as_mut()
    }
}
