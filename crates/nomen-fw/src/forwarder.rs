//! The forwarder: pipelines wiring faces, tables, and strategies.
//!
//! Every entry point takes an explicit `now`; pipelines run to
//! completion and future work goes through the scheduler. Strategy hooks
//! return action lists which [`Forwarder::execute_actions`] carries out,
//! so hooks observe a consistent table snapshot.
//!
//! Timer callbacks re-acquire their PIT or CS entry by name; an entry
//! that disappeared in the meantime makes the callback a silent drop.

use std::collections::BTreeSet;
use std::time::Duration;

use nomen_core::{
    Data, EmergencyInd, FaceId, FaceScope, Interest, LinkType, Nack, NackReason, Name,
    FACEID_CONTENT_STORE,
};

use crate::cs::{self, ContentStore};
use crate::error::{FaceTableError, StrategyError};
use crate::faces::FaceTable;
use crate::fib::Fib;
use crate::nonce_list::NonceList;
use crate::pit::{find_duplicate_nonce, Pit};
use crate::region::NetworkRegionTable;
use crate::scheduler::{Scheduler, TimerEvent};
use crate::strategy::{
    best_route, create_strategy, BestRouteStrategy, Strategy, StrategyAction, StrategyChoice,
    StrategyContext,
};

/// Observable packet and table counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub n_in_interests: u64,
    pub n_out_interests: u64,
    pub n_in_data: u64,
    pub n_out_data: u64,
    pub n_in_nacks: u64,
    pub n_out_nacks: u64,
    pub n_cs_hits: u64,
    pub n_cs_misses: u64,
    pub n_satisfied_interests: u64,
    pub n_unsatisfied_interests: u64,
}

/// What to do with Data nobody asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsolicitedDataDecision {
    Drop,
    Cache,
}

/// Policy consulted by the unsolicited-Data pipeline.
pub trait UnsolicitedDataPolicy {
    fn decide(&self, in_face_scope: FaceScope, data: &Data) -> UnsolicitedDataDecision;
}

/// Default policy: cache only what arrives on local faces.
pub struct DefaultUnsolicitedDataPolicy;

impl UnsolicitedDataPolicy for DefaultUnsolicitedDataPolicy {
    fn decide(&self, in_face_scope: FaceScope, _data: &Data) -> UnsolicitedDataDecision {
        match in_face_scope {
            FaceScope::Local => UnsolicitedDataDecision::Cache,
            FaceScope::NonLocal => UnsolicitedDataDecision::Drop,
        }
    }
}

/// Forwarder construction parameters.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub cs_capacity: usize,
    pub dead_nonce_lifetime: Duration,
    pub data_nonce_lifetime: Duration,
    pub nonce_list_capacity: usize,
    /// Tag outgoing Interests with the common-control-channel bit.
    pub tag_outgoing_cch: bool,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            cs_capacity: cs::DEFAULT_CAPACITY,
            dead_nonce_lifetime: crate::nonce_list::DEFAULT_LIFETIME,
            data_nonce_lifetime: crate::nonce_list::DEFAULT_LIFETIME,
            nonce_list_capacity: crate::nonce_list::DEFAULT_CAPACITY,
            tag_outgoing_cch: false,
        }
    }
}

/// The forwarding core: owns faces, tables, strategies, and timers.
pub struct Forwarder {
    config: ForwarderConfig,
    faces: FaceTable,
    fib: Fib,
    pit: Pit,
    cs: ContentStore,
    dead_nonce_list: NonceList,
    data_nonce_list: NonceList,
    region_table: NetworkRegionTable,
    strategy_choice: StrategyChoice,
    scheduler: Scheduler,
    counters: Counters,
    unsolicited_policy: Box<dyn UnsolicitedDataPolicy>,
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Self {
        let default_strategy = BestRouteStrategy::new(&best_route::strategy_name())
            .expect("default strategy name is valid");
        Self {
            faces: FaceTable::new(),
            fib: Fib::new(),
            pit: Pit::new(),
            cs: ContentStore::new(config.cs_capacity),
            dead_nonce_list: NonceList::new(
                config.dead_nonce_lifetime,
                config.nonce_list_capacity,
            ),
            data_nonce_list: NonceList::new(
                config.data_nonce_lifetime,
                config.nonce_list_capacity,
            ),
            region_table: NetworkRegionTable::new(),
            strategy_choice: StrategyChoice::new(Box::new(default_strategy)),
            scheduler: Scheduler::new(),
            counters: Counters::default(),
            unsolicited_policy: Box::new(DefaultUnsolicitedDataPolicy),
            config,
        }
    }

    // --- wiring ---

    pub fn add_face(&mut self, face: Box<dyn nomen_core::Face>) -> Result<FaceId, FaceTableError> {
        self.faces.insert(face)
    }

    /// The next unused face id above the reserved range.
    pub fn next_face_id(&self) -> FaceId {
        self.faces.next_face_id()
    }

    /// Remove a face and erase every FIB and PIT record naming it. Any
    /// timer that later fires for a cleaned entry drops silently.
    pub fn remove_face(&mut self, id: FaceId) -> Option<Box<dyn nomen_core::Face>> {
        self.fib.remove_face(id);
        self.pit.remove_face(id);
        self.faces.remove(id)
    }

    pub fn add_route(&mut self, prefix: &Name, face: FaceId, cost: u64) {
        self.fib.insert(prefix, face, cost);
    }

    pub fn add_region(&mut self, region: Name) {
        self.region_table.add(region);
    }

    pub fn set_strategy(&mut self, prefix: &Name, strategy: Box<dyn Strategy>) {
        self.strategy_choice.set(prefix, strategy);
    }

    /// Choose a strategy for `prefix` by instance name.
    pub fn choose_strategy(
        &mut self,
        prefix: &Name,
        strategy_name: &Name,
    ) -> Result<(), StrategyError> {
        let strategy = create_strategy(strategy_name)?;
        self.strategy_choice.set(prefix, strategy);
        Ok(())
    }

    pub fn set_unsolicited_data_policy(&mut self, policy: Box<dyn UnsolicitedDataPolicy>) {
        self.unsolicited_policy = policy;
    }

    // --- observation ---

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn pit(&self) -> &Pit {
        &self.pit
    }

    pub fn content_store_mut(&mut self) -> &mut ContentStore {
        &mut self.cs
    }

    pub fn dead_nonce_list(&self) -> &NonceList {
        &self.dead_nonce_list
    }

    /// Deadline of the earliest scheduled timer.
    pub fn next_timer_deadline(&mut self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    // --- timer pump ---

    /// Fire every timer due at `now`.
    pub fn poll_timers(&mut self, now: Duration) {
        while let Some(event) = self.scheduler.pop_due(now) {
            match event {
                TimerEvent::InterestExpiry { name } => self.on_interest_finalize(now, &name),
                TimerEvent::InterestRelay { name, out_face } => {
                    let Some(entry) = self.pit.find_mut(&name) else {
                        continue;
                    };
                    entry.relay_timer = None;
                    entry.relay_deadline = None;
                    let interest = entry.interest().clone();
                    self.on_outgoing_interest(now, &name, out_face, &interest);
                }
                TimerEvent::InterestRetx { name, out_face } => {
                    let Some(entry) = self.pit.find_mut(&name) else {
                        continue;
                    };
                    entry.retx_timer = None;
                    entry.retx_deadline = None;
                    if !entry.has_live_in_records(now) {
                        tracing::debug!(interest = %name, "no live downstream, retransmission abandoned");
                        continue;
                    }
                    let interest = entry.interest().clone();
                    self.on_outgoing_interest(now, &name, out_face, &interest);
                }
                TimerEvent::DataRelay { name, out_face } => {
                    let Some(entry) = self.cs.find_mut(&name) else {
                        continue;
                    };
                    entry.relay_timer = None;
                    entry.relay_deadline = None;
                    let data = entry.data.clone();
                    self.on_outgoing_data(now, &data, out_face);
                }
            }
        }
    }

    // --- incoming Interest pipeline ---

    pub fn handle_incoming_interest(&mut self, now: Duration, in_face: FaceId, interest: Interest) {
        self.counters.n_in_interests += 1;
        let Some((scope, link_type)) = self.faces.get(in_face).map(|f| (f.scope(), f.link_type()))
        else {
            tracing::debug!(%in_face, "interest from unknown face");
            return;
        };
        let mut interest = interest;
        interest.incoming_face = Some(in_face);
        tracing::debug!(
            %in_face, interest = %interest.name, nonce = interest.nonce,
            "incoming interest"
        );

        if scope == FaceScope::NonLocal && interest.name.is_localhost_scoped() {
            tracing::debug!(%in_face, interest = %interest.name, "violates /localhost");
            return;
        }

        if self.dead_nonce_list.has(&interest.name, interest.nonce) {
            return self.on_interest_loop(now, in_face, link_type, interest);
        }

        if !interest.forwarding_hint.is_empty()
            && self
                .region_table
                .is_in_producer_region(&interest.forwarding_hint)
        {
            tracing::debug!(interest = %interest.name, "reaching producer region, hint stripped");
            interest = interest.without_forwarding_hint();
        }

        let (had_in_records, is_loop) = {
            let (entry, _) = self.pit.insert(&interest);
            let duplicate = find_duplicate_nonce(entry, interest.nonce, in_face);
            (entry.has_in_records(), duplicate.is_loop_for(link_type))
        };
        if is_loop {
            return self.on_interest_loop(now, in_face, link_type, interest);
        }

        if !had_in_records {
            let hit = self.cs.lookup(&interest, now).map(|e| e.data.clone());
            match hit {
                Some(mut data) => {
                    data.incoming_face = Some(FACEID_CONTENT_STORE);
                    self.on_cs_hit(now, in_face, &interest, data);
                }
                None => self.on_cs_miss(now, in_face, interest),
            }
        } else {
            // a fresh nonce refreshed a live entry: any scheduled relay
            // or retransmission is for the previous round
            {
                let Self { pit, scheduler, .. } = self;
                let entry = pit.find_mut(&interest.name).expect("entry just inserted");
                if let Some(token) = entry.relay_timer.take() {
                    tracing::debug!(interest = %interest.name, "cancelling scheduled relay (new nonce)");
                    scheduler.cancel(token);
                }
                entry.relay_deadline = None;
                if let Some(token) = entry.retx_timer.take() {
                    tracing::debug!(interest = %interest.name, "cancelling scheduled retransmission (new nonce)");
                    scheduler.cancel(token);
                }
                entry.retx_deadline = None;
                entry.retx_count = 0;
            }
            self.on_cs_miss(now, in_face, interest);
        }
    }

    fn on_interest_loop(
        &mut self,
        now: Duration,
        in_face: FaceId,
        link_type: LinkType,
        interest: Interest,
    ) {
        if link_type != LinkType::PointToPoint {
            // a Duplicate-Nack on a broadcast link would storm; let the
            // strategy react (random-wait cancels its scheduled relay)
            tracing::debug!(%in_face, interest = %interest.name, "looped interest on broadcast face");
            let name = interest.name.clone();
            let actions = {
                let Self {
                    pit,
                    strategy_choice,
                    faces,
                    fib,
                    ..
                } = self;
                match pit.find_mut(&name) {
                    Some(entry) => {
                        let ctx = StrategyContext {
                            faces,
                            fib,
                            now,
                        };
                        strategy_choice.find_effective(&name).on_loop_overheard(&ctx, entry)
                    }
                    None => {
                        tracing::debug!(interest = %name, "pit entry gone, looped interest dropped");
                        Vec::new()
                    }
                }
            };
            self.execute_actions(now, &name, None, None, actions);
            return;
        }

        tracing::debug!(%in_face, interest = %interest.name, "send-nack-duplicate");
        // sent directly: the outgoing-Nack pipeline needs an in-record
        let nack = Nack::new(interest, NackReason::Duplicate);
        if let Some(face) = self.faces.get_mut(in_face) {
            let _ = face.send_nack(&nack);
        }
    }

    fn on_cs_miss(&mut self, now: Duration, in_face: FaceId, interest: Interest) {
        self.counters.n_cs_misses += 1;
        tracing::debug!(interest = %interest.name, "content store miss");
        let name = interest.name.clone();

        let expiry_delay = {
            let Some(entry) = self.pit.find_mut(&name) else {
                return;
            };
            entry.insert_or_update_in_record(in_face, interest.clone(), now);
            entry
                .max_in_record_expiry()
                .map(|e| e.saturating_sub(now))
                .unwrap_or_default()
        };
        self.set_expiry_timer(now, &name, expiry_delay);

        if let Some(next_hop) = interest.next_hop_face {
            // a privileged app chose the upstream; strategy is bypassed
            if self.faces.contains(next_hop) {
                tracing::debug!(interest = %name, %next_hop, "forwarding to chosen next hop");
                self.on_outgoing_interest(now, &name, next_hop, &interest);
            }
            return;
        }

        let actions = {
            let Self {
                pit,
                strategy_choice,
                faces,
                fib,
                ..
            } = self;
            let Some(entry) = pit.find_mut(&name) else {
                return;
            };
            let ctx = StrategyContext {
                faces,
                fib,
                now,
            };
            strategy_choice
                .find_effective(&name)
                .after_receive_interest(&ctx, in_face, &interest, entry)
        };
        self.execute_actions(now, &name, None, Some(&interest), actions);
    }

    fn on_cs_hit(&mut self, now: Duration, in_face: FaceId, interest: &Interest, data: Data) {
        self.counters.n_cs_hits += 1;
        tracing::debug!(interest = %interest.name, "content store hit");
        let name = interest.name.clone();

        {
            let Some(entry) = self.pit.find_mut(&name) else {
                return;
            };
            entry.is_satisfied = true;
            entry.data_freshness_period = data.freshness_period;
        }
        self.set_expiry_timer(now, &name, Duration::ZERO);

        let actions = {
            let Self {
                pit,
                strategy_choice,
                faces,
                fib,
                ..
            } = self;
            let Some(entry) = pit.find_mut(&name) else {
                return;
            };
            let ctx = StrategyContext {
                faces,
                fib,
                now,
            };
            let strategy = strategy_choice.find_effective(&name);
            strategy.before_satisfy_interest(&ctx, entry, FACEID_CONTENT_STORE, &data);
            strategy.after_content_store_hit(&ctx, entry, in_face, &data)
        };
        self.execute_actions(now, &name, Some(&data), None, actions);
    }

    // --- outgoing Interest pipeline ---

    fn on_outgoing_interest(
        &mut self,
        now: Duration,
        name: &Name,
        out_face: FaceId,
        interest: &Interest,
    ) {
        let mut interest = interest.clone();
        if self.config.tag_outgoing_cch {
            interest.cch = true;
        }

        let send_failed = {
            let Self {
                pit,
                faces,
                counters,
                ..
            } = self;
            let Some(entry) = pit.find_mut(name) else {
                tracing::debug!(interest = %name, "pit entry gone, outgoing interest dropped");
                return;
            };
            tracing::debug!(
                %out_face, interest = %name, nonce = interest.nonce,
                "outgoing interest"
            );
            entry.insert_or_update_out_record(
                out_face,
                interest.nonce,
                now,
                now + interest.lifetime,
            );
            let Some(face) = faces.get_mut(out_face) else {
                tracing::debug!(%out_face, "outgoing interest on unknown face");
                return;
            };
            match face.send_interest(&interest) {
                Ok(()) => {
                    counters.n_out_interests += 1;
                    false
                }
                Err(err) => {
                    tracing::debug!(%out_face, %err, interest = %name, "face refused interest");
                    true
                }
            }
        };
        if send_failed {
            return self.handle_dropped_interest(now, out_face, &interest);
        }

        // a hop with neither end local may warrant retransmission
        let actions = {
            let Self {
                pit,
                strategy_choice,
                faces,
                fib,
                ..
            } = self;
            let Some(entry) = pit.find_mut(name) else {
                return;
            };
            let Some(first_in) = entry.in_records().first().map(|r| r.face) else {
                return;
            };
            let non_local_hop = faces.scope_of(first_in) != Some(FaceScope::Local)
                && faces.scope_of(out_face) != Some(FaceScope::Local);
            if !non_local_hop {
                return;
            }
            let ctx = StrategyContext {
                faces,
                fib,
                now,
            };
            strategy_choice
                .find_effective(name)
                .after_send_interest(&ctx, entry, out_face, &interest)
        };
        self.execute_actions(now, name, None, Some(&interest), actions);
    }

    /// A face refused an outgoing Interest, or a strategy exhausted its
    /// retransmission budget; the effective strategy decides what to do.
    pub fn handle_dropped_interest(&mut self, now: Duration, out_face: FaceId, interest: &Interest) {
        let Self {
            strategy_choice,
            faces,
            fib,
            ..
        } = self;
        let ctx = StrategyContext {
            faces,
            fib,
            now,
        };
        strategy_choice
            .find_effective(&interest.name)
            .on_dropped_interest(&ctx, out_face, interest);
    }

    // --- Interest finalize ---

    fn on_interest_finalize(&mut self, now: Duration, name: &Name) {
        {
            let Self {
                pit,
                strategy_choice,
                faces,
                fib,
                ..
            } = self;
            let Some(entry) = pit.find_mut(name) else {
                return;
            };
            tracing::debug!(
                interest = %name,
                satisfied = entry.is_satisfied,
                "interest finalize"
            );
            if !entry.is_satisfied {
                let ctx = StrategyContext {
                    faces,
                    fib,
                    now,
                };
                strategy_choice
                    .find_effective(name)
                    .before_expire_pending_interest(&ctx, entry);
            }
        }

        self.insert_dead_nonce_list(now, name, None);

        let Self {
            pit,
            scheduler,
            counters,
            ..
        } = self;
        let Some(entry) = pit.remove(name) else {
            return;
        };
        if entry.is_satisfied {
            counters.n_satisfied_interests += 1;
        } else {
            counters.n_unsatisfied_interests += 1;
        }
        for token in [entry.expiry_timer, entry.relay_timer, entry.retx_timer]
            .into_iter()
            .flatten()
        {
            scheduler.cancel(token);
        }
    }

    /// Insert out-record nonces into the Dead Nonce List when the entry
    /// warrants it: always for unsatisfied entries, and for satisfied
    /// MustBeFresh entries whose data goes stale before the list would
    /// have forgotten the nonce.
    fn insert_dead_nonce_list(&mut self, now: Duration, name: &Name, upstream: Option<FaceId>) {
        let Self {
            pit,
            dead_nonce_list,
            ..
        } = self;
        let Some(entry) = pit.find(name) else {
            return;
        };
        let needed = if entry.is_satisfied {
            entry.interest().must_be_fresh
                && entry.data_freshness_period < dead_nonce_list.lifetime()
        } else {
            true
        };
        if !needed {
            return;
        }
        match upstream {
            None => {
                for record in entry.out_records() {
                    dead_nonce_list.add(name, record.last_nonce, now);
                }
            }
            Some(face) => {
                if let Some(record) = entry.out_record(face) {
                    dead_nonce_list.add(name, record.last_nonce, now);
                }
            }
        }
    }

    // --- incoming Data pipeline ---

    pub fn handle_incoming_data(&mut self, now: Duration, in_face: FaceId, data: Data) {
        self.counters.n_in_data += 1;
        let Some((scope, link_type)) = self.faces.get(in_face).map(|f| (f.scope(), f.link_type()))
        else {
            tracing::debug!(%in_face, "data from unknown face");
            return;
        };
        let mut data = data;
        data.incoming_face = Some(in_face);
        tracing::debug!(%in_face, data = %data.name, "incoming data");

        if scope == FaceScope::NonLocal && data.name.is_localhost_scoped() {
            tracing::debug!(%in_face, data = %data.name, "violates /localhost");
            return;
        }

        if data.emergency == EmergencyInd::Emergency {
            return self.on_data_emergency(now, in_face, data);
        }

        let matches = self.pit.find_all_data_matches(&data.name);
        if matches.is_empty() {
            return self.on_data_unsolicited(now, in_face, data);
        }

        for token in self.cs.insert(data.without_hop_count(), false, now) {
            self.scheduler.cancel(token);
        }

        if matches.len() == 1 {
            let name = &matches[0];
            tracing::debug!(matching = %name, "data satisfies single entry");
            self.set_expiry_timer(now, name, Duration::ZERO);

            let actions = {
                let Self {
                    pit,
                    strategy_choice,
                    faces,
                    fib,
                    ..
                } = self;
                let Some(entry) = pit.find_mut(name) else {
                    return;
                };
                let ctx = StrategyContext {
                    faces,
                    fib,
                    now,
                };
                let strategy = strategy_choice.find_effective(name);
                strategy.before_satisfy_interest(&ctx, entry, in_face, &data);
                let actions = strategy.after_receive_data(&ctx, entry, in_face, &data);
                entry.is_satisfied = true;
                entry.data_freshness_period = data.freshness_period;
                actions
            };
            self.insert_dead_nonce_list(now, name, Some(in_face));
            if let Some(entry) = self.pit.find_mut(name) {
                entry.delete_out_record(in_face);
            }
            self.execute_actions(now, name, Some(&data), None, actions);
        } else {
            let mut downstreams: BTreeSet<FaceId> = BTreeSet::new();
            for name in &matches {
                tracing::debug!(matching = %name, "data satisfies entry");
                {
                    let Self {
                        pit,
                        strategy_choice,
                        faces,
                        fib,
                        ..
                    } = self;
                    let Some(entry) = pit.find_mut(name) else {
                        continue;
                    };
                    for record in entry.in_records() {
                        if record.expiry > now {
                            downstreams.insert(record.face);
                        }
                    }
                    let ctx = StrategyContext {
                        faces,
                        fib,
                        now,
                    };
                    strategy_choice
                        .find_effective(name)
                        .before_satisfy_interest(&ctx, entry, in_face, &data);
                    entry.is_satisfied = true;
                    entry.data_freshness_period = data.freshness_period;
                }
                self.set_expiry_timer(now, name, Duration::ZERO);
                self.insert_dead_nonce_list(now, name, Some(in_face));
                if let Some(entry) = self.pit.find_mut(name) {
                    entry.clear_in_records();
                    entry.delete_out_record(in_face);
                }
            }

            for downstream in downstreams {
                if downstream == in_face && link_type != LinkType::AdHoc {
                    continue;
                }
                self.on_outgoing_data(now, &data, downstream);
            }
        }
    }

    /// Emergency Data bypasses the PIT: re-flood to every other face
    /// (and the arrival face itself when it is ad-hoc), de-duplicated
    /// by (name, nonce).
    fn on_data_emergency(&mut self, now: Duration, in_face: FaceId, data: Data) {
        tracing::info!(data = %data.name, nonce = data.nonce, "emergency data");
        if self.data_nonce_list.has(&data.name, data.nonce) {
            tracing::debug!(data = %data.name, nonce = data.nonce, "duplicate emergency data dropped");
            return;
        }
        self.data_nonce_list.add(&data.name, data.nonce, now);

        for id in self.faces.ids() {
            if id != in_face || self.faces.link_type_of(id) == Some(LinkType::AdHoc) {
                self.on_outgoing_data(now, &data, id);
            }
        }
    }

    fn on_data_unsolicited(&mut self, now: Duration, in_face: FaceId, data: Data) {
        let scope = self
            .faces
            .scope_of(in_face)
            .unwrap_or(FaceScope::NonLocal);
        let decision = self.unsolicited_policy.decide(scope, &data);
        if decision == UnsolicitedDataDecision::Cache {
            for token in self.cs.insert(data.without_hop_count(), true, now) {
                self.scheduler.cancel(token);
            }
        }
        tracing::debug!(%in_face, data = %data.name, ?decision, "unsolicited data");

        // overhearing another node's data answers our scheduled relay,
        // whether or not this copy was cached
        let name = data.name.clone();
        let actions = {
            let Self {
                cs,
                strategy_choice,
                faces,
                fib,
                ..
            } = self;
            match cs.find_mut(&name) {
                Some(entry) => {
                    let ctx = StrategyContext {
                        faces,
                        fib,
                        now,
                    };
                    strategy_choice
                        .find_effective(&name)
                        .on_unsolicited_data(&ctx, entry, &data)
                }
                None => Vec::new(),
            }
        };
        self.execute_actions(now, &name, Some(&data), None, actions);
    }

    // --- outgoing Data pipeline ---

    fn on_outgoing_data(&mut self, _now: Duration, data: &Data, out_face: FaceId) {
        let Some(scope) = self.faces.scope_of(out_face) else {
            tracing::warn!(%out_face, data = %data.name, "outgoing data on unknown face");
            return;
        };
        if scope == FaceScope::NonLocal && data.name.is_localhost_scoped() {
            tracing::debug!(%out_face, data = %data.name, "violates /localhost");
            return;
        }
        tracing::debug!(%out_face, data = %data.name, "outgoing data");
        let Some(face) = self.faces.get_mut(out_face) else {
            return;
        };
        match face.send_data(data) {
            Ok(()) => self.counters.n_out_data += 1,
            Err(err) => tracing::debug!(%out_face, %err, data = %data.name, "face refused data"),
        }
    }

    // --- Nack pipelines ---

    pub fn handle_incoming_nack(&mut self, now: Duration, in_face: FaceId, nack: Nack) {
        self.counters.n_in_nacks += 1;
        let Some(link_type) = self.faces.link_type_of(in_face) else {
            return;
        };
        if link_type != LinkType::PointToPoint {
            tracing::debug!(%in_face, nack = %nack.interest.name, "nack on multi-access face");
            return;
        }

        let name = nack.interest.name.clone();
        let all_upstreams_answered = {
            let Some(entry) = self.pit.find_mut(&name) else {
                tracing::debug!(%in_face, nack = %name, "no pit entry");
                return;
            };
            let Some(out_record) = entry.out_record_mut(in_face) else {
                tracing::debug!(%in_face, nack = %name, "no out-record");
                return;
            };
            if nack.interest.nonce != out_record.last_nonce {
                tracing::debug!(
                    %in_face, nack = %name,
                    got = nack.interest.nonce, expected = out_record.last_nonce,
                    "wrong nonce"
                );
                return;
            }
            out_record.incoming_nack = Some(nack.reason);
            !entry.has_pending_out_records(now)
        };
        tracing::debug!(%in_face, nack = %name, reason = ?nack.reason, "incoming nack");

        if all_upstreams_answered {
            self.set_expiry_timer(now, &name, Duration::ZERO);
        }

        let actions = {
            let Self {
                pit,
                strategy_choice,
                faces,
                fib,
                ..
            } = self;
            let Some(entry) = pit.find_mut(&name) else {
                return;
            };
            let ctx = StrategyContext {
                faces,
                fib,
                now,
            };
            strategy_choice
                .find_effective(&name)
                .after_receive_nack(&ctx, in_face, &nack, entry)
        };
        self.execute_actions(now, &name, None, None, actions);
    }

    fn on_outgoing_nack(
        &mut self,
        _now: Duration,
        name: &Name,
        out_face: FaceId,
        reason: NackReason,
    ) {
        let nack = {
            let Self { pit, faces, .. } = self;
            let Some(entry) = pit.find_mut(name) else {
                return;
            };
            if !faces.contains(out_face) {
                tracing::warn!(nack = %name, ?reason, "outgoing nack on invalid face");
                return;
            }
            let Some(in_record) = entry.in_record(out_face) else {
                tracing::debug!(%out_face, nack = %name, "no in-record");
                return;
            };
            if faces.link_type_of(out_face) != Some(LinkType::PointToPoint) {
                tracing::debug!(%out_face, nack = %name, "nack on multi-access face");
                return;
            }
            let nack = Nack::new(in_record.interest.clone(), reason);
            entry.delete_in_record(out_face);
            nack
        };
        tracing::debug!(%out_face, nack = %name, ?reason, "outgoing nack");
        if let Some(face) = self.faces.get_mut(out_face) {
            if face.send_nack(&nack).is_ok() {
                self.counters.n_out_nacks += 1;
            }
        }
    }

    // --- strategy action execution ---

    fn execute_actions(
        &mut self,
        now: Duration,
        name: &Name,
        data: Option<&Data>,
        trigger: Option<&Interest>,
        actions: Vec<StrategyAction>,
    ) {
        for action in actions {
            match action {
                StrategyAction::SendInterest { out_face } => {
                    let interest = match trigger {
                        Some(interest) => interest.clone(),
                        None => match self.pit.find(name) {
                            Some(entry) => entry.interest().clone(),
                            None => continue,
                        },
                    };
                    self.on_outgoing_interest(now, name, out_face, &interest);
                }
                StrategyAction::ScheduleInterestRelay { out_face, delay } => {
                    self.set_relay_timer_for_interest(now, name, delay, out_face);
                }
                StrategyAction::ScheduleInterestRetx { out_face, delay } => {
                    self.set_retx_timer_for_interest(now, name, delay, out_face);
                }
                StrategyAction::SendData { out_face } => {
                    if let Some(data) = data {
                        self.on_outgoing_data(now, data, out_face);
                    }
                }
                StrategyAction::ScheduleDataRelay { out_face, delay } => {
                    if let Some(data) = data {
                        let data_name = data.name.clone();
                        self.set_relay_timer_for_data(now, &data_name, delay, out_face);
                    }
                }
                StrategyAction::SendNack { out_face, reason } => {
                    self.on_outgoing_nack(now, name, out_face, reason);
                }
                StrategyAction::Reject => {
                    self.set_expiry_timer(now, name, Duration::ZERO);
                }
                StrategyAction::CancelInterestRelay => {
                    let Self { pit, scheduler, .. } = self;
                    if let Some(entry) = pit.find_mut(name) {
                        if let Some(token) = entry.relay_timer.take() {
                            scheduler.cancel(token);
                        }
                        entry.relay_deadline = None;
                    }
                }
                StrategyAction::CancelDataRelay => {
                    let target = data.map(|d| d.name.clone()).unwrap_or_else(|| name.clone());
                    let Self { cs, scheduler, .. } = self;
                    if let Some(entry) = cs.find_mut(&target) {
                        if let Some(token) = entry.relay_timer.take() {
                            scheduler.cancel(token);
                        }
                        entry.relay_deadline = None;
                    }
                }
            }
        }
    }

    // --- timer setters (stable by-face-id forms) ---

    fn set_expiry_timer(&mut self, now: Duration, name: &Name, delay: Duration) {
        let Self { pit, scheduler, .. } = self;
        let Some(entry) = pit.find_mut(name) else {
            return;
        };
        if let Some(token) = entry.expiry_timer.take() {
            scheduler.cancel(token);
        }
        entry.expiry_timer = Some(scheduler.schedule(
            now,
            delay,
            TimerEvent::InterestExpiry { name: name.clone() },
        ));
    }

    fn set_relay_timer_for_interest(
        &mut self,
        now: Duration,
        name: &Name,
        delay: Duration,
        out_face: FaceId,
    ) {
        let Self { pit, scheduler, .. } = self;
        let Some(entry) = pit.find_mut(name) else {
            tracing::debug!(interest = %name, "pit entry gone, relay not scheduled");
            return;
        };
        if let Some(token) = entry.relay_timer.take() {
            scheduler.cancel(token);
        }
        tracing::debug!(interest = %name, %out_face, ?delay, "relay timer set");
        entry.relay_timer = Some(scheduler.schedule(
            now,
            delay,
            TimerEvent::InterestRelay {
                name: name.clone(),
                out_face,
            },
        ));
        entry.relay_deadline = Some(now + delay);
    }

    fn set_retx_timer_for_interest(
        &mut self,
        now: Duration,
        name: &Name,
        delay: Duration,
        out_face: FaceId,
    ) {
        let Self { pit, scheduler, .. } = self;
        let Some(entry) = pit.find_mut(name) else {
            tracing::debug!(interest = %name, "pit entry gone, retransmission not scheduled");
            return;
        };
        if let Some(token) = entry.retx_timer.take() {
            scheduler.cancel(token);
        }
        tracing::debug!(interest = %name, %out_face, ?delay, "retransmission timer set");
        entry.retx_timer = Some(scheduler.schedule(
            now,
            delay,
            TimerEvent::InterestRetx {
                name: name.clone(),
                out_face,
            },
        ));
        entry.retx_deadline = Some(now + delay);
    }

    fn set_relay_timer_for_data(
        &mut self,
        now: Duration,
        name: &Name,
        delay: Duration,
        out_face: FaceId,
    ) {
        let Self { cs, scheduler, .. } = self;
        let Some(entry) = cs.find_mut(name) else {
            return;
        };
        if let Some(token) = entry.relay_timer.take() {
            scheduler.cancel(token);
        }
        tracing::debug!(data = %name, %out_face, ?delay, "data relay timer set");
        entry.relay_timer = Some(scheduler.schedule(
            now,
            delay,
            TimerEvent::DataRelay {
                name: name.clone(),
                out_face,
            },
        ));
        entry.relay_deadline = Some(now + delay);
    }
}
