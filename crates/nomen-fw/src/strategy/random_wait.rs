//! Random-wait strategy (version 3).
//!
//! Built for broadcast and ad-hoc links: instead of relaying an Interest
//! immediately, the strategy draws a uniform random delay in
//! [`DELAY_MIN`, `DELAY_MAX`] and schedules the relay. Overhearing a
//! neighbour relay the same Interest first cancels the scheduled one, so
//! redundant transmissions die without coordination. Hops touching a
//! local face skip the wait. Relayed Interests are retransmitted on a
//! fixed clock until [`MAX_RETX_COUNT`] is reached, then dropped.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use nomen_core::{Data, FaceId, FaceScope, Interest, LinkType, Name, NackReason};

use crate::cs::CsEntry;
use crate::error::StrategyError;
use crate::pit::PitEntry;
use crate::strategy::suppression::{RetxSuppression, SuppressionResult};
use crate::strategy::{
    parse_instance_name, would_violate_scope, Strategy, StrategyAction, StrategyContext,
};

/// Lower bound of the random relay delay.
pub const DELAY_MIN: Duration = Duration::from_micros(500);

/// Upper bound of the random relay delay.
pub const DELAY_MAX: Duration = Duration::from_micros(3000);

/// Spacing unit of scheduled retransmissions: the n-th retransmission
/// fires n units after the send that scheduled it.
pub const RETX_TIMER_UNIT: Duration = Duration::from_millis(500);

/// Retransmission budget per PIT entry.
pub const MAX_RETX_COUNT: u32 = 3;

const VERSION: u64 = 3;

/// The canonical versioned name of this strategy.
pub fn strategy_name() -> Name {
    Name::from_uri("/localhost/nfd/strategy/random-wait/3").expect("static name")
}

pub struct RandomWaitStrategy {
    instance_name: Name,
    suppression: RetxSuppression,
    rng: SmallRng,
}

impl RandomWaitStrategy {
    pub fn new(configured_name: &Name) -> Result<Self, StrategyError> {
        Self::with_rng(configured_name, SmallRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_seed(configured_name: &Name, seed: u64) -> Result<Self, StrategyError> {
        Self::with_rng(configured_name, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(configured_name: &Name, rng: SmallRng) -> Result<Self, StrategyError> {
        let parsed = parse_instance_name(configured_name, 4)?;
        if parsed.parameters > 0 {
            return Err(StrategyError::ParametersNotAccepted);
        }
        if let Some(version) = parsed.version {
            if version != VERSION {
                return Err(StrategyError::UnsupportedVersion(version));
            }
        }
        Ok(Self {
            instance_name: strategy_name(),
            suppression: RetxSuppression::with_defaults(),
            rng,
        })
    }

    fn random_delay(&mut self) -> Duration {
        let micros = self
            .rng
            .gen_range(DELAY_MIN.as_micros() as u64..=DELAY_MAX.as_micros() as u64);
        Duration::from_micros(micros)
    }
}

impl Strategy for RandomWaitStrategy {
    fn instance_name(&self) -> &Name {
        &self.instance_name
    }

    fn after_receive_interest(
        &mut self,
        ctx: &StrategyContext<'_>,
        in_face: FaceId,
        interest: &Interest,
        entry: &mut PitEntry,
    ) -> Vec<StrategyAction> {
        tracing::debug!(interest = %interest.name, %in_face, "random-wait selected");

        let next_hops: Vec<FaceId> = ctx
            .lookup_fib(interest)
            .map(|e| e.next_hops().iter().map(|h| h.face).collect())
            .unwrap_or_default();

        let mut actions = Vec::new();
        let mut eligible = 0usize;
        let mut suppressed = false;

        for out_face in next_hops {
            if !ctx.faces.contains(out_face) {
                continue;
            }
            let decision = self.suppression.decide_per_upstream(entry, out_face, ctx.now);
            if decision == SuppressionResult::Suppress {
                tracing::debug!(interest = %interest.name, %in_face, %out_face, "suppressed");
                suppressed = true;
                continue;
            }
            if out_face == in_face && ctx.faces.link_type_of(out_face) != Some(LinkType::AdHoc) {
                continue;
            }
            if would_violate_scope(ctx, in_face, interest, out_face) {
                continue;
            }

            let local_hop = ctx.faces.scope_of(in_face) == Some(FaceScope::Local)
                || ctx.faces.scope_of(out_face) == Some(FaceScope::Local);
            if local_hop {
                tracing::debug!(interest = %interest.name, %in_face, %out_face, "local hop, send now");
                actions.push(StrategyAction::SendInterest { out_face });
            } else {
                let delay = self.random_delay();
                tracing::debug!(
                    interest = %interest.name, %out_face, ?delay, "relay scheduled"
                );
                actions.push(StrategyAction::ScheduleInterestRelay { out_face, delay });
            }
            if decision == SuppressionResult::Forward {
                self.suppression.increment_interval(entry, out_face);
            }
            eligible += 1;
        }

        if eligible == 0 && !suppressed {
            tracing::debug!(interest = %interest.name, %in_face, "no next hop");
            actions.push(StrategyAction::SendNack {
                out_face: in_face,
                reason: NackReason::NoRoute,
            });
            actions.push(StrategyAction::Reject);
        }
        actions
    }

    fn after_send_interest(
        &mut self,
        ctx: &StrategyContext<'_>,
        entry: &mut PitEntry,
        out_face: FaceId,
        interest: &Interest,
    ) -> Vec<StrategyAction> {
        if entry.retx_count < MAX_RETX_COUNT {
            entry.retx_count += 1;
            let delay = RETX_TIMER_UNIT * entry.retx_count;
            tracing::debug!(
                interest = %interest.name, %out_face, retx = entry.retx_count, ?delay,
                "retransmission scheduled"
            );
            vec![StrategyAction::ScheduleInterestRetx { out_face, delay }]
        } else {
            self.on_dropped_interest(ctx, out_face, interest);
            Vec::new()
        }
    }

    fn after_receive_data(
        &mut self,
        ctx: &StrategyContext<'_>,
        entry: &mut PitEntry,
        in_face: FaceId,
        data: &Data,
    ) -> Vec<StrategyAction> {
        let in_link = ctx.faces.link_type_of(in_face);
        let in_scope = ctx.faces.scope_of(in_face);
        let mut actions = Vec::new();

        for out_face in entry.live_in_record_faces(ctx.now) {
            if out_face == in_face && in_link != Some(LinkType::AdHoc) {
                continue;
            }
            let immediate = in_scope == Some(FaceScope::Local)
                || ctx.faces.scope_of(out_face) == Some(FaceScope::Local)
                || ctx.faces.link_type_of(out_face) != Some(LinkType::AdHoc);
            if immediate {
                actions.push(StrategyAction::SendData { out_face });
            } else {
                let delay = self.random_delay();
                tracing::debug!(data = %data.name, %out_face, ?delay, "data relay scheduled");
                actions.push(StrategyAction::ScheduleDataRelay { out_face, delay });
            }
        }
        actions
    }

    fn after_content_store_hit(
        &mut self,
        _ctx: &StrategyContext<'_>,
        _entry: &mut PitEntry,
        in_face: FaceId,
        _data: &Data,
    ) -> Vec<StrategyAction> {
        vec![
            StrategyAction::CancelDataRelay,
            StrategyAction::SendData { out_face: in_face },
        ]
    }

    fn on_dropped_interest(
        &mut self,
        _ctx: &StrategyContext<'_>,
        out_face: FaceId,
        interest: &Interest,
    ) {
        tracing::debug!(interest = %interest.name, %out_face, "interest dropped");
    }

    fn on_loop_overheard(
        &mut self,
        ctx: &StrategyContext<'_>,
        entry: &mut PitEntry,
    ) -> Vec<StrategyAction> {
        if entry.is_relay_pending(ctx.now) {
            tracing::debug!(interest = %entry.name(), "overheard relay, cancelling ours");
            vec![StrategyAction::CancelInterestRelay]
        } else {
            Vec::new()
        }
    }

    fn on_unsolicited_data(
        &mut self,
        ctx: &StrategyContext<'_>,
        entry: &mut CsEntry,
        data: &Data,
    ) -> Vec<StrategyAction> {
        if entry.is_relay_pending(ctx.now) {
            tracing::debug!(data = %data.name, "overheard data, cancelling scheduled relay");
            vec![StrategyAction::CancelDataRelay]
        } else {
            Vec::new()
        }
    }
}
