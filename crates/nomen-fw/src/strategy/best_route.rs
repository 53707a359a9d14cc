//! Best-route strategy (version 2), the default.
//!
//! Forwards an Interest to the lowest-cost eligible next hop; a
//! retransmission outside the suppression window may switch to the next
//! eligible upstream. Data is returned to all live downstreams.

use nomen_core::{Data, FaceId, Interest, LinkType, Name, NackReason};

use crate::error::StrategyError;
use crate::pit::PitEntry;
use crate::strategy::suppression::{RetxSuppression, SuppressionResult};
use crate::strategy::{
    parse_instance_name, would_violate_scope, Strategy, StrategyAction, StrategyContext,
};

const VERSION: u64 = 2;

/// The canonical versioned name of this strategy.
pub fn strategy_name() -> Name {
    Name::from_uri("/localhost/nfd/strategy/best-route/2").expect("static name")
}

pub struct BestRouteStrategy {
    instance_name: Name,
    suppression: RetxSuppression,
}

impl BestRouteStrategy {
    pub fn new(configured_name: &Name) -> Result<Self, StrategyError> {
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
        })
    }
}

impl Strategy for BestRouteStrategy {
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
        let next_hops: Vec<FaceId> = ctx
            .lookup_fib(interest)
            .map(|e| e.next_hops().iter().map(|h| h.face).collect())
            .unwrap_or_default();

        let mut suppressed = false;
        for out_face in next_hops {
            if !ctx.faces.contains(out_face) {
                continue;
            }
            if out_face == in_face && ctx.faces.link_type_of(out_face) != Some(LinkType::AdHoc) {
                continue;
            }
            if would_violate_scope(ctx, in_face, interest, out_face) {
                continue;
            }
            match self.suppression.decide_per_upstream(entry, out_face, ctx.now) {
                SuppressionResult::Suppress => {
                    tracing::debug!(interest = %interest.name, %in_face, %out_face, "suppressed");
                    suppressed = true;
                    continue;
                }
                SuppressionResult::Forward => {
                    self.suppression.increment_interval(entry, out_face);
                    return vec![StrategyAction::SendInterest { out_face }];
                }
                SuppressionResult::New => {
                    return vec![StrategyAction::SendInterest { out_face }];
                }
            }
        }

        if suppressed {
            // a live upstream transmission is in flight; wait for it
            return Vec::new();
        }
        tracing::debug!(interest = %interest.name, %in_face, "no next hop");
        vec![
            StrategyAction::SendNack {
                out_face: in_face,
                reason: NackReason::NoRoute,
            },
            StrategyAction::Reject,
        ]
    }

    fn after_receive_data(
        &mut self,
        ctx: &StrategyContext<'_>,
        entry: &mut PitEntry,
        in_face: FaceId,
        _data: &Data,
    ) -> Vec<StrategyAction> {
        let in_link = ctx.faces.link_type_of(in_face);
        entry
            .live_in_record_faces(ctx.now)
            .into_iter()
            .filter(|&downstream| downstream != in_face || in_link == Some(LinkType::AdHoc))
            .map(|out_face| StrategyAction::SendData { out_face })
            .collect()
    }
}
