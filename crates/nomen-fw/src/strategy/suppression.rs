//! Exponential retransmission suppression.
//!
//! Tracks, per upstream, how recently the pending Interest was sent
//! there. A retransmission inside the current suppression window is
//! suppressed; each forwarded retransmission widens the window up to a
//! cap. The per-upstream interval lives on the PIT entry (strategy
//! scratch); the window base is the out-record's last-renewed instant.

use std::time::Duration;

use nomen_core::FaceId;

use crate::pit::PitEntry;

pub const RETX_SUPPRESSION_INITIAL: Duration = Duration::from_millis(10);
pub const RETX_SUPPRESSION_MULTIPLIER: f64 = 2.0;
pub const RETX_SUPPRESSION_MAX: Duration = Duration::from_millis(250);

/// Outcome of the per-upstream decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionResult {
    /// First transmission toward this upstream.
    New,
    /// A retransmission outside the suppression window; forward it.
    Forward,
    /// A retransmission inside the window; suppress it.
    Suppress,
}

/// Per-upstream exponential suppression policy.
pub struct RetxSuppression {
    initial: Duration,
    multiplier: f64,
    max: Duration,
}

impl RetxSuppression {
    pub fn new(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            initial,
            multiplier,
            max,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(
            RETX_SUPPRESSION_INITIAL,
            RETX_SUPPRESSION_MULTIPLIER,
            RETX_SUPPRESSION_MAX,
        )
    }

    /// Decide for one upstream of `entry`.
    pub fn decide_per_upstream(
        &self,
        entry: &PitEntry,
        out_face: FaceId,
        now: Duration,
    ) -> SuppressionResult {
        let Some(out_record) = entry.out_record(out_face) else {
            return SuppressionResult::New;
        };
        if out_record.expiry <= now {
            // previous transmission ran out; treat as first
            return SuppressionResult::New;
        }
        let interval = entry
            .suppression_intervals
            .get(&out_face)
            .copied()
            .unwrap_or(self.initial);
        if now < out_record.last_renewed + interval {
            SuppressionResult::Suppress
        } else {
            SuppressionResult::Forward
        }
    }

    /// Widen the window for `out_face` after a forwarded retransmission.
    pub fn increment_interval(&self, entry: &mut PitEntry, out_face: FaceId) {
        let interval = entry
            .suppression_intervals
            .entry(out_face)
            .or_insert(self.initial);
        *interval = Duration::from_secs_f64(interval.as_secs_f64() * self.multiplier).min(self.max);
    }
}
