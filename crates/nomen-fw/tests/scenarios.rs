//! End-to-end forwarding scenarios over virtual time.
//!
//! Each test builds a forwarder with recording faces, feeds packets in,
//! and advances the clock manually, polling timers along the way.

use std::time::Duration;

use nomen_core::testing::{MockFace, TranscriptHandle};
use nomen_core::{Data, EmergencyInd, FaceId, Interest, Name, NackReason};
use nomen_fw::strategy::random_wait::{self, DELAY_MAX, MAX_RETX_COUNT, RETX_TIMER_UNIT};
use nomen_fw::strategy::RandomWaitStrategy;
use nomen_fw::{Forwarder, ForwarderConfig};

fn name(uri: &str) -> Name {
    Name::from_uri(uri).unwrap()
}

struct Harness {
    fw: Forwarder,
    transcripts: Vec<TranscriptHandle>,
    now: Duration,
}

impl Harness {
    fn new(faces: Vec<MockFace>) -> Self {
        let mut fw = Forwarder::new(ForwarderConfig::default());
        let transcripts = faces
            .into_iter()
            .map(|face| {
                let transcript = face.transcript();
                fw.add_face(Box::new(face)).unwrap();
                transcript
            })
            .collect();
        Self {
            fw,
            transcripts,
            now: Duration::ZERO,
        }
    }

    /// Install the random-wait strategy (deterministic seed) at the root.
    fn use_random_wait(&mut self) {
        let strategy =
            RandomWaitStrategy::with_seed(&random_wait::strategy_name(), 7).unwrap();
        self.fw.set_strategy(&Name::root(), Box::new(strategy));
    }

    /// Advance virtual time by `delta`, firing due timers.
    fn advance(&mut self, delta: Duration) {
        self.now += delta;
        self.fw.poll_timers(self.now);
    }

    fn interests_on(&self, face: usize) -> Vec<Interest> {
        self.transcripts[face].lock().unwrap().interests.clone()
    }

    fn data_on(&self, face: usize) -> Vec<Data> {
        self.transcripts[face].lock().unwrap().data.clone()
    }

    fn nacks_on(&self, face: usize) -> Vec<nomen_core::Nack> {
        self.transcripts[face].lock().unwrap().nacks.clone()
    }
}

const F1: FaceId = FaceId(256);
const F2: FaceId = FaceId(257);
const F3: FaceId = FaceId(258);

// === point-to-point loop handling ===

#[test]
fn p2p_duplicate_from_same_face_updates_in_record() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
    ]);
    h.fw.add_route(&name("/a"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/a"), 0x1111));

    // forwarded upstream with the same nonce
    let sent = h.interests_on(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].nonce, 0x1111);
    let entry = h.fw.pit().find(&name("/a")).unwrap();
    assert_eq!(entry.out_record(F2).unwrap().last_nonce, 0x1111);

    // the same nonce from the same p2p face is an honest
    // retransmission: in-record refreshed, no Duplicate-Nack
    h.advance(Duration::from_millis(1));
    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/a"), 0x1111));
    assert!(h.nacks_on(0).is_empty());
    let entry = h.fw.pit().find(&name("/a")).unwrap();
    assert_eq!(entry.in_record(F1).unwrap().last_nonce, 0x1111);
}

#[test]
fn p2p_duplicate_from_other_face_gets_nack() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
        MockFace::point_to_point(F3),
    ]);
    h.fw.add_route(&name("/a"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/a"), 0x1111));

    // the nonce comes back on a third p2p face: that is a loop
    h.fw.handle_incoming_interest(h.now, F3, Interest::new(name("/a"), 0x1111));
    let nacks = h.nacks_on(2);
    assert_eq!(nacks.len(), 1);
    assert_eq!(nacks[0].reason, NackReason::Duplicate);
    // no out-record was created toward the looping face
    let entry = h.fw.pit().find(&name("/a")).unwrap();
    assert!(entry.out_record(F3).is_none());
}

// === broadcast overhear cancels the scheduled relay ===

#[test]
fn overheard_relay_is_cancelled_without_nack() {
    let mut h = Harness::new(vec![MockFace::ad_hoc(F1), MockFace::ad_hoc(F2)]);
    h.use_random_wait();
    h.fw.add_route(&name("/b"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/b"), 0x2222));

    // relay is scheduled, not sent
    assert!(h.interests_on(1).is_empty());
    assert!(h
        .fw
        .pit()
        .find(&name("/b"))
        .unwrap()
        .is_relay_pending(h.now));

    // before it fires, the same nonce is overheard on the out face
    h.advance(Duration::from_micros(200));
    h.fw.handle_incoming_interest(h.now, F2, Interest::new(name("/b"), 0x2222));

    // relay cancelled, no nack anywhere
    assert!(!h
        .fw
        .pit()
        .find(&name("/b"))
        .unwrap()
        .is_relay_pending(h.now));
    h.advance(DELAY_MAX + Duration::from_micros(100));
    assert!(h.interests_on(1).is_empty());
    assert!(h.nacks_on(0).is_empty());
    assert!(h.nacks_on(1).is_empty());
}

#[test]
fn without_overhear_the_relay_fires() {
    let mut h = Harness::new(vec![MockFace::ad_hoc(F1), MockFace::ad_hoc(F2)]);
    h.use_random_wait();
    h.fw.add_route(&name("/b"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/b"), 0x2222));
    h.advance(DELAY_MAX + Duration::from_micros(100));

    let sent = h.interests_on(1);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].nonce, 0x2222);
}

// === bounded retransmission ===

#[test]
fn retransmissions_stop_after_budget() {
    let mut h = Harness::new(vec![MockFace::ad_hoc(F1), MockFace::ad_hoc(F2)]);
    h.use_random_wait();
    h.fw.add_route(&name("/r"), F2, 1);

    let mut interest = Interest::new(name("/r"), 0x3333);
    interest.lifetime = Duration::from_secs(30);
    h.fw.handle_incoming_interest(h.now, F1, interest);

    // initial relay fires inside the delay window
    h.advance(DELAY_MAX);
    assert_eq!(h.interests_on(1).len(), 1);

    // each retransmission is scheduled retx_count units after the send
    // that scheduled it: +500ms, +1000ms, +1500ms
    h.advance(RETX_TIMER_UNIT);
    assert_eq!(h.interests_on(1).len(), 2);
    h.advance(RETX_TIMER_UNIT * 2);
    assert_eq!(h.interests_on(1).len(), 3);
    h.advance(RETX_TIMER_UNIT * 3);
    assert_eq!(h.interests_on(1).len(), 4);

    let entry = h.fw.pit().find(&name("/r")).unwrap();
    assert_eq!(entry.retx_count, MAX_RETX_COUNT);
    assert!(!entry.is_retx_pending(h.now));

    // budget exhausted: nothing further, ever
    h.advance(Duration::from_secs(10));
    assert_eq!(h.interests_on(1).len(), 4);
}

#[test]
fn data_arrival_ends_retransmission() {
    let mut h = Harness::new(vec![MockFace::ad_hoc(F1), MockFace::ad_hoc(F2)]);
    h.use_random_wait();
    h.fw.add_route(&name("/r"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/r"), 0x3333));
    h.advance(DELAY_MAX);
    assert_eq!(h.interests_on(1).len(), 1);

    h.fw.handle_incoming_data(h.now, F2, Data::new(name("/r"), b"v".to_vec()));
    h.advance(Duration::ZERO);
    assert!(h.fw.pit().is_empty());

    // the scheduled retransmission finds no entry and drops silently
    h.advance(Duration::from_secs(5));
    assert_eq!(h.interests_on(1).len(), 1);
}

// === content store hit ===

#[test]
fn cs_hit_answers_within_one_tick() {
    let mut h = Harness::new(vec![MockFace::point_to_point(F1)]);
    let mut cached = Data::new(name("/c"), b"cached".to_vec());
    cached.freshness_period = Duration::from_secs(1);
    h.fw.content_store_mut().insert(cached, false, h.now);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/c"), 0x4444));

    assert_eq!(h.fw.counters().n_cs_hits, 1);
    assert_eq!(h.fw.counters().n_cs_misses, 0);
    let returned = h.data_on(0);
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].content, b"cached");

    // the entry was created and dies on the next tick
    assert_eq!(h.fw.pit().len(), 1);
    h.advance(Duration::ZERO);
    assert!(h.fw.pit().is_empty());
    assert_eq!(h.fw.counters().n_satisfied_interests, 1);
}

// === emergency flood ===

#[test]
fn emergency_data_floods_and_deduplicates() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::ad_hoc(F2),
        MockFace::point_to_point(F3),
    ]);

    let mut data = Data::new(name("/e"), b"alert".to_vec());
    data.nonce = 0x9;
    data.emergency = EmergencyInd::Emergency;

    h.fw.handle_incoming_data(h.now, F1, data.clone());
    assert!(h.data_on(0).is_empty(), "arrival face is p2p, no echo");
    assert_eq!(h.data_on(1).len(), 1);
    assert_eq!(h.data_on(2).len(), 1);

    // duplicate arrives on the ad-hoc face: data nonce list eats it
    h.fw.handle_incoming_data(h.now, F2, data);
    assert!(h.data_on(0).is_empty());
    assert_eq!(h.data_on(1).len(), 1);
    assert_eq!(h.data_on(2).len(), 1);
}

#[test]
fn emergency_data_echoes_on_ad_hoc_arrival_face() {
    let mut h = Harness::new(vec![MockFace::ad_hoc(F1), MockFace::point_to_point(F2)]);

    let mut data = Data::new(name("/e2"), b"alert".to_vec());
    data.nonce = 0xA;
    data.emergency = EmergencyInd::Emergency;

    h.fw.handle_incoming_data(h.now, F1, data);
    // ad-hoc arrival face is re-flooded too
    assert_eq!(h.data_on(0).len(), 1);
    assert_eq!(h.data_on(1).len(), 1);
}

// === dead nonce list insert on unsatisfied expiry ===

#[test]
fn unsatisfied_expiry_records_outgoing_nonce() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
    ]);
    h.fw.add_route(&name("/d"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/d"), 0x55));
    assert_eq!(h.interests_on(1).len(), 1);

    // lifetime (4s default) passes unanswered
    h.advance(Duration::from_secs(5));
    assert!(h.fw.pit().is_empty());
    assert_eq!(h.fw.counters().n_unsatisfied_interests, 1);
    assert!(h.fw.dead_nonce_list().has(&name("/d"), 0x55));

    // the recorded nonce now classifies as a loop on arrival
    h.fw.handle_incoming_interest(h.now, F2, Interest::new(name("/d"), 0x55));
    assert_eq!(h.interests_on(1).len(), 1, "no forwarding for dead nonce");
}

// === Quantified invariants ===

#[test]
fn invariant_satisfied_entry_finalizes_exactly_once() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
    ]);
    h.fw.add_route(&name("/a"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/a"), 1));
    h.fw.handle_incoming_data(h.now, F2, Data::new(name("/a"), b"v".to_vec()));
    h.advance(Duration::from_secs(10));

    let c = h.fw.counters();
    assert_eq!(c.n_satisfied_interests + c.n_unsatisfied_interests, 1);
    assert_eq!(c.n_satisfied_interests, 1);
}

#[test]
fn invariant_rescheduled_relay_fires_once() {
    let mut h = Harness::new(vec![MockFace::ad_hoc(F1), MockFace::ad_hoc(F2)]);
    h.use_random_wait();
    h.fw.add_route(&name("/b"), F2, 1);

    // two rounds with different nonces: the second reschedules and the
    // first relay must never fire
    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/b"), 0x01));
    h.advance(Duration::from_micros(100));
    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/b"), 0x02));

    h.advance(DELAY_MAX + Duration::from_micros(200));
    assert!(h.interests_on(1).len() <= 1);
}

#[test]
fn invariant_multi_match_data_reaches_each_downstream_once() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
        MockFace::point_to_point(F3),
    ]);
    h.fw.add_route(&name("/p"), F3, 1);

    // two entries along one prefix chain, from different downstreams
    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/p"), 0x10));
    h.fw.handle_incoming_interest(h.now, F2, Interest::new(name("/p/q"), 0x20));

    // one data satisfies both
    h.fw.handle_incoming_data(h.now, F3, Data::new(name("/p/q"), b"v".to_vec()));

    assert_eq!(h.data_on(0).len(), 1);
    assert_eq!(h.data_on(1).len(), 1);
    assert!(h.data_on(2).is_empty(), "no copy back to the arrival face");

    h.advance(Duration::ZERO);
    assert!(h.fw.pit().is_empty());
    assert_eq!(h.fw.counters().n_satisfied_interests, 2);
}

#[test]
fn invariant_round_trip_within_one_tick_on_p2p() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
    ]);
    h.fw.add_route(&name("/rt"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/rt"), 0x77));
    h.fw.handle_incoming_data(h.now, F2, Data::new(name("/rt"), b"v".to_vec()));

    // the data is already on the downstream face, no timer needed
    assert_eq!(h.data_on(0).len(), 1);
    assert_eq!(h.data_on(0)[0].name, name("/rt"));
}

#[test]
fn invariant_second_asker_is_served_from_cache() {
    let mut h = Harness::new(vec![
        MockFace::point_to_point(F1),
        MockFace::point_to_point(F2),
        MockFace::point_to_point(F3),
    ]);
    h.fw.add_route(&name("/a"), F2, 1);

    h.fw.handle_incoming_interest(h.now, F1, Interest::new(name("/a"), 1));
    h.fw.handle_incoming_data(h.now, F2, Data::new(name("/a"), b"v".to_vec()));
    h.advance(Duration::ZERO);

    h.fw.handle_incoming_interest(h.now, F3, Interest::new(name("/a"), 2));
    assert_eq!(h.fw.counters().n_cs_hits, 1);
    assert_eq!(h.data_on(2).len(), 1);
    // upstream saw only the first interest
    assert_eq!(h.interests_on(1).len(), 1);
}
