//! Forwarding core of the nomen daemon.
//!
//! This crate implements the Interest/Data/Nack pipelines and the state
//! they drive: the name-tree index backbone, FIB, PIT, content store,
//! dead-nonce memories, the timer scheduler, and the strategy framework
//! with the best-route and random-wait strategies.
//!
//! Everything here is synchronous and single-threaded: pipelines run to
//! completion, future work goes through the [`scheduler::Scheduler`],
//! and time is an explicit parameter so tests run on virtual clocks.

pub mod cs;
pub mod error;
pub mod faces;
pub mod fib;
pub mod forwarder;
pub mod nametree;
pub mod nonce_list;
pub mod pit;
pub mod region;
pub mod scheduler;
pub mod strategy;

pub use cs::{ContentStore, CsEntry};
pub use error::{FaceTableError, StrategyError};
pub use faces::FaceTable;
pub use fib::{Fib, FibEntry, NextHop};
pub use forwarder::{
    Counters, DefaultUnsolicitedDataPolicy, Forwarder, ForwarderConfig, UnsolicitedDataDecision,
    UnsolicitedDataPolicy,
};
pub use nametree::NameTree;
pub use nonce_list::NonceList;
pub use pit::{DuplicateNonce, InRecord, OutRecord, Pit, PitEntry};
pub use region::NetworkRegionTable;
pub use scheduler::{Scheduler, TimerEvent, TimerToken};
pub use strategy::{
    create_strategy, Strategy, StrategyAction, StrategyChoice, StrategyContext,
};
