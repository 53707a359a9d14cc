//! Core types for the nomen forwarding daemon.
//!
//! This crate defines hierarchical names, the three NDN packet kinds
//! (Interest, Data, Nack), and the face contract consumed by the
//! forwarding core. It deliberately contains no I/O and no wire format:
//! faces exchange decoded packets.

pub mod error;
pub mod face;
pub mod name;
pub mod packet;
pub mod testing;

pub use error::NameError;
pub use face::{
    Face, FaceError, FaceId, FaceScope, LinkType, FACEID_CONTENT_STORE, FACEID_RESERVED_MAX,
    INVALID_FACEID,
};
pub use name::{Name, NameComponent};
pub use packet::{Data, EmergencyInd, Interest, Nack, NackReason, DEFAULT_INTEREST_LIFETIME};
