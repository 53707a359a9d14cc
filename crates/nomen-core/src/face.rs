//! The face contract.
//!
//! A face is an I/O endpoint through which packets flow. The forwarding
//! core consumes this trait; concrete transports live outside the core.
//! Send operations are fallible: a refusal is the backpressure signal
//! that ultimately reaches the strategy as a dropped-Interest event.

use core::fmt;

use crate::packet::{Data, Interest, Nack};

/// Stable face identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u64);

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The null face id; never assigned.
pub const INVALID_FACEID: FaceId = FaceId(0);

/// Reserved id for the synthetic content-store face used when a cached
/// Data satisfies an Interest.
pub const FACEID_CONTENT_STORE: FaceId = FaceId(254);

/// Highest reserved id; real faces are numbered above this.
pub const FACEID_RESERVED_MAX: FaceId = FaceId(255);

/// Trust scope of a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceScope {
    /// Attached to the local management plane.
    Local,
    /// Data-plane face toward other nodes.
    NonLocal,
}

/// Link type of a face; determines loop-detection and relay policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    PointToPoint,
    MultiAccess,
    AdHoc,
}

/// Errors surfaced by face send operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FaceError {
    #[error("outbound queue refused the packet")]
    QueueFull,

    #[error("face is closed")]
    Closed,
}

/// Contract implemented by every I/O endpoint registered with the
/// forwarder.
pub trait Face {
    fn id(&self) -> FaceId;
    fn scope(&self) -> FaceScope;
    fn link_type(&self) -> LinkType;

    fn send_interest(&mut self, interest: &Interest) -> Result<(), FaceError>;
    fn send_data(&mut self, data: &Data) -> Result<(), FaceError>;
    fn send_nack(&mut self, nack: &Nack) -> Result<(), FaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_ids_are_distinct() {
        assert!(INVALID_FACEID < FACEID_CONTENT_STORE);
        assert!(FACEID_CONTENT_STORE < FACEID_RESERVED_MAX);
    }

    #[test]
    fn test_face_id_display() {
        assert_eq!(FaceId(257).to_string(), "257");
    }
}
