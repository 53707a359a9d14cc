//! Test doubles for the face contract.
//!
//! [`MockFace`] records every packet sent through it into a shared
//! transcript, so tests can hand the face to a forwarder by value and
//! still inspect what was emitted. Used by unit tests throughout the
//! workspace and by the scenario tests in `nomen-fw/tests`.

use std::sync::{Arc, Mutex};

use crate::face::{Face, FaceError, FaceId, FaceScope, LinkType};
use crate::packet::{Data, Interest, Nack};

/// Transcript of packets a [`MockFace`] was asked to send.
#[derive(Debug, Default)]
pub struct FaceTranscript {
    pub interests: Vec<Interest>,
    pub data: Vec<Data>,
    pub nacks: Vec<Nack>,
    /// When set, every send is refused with `QueueFull`.
    pub reject_sends: bool,
}

/// Shared handle to a transcript; clone before moving the face away.
pub type TranscriptHandle = Arc<Mutex<FaceTranscript>>;

/// A face that records instead of transmitting.
pub struct MockFace {
    id: FaceId,
    scope: FaceScope,
    link_type: LinkType,
    transcript: TranscriptHandle,
}

impl MockFace {
    pub fn new(id: FaceId, scope: FaceScope, link_type: LinkType) -> Self {
        Self {
            id,
            scope,
            link_type,
            transcript: Arc::default(),
        }
    }

    /// A non-local point-to-point face.
    pub fn point_to_point(id: FaceId) -> Self {
        Self::new(id, FaceScope::NonLocal, LinkType::PointToPoint)
    }

    /// A non-local ad-hoc (broadcast) face.
    pub fn ad_hoc(id: FaceId) -> Self {
        Self::new(id, FaceScope::NonLocal, LinkType::AdHoc)
    }

    /// A local point-to-point face.
    pub fn local(id: FaceId) -> Self {
        Self::new(id, FaceScope::Local, LinkType::PointToPoint)
    }

    pub fn transcript(&self) -> TranscriptHandle {
        Arc::clone(&self.transcript)
    }
}

impl Face for MockFace {
    fn id(&self) -> FaceId {
        self.id
    }

    fn scope(&self) -> FaceScope {
        self.scope
    }

    fn link_type(&self) -> LinkType {
        self.link_type
    }

    fn send_interest(&mut self, interest: &Interest) -> Result<(), FaceError> {
        let mut t = self.transcript.lock().unwrap();
        if t.reject_sends {
            return Err(FaceError::QueueFull);
        }
        t.interests.push(interest.clone());
        Ok(())
    }

    fn send_data(&mut self, data: &Data) -> Result<(), FaceError> {
        let mut t = self.transcript.lock().unwrap();
        if t.reject_sends {
            return Err(FaceError::QueueFull);
        }
        t.data.push(data.clone());
        Ok(())
    }

    fn send_nack(&mut self, nack: &Nack) -> Result<(), FaceError> {
        let mut t = self.transcript.lock().unwrap();
        if t.reject_sends {
            return Err(FaceError::QueueFull);
        }
        t.nacks.push(nack.clone());
        Ok(())
    }
}
