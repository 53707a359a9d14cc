//! Channel-backed faces.
//!
//! External transport drivers attach to the node through a pair of
//! channels: an inbound sender feeding received packets into the event
//! loop, and an outbound receiver draining what the forwarder sends.
//! The outbound queue is bounded; a full queue refuses the packet, which
//! the forwarder surfaces to the strategy as a dropped Interest.

use tokio::sync::mpsc;

use nomen_core::{Data, Face, FaceError, FaceId, FaceScope, Interest, LinkType, Nack};

/// A decoded packet crossing a face boundary.
#[derive(Debug, Clone)]
pub enum FacePacket {
    Interest(Interest),
    Data(Data),
    Nack(Nack),
}

/// The forwarder-side face: sends push onto the bounded outbound queue.
pub struct ChannelFace {
    id: FaceId,
    scope: FaceScope,
    link_type: LinkType,
    outbound: mpsc::Sender<FacePacket>,
}

impl ChannelFace {
    fn send(&mut self, packet: FacePacket) -> Result<(), FaceError> {
        self.outbound.try_send(packet).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => FaceError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => FaceError::Closed,
        })
    }
}

impl Face for ChannelFace {
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
        self.send(FacePacket::Interest(interest.clone()))
    }

    fn send_data(&mut self, data: &Data) -> Result<(), FaceError> {
        self.send(FacePacket::Data(data.clone()))
    }

    fn send_nack(&mut self, nack: &Nack) -> Result<(), FaceError> {
        self.send(FacePacket::Nack(nack.clone()))
    }
}

/// The driver-side endpoints of a channel face.
pub struct FaceHandle {
    pub id: FaceId,
    /// Feed packets received from the wire into the node.
    pub inbound: mpsc::Sender<(FaceId, FacePacket)>,
    /// Drain packets the forwarder sends out this face.
    pub outbound: mpsc::Receiver<FacePacket>,
}

/// Build a channel face. `inbound` is the node's shared event sender;
/// `queue_depth` bounds the outbound queue.
pub fn channel_face(
    id: FaceId,
    scope: FaceScope,
    link_type: LinkType,
    inbound: mpsc::Sender<(FaceId, FacePacket)>,
    queue_depth: usize,
) -> (ChannelFace, FaceHandle) {
    let (outbound_tx, outbound_rx) = mpsc::channel(queue_depth.max(1));
    (
        ChannelFace {
            id,
            scope,
            link_type,
            outbound: outbound_tx,
        },
        FaceHandle {
            id,
            inbound,
            outbound: outbound_rx,
        },
    )
}
