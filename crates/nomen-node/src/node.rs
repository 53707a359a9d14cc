//! The node: one event loop over faces, timers, and shutdown.
//!
//! All face events and timer callbacks are serialized onto the single
//! loop, so every pipeline runs to completion before the next event is
//! observed, matching the forwarding core's execution model.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use nomen_core::{FaceId, Name};
use nomen_fw::Forwarder;

use crate::channel_face::{channel_face, FaceHandle, FacePacket};
use crate::config::{parse_link_type, parse_scope, NodeConfig};
use crate::error::NodeError;

/// A running nomen node.
pub struct Node {
    forwarder: Forwarder,
    queue_depth: usize,
    event_tx: mpsc::Sender<(FaceId, FacePacket)>,
    event_rx: mpsc::Receiver<(FaceId, FacePacket)>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    epoch: Instant,
}

/// Handle for requesting shutdown from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl Node {
    /// Build a node from configuration: faces, routes, strategy choices
    /// and regions are installed up front.
    pub fn new(config: NodeConfig) -> Result<(Self, Vec<FaceHandle>), NodeError> {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut forwarder = Forwarder::new(config.forwarder_config());
        let queue_depth = config.node.face_queue_depth;

        let mut handles = Vec::with_capacity(config.faces.len());
        for entry in &config.faces {
            let scope = parse_scope(&entry.scope)?;
            let link_type = parse_link_type(&entry.link_type)?;
            let (face, handle) = channel_face(
                FaceId(entry.id),
                scope,
                link_type,
                event_tx.clone(),
                queue_depth,
            );
            forwarder.add_face(Box::new(face))?;
            tracing::info!(face = entry.id, ?scope, ?link_type, "face added");
            handles.push(handle);
        }

        for route in &config.routes {
            let prefix = parse_name(&route.prefix)?;
            forwarder.add_route(&prefix, FaceId(route.face), route.cost);
        }

        for choice in &config.strategies {
            let prefix = parse_name(&choice.prefix)?;
            let strategy_name = parse_name(&choice.strategy)?;
            forwarder.choose_strategy(&prefix, &strategy_name)?;
        }

        for region in &config.regions {
            forwarder.add_region(parse_name(region)?);
        }

        Ok((
            Self {
                forwarder,
                queue_depth,
                event_tx,
                event_rx,
                shutdown_tx,
                shutdown_rx,
                epoch: Instant::now(),
            },
            handles,
        ))
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Attach another face at runtime.
    pub fn attach_face(
        &mut self,
        scope: nomen_core::FaceScope,
        link_type: nomen_core::LinkType,
    ) -> Result<FaceHandle, NodeError> {
        let id = self.forwarder.next_face_id();
        let (face, handle) = channel_face(
            id,
            scope,
            link_type,
            self.event_tx.clone(),
            self.queue_depth,
        );
        self.forwarder.add_face(Box::new(face))?;
        tracing::info!(face = id.0, ?scope, ?link_type, "face attached");
        Ok(handle)
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    pub fn forwarder_mut(&mut self) -> &mut Forwarder {
        &mut self.forwarder
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Run until shutdown is requested.
    pub async fn run(&mut self) {
        tracing::info!("node running");
        loop {
            let next_deadline = self
                .forwarder
                .next_timer_deadline()
                .map(|deadline| self.epoch + deadline);

            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some((face, packet)) => self.dispatch(face, packet),
                        None => break,
                    }
                }
                _ = async {
                    match next_deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        // no timer pending; wait for a face event
                        None => std::future::pending().await,
                    }
                } => {
                    let now = self.now();
                    self.forwarder.poll_timers(now);
                }
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("node stopped");
    }

    fn dispatch(&mut self, face: FaceId, packet: FacePacket) {
        let now = self.now();
        match packet {
            FacePacket::Interest(interest) => {
                self.forwarder.handle_incoming_interest(now, face, interest)
            }
            FacePacket::Data(data) => self.forwarder.handle_incoming_data(now, face, data),
            FacePacket::Nack(nack) => self.forwarder.handle_incoming_nack(now, face, nack),
        }
        // sends may have pulled timers to the present
        self.forwarder.poll_timers(self.now());
    }
}

fn parse_name(uri: &str) -> Result<Name, NodeError> {
    Name::from_uri(uri).map_err(|e| NodeError::Config(format!("invalid name '{uri}': {e}")))
}
