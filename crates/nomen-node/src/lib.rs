//! Async harness around the nomen forwarding core.
//!
//! The core is synchronous and clock-agnostic; this crate supplies the
//! missing machinery for a running daemon: TOML configuration, tracing
//! setup, channel-backed faces, and the single event loop that serializes
//! face events and timer deadlines onto the forwarder.

pub mod channel_face;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;

pub use channel_face::{channel_face, ChannelFace, FaceHandle, FacePacket};
pub use config::NodeConfig;
pub use error::NodeError;
pub use node::Node;
