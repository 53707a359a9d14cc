//! Error types for the node harness.

use nomen_fw::{FaceTableError, StrategyError};

/// Errors that can occur while building or running a node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("face error: {0}")]
    Face(#[from] FaceTableError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
