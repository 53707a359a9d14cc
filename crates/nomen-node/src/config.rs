//! TOML-based configuration for nomen nodes.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use nomen_core::{FaceScope, LinkType};
use nomen_fw::ForwarderConfig;

use crate::error::NodeError;

/// Top-level node configuration loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub faces: Vec<FaceEntry>,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub strategies: Vec<StrategyEntry>,
    #[serde(default)]
    pub regions: Vec<String>,
}

/// The `[node]` section.
#[derive(Debug, Deserialize)]
pub struct NodeSection {
    /// Content-store capacity in entries.
    #[serde(default = "default_cs_capacity")]
    pub cs_capacity: usize,
    /// Dead-nonce-list entry lifetime in milliseconds.
    #[serde(default = "default_dead_nonce_lifetime_ms")]
    pub dead_nonce_lifetime_ms: u64,
    /// Tag outgoing Interests with the common-control-channel bit.
    #[serde(default)]
    pub tag_outgoing_cch: bool,
    /// Outbound queue depth of each channel face.
    #[serde(default = "default_face_queue_depth")]
    pub face_queue_depth: usize,
}

fn default_cs_capacity() -> usize {
    4096
}

fn default_dead_nonce_lifetime_ms() -> u64 {
    6000
}

fn default_face_queue_depth() -> usize {
    256
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            cs_capacity: default_cs_capacity(),
            dead_nonce_lifetime_ms: default_dead_nonce_lifetime_ms(),
            tag_outgoing_cch: false,
            face_queue_depth: default_face_queue_depth(),
        }
    }
}

/// A `[[faces]]` entry: a channel face external drivers attach to.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceEntry {
    pub id: u64,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_link_type")]
    pub link_type: String,
}

fn default_scope() -> String {
    "non-local".to_string()
}

fn default_link_type() -> String {
    "point-to-point".to_string()
}

/// A `[[routes]]` entry: prefix -> face with cost.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteEntry {
    pub prefix: String,
    pub face: u64,
    #[serde(default)]
    pub cost: u64,
}

/// A `[[strategies]]` entry: prefix -> strategy instance name.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyEntry {
    pub prefix: String,
    pub strategy: String,
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("failed to read config file: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(format!("failed to parse config: {e}")))
    }

    /// The forwarder parameters this configuration asks for.
    pub fn forwarder_config(&self) -> ForwarderConfig {
        ForwarderConfig {
            cs_capacity: self.node.cs_capacity,
            dead_nonce_lifetime: Duration::from_millis(self.node.dead_nonce_lifetime_ms),
            tag_outgoing_cch: self.node.tag_outgoing_cch,
            ..ForwarderConfig::default()
        }
    }
}

/// Parse a face scope string.
pub fn parse_scope(s: &str) -> Result<FaceScope, NodeError> {
    match s {
        "local" => Ok(FaceScope::Local),
        "non-local" => Ok(FaceScope::NonLocal),
        other => Err(NodeError::Config(format!("unknown face scope: {other}"))),
    }
}

/// Parse a link-type string.
pub fn parse_link_type(s: &str) -> Result<LinkType, NodeError> {
    match s {
        "point-to-point" => Ok(LinkType::PointToPoint),
        "multi-access" => Ok(LinkType::MultiAccess),
        "ad-hoc" => Ok(LinkType::AdHoc),
        other => Err(NodeError::Config(format!("unknown link type: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = NodeConfig::parse(
            r#"
            regions = ["/region/east"]

            [node]
            cs_capacity = 128
            dead_nonce_lifetime_ms = 3000
            tag_outgoing_cch = true

            [[faces]]
            id = 256
            scope = "local"

            [[faces]]
            id = 257
            link_type = "ad-hoc"

            [[routes]]
            prefix = "/a"
            face = 257
            cost = 10

            [[strategies]]
            prefix = "/a"
            strategy = "/localhost/nfd/strategy/random-wait/3"
            "#,
        )
        .unwrap();

        assert_eq!(config.node.cs_capacity, 128);
        assert!(config.node.tag_outgoing_cch);
        assert_eq!(config.faces.len(), 2);
        assert_eq!(config.faces[0].scope, "local");
        assert_eq!(config.faces[1].link_type, "ad-hoc");
        assert_eq!(config.routes[0].cost, 10);
        assert_eq!(config.strategies.len(), 1);
        assert_eq!(config.regions, vec!["/region/east"]);

        let fw = config.forwarder_config();
        assert_eq!(fw.cs_capacity, 128);
        assert_eq!(fw.dead_nonce_lifetime, Duration::from_millis(3000));
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::parse("").unwrap();
        assert_eq!(config.node.cs_capacity, 4096);
        assert_eq!(config.node.dead_nonce_lifetime_ms, 6000);
        assert!(!config.node.tag_outgoing_cch);
        assert!(config.faces.is_empty());
    }

    #[test]
    fn test_parse_scope_and_link_type() {
        assert_eq!(parse_scope("local").unwrap(), FaceScope::Local);
        assert_eq!(parse_scope("non-local").unwrap(), FaceScope::NonLocal);
        assert!(parse_scope("cosmic").is_err());

        assert_eq!(
            parse_link_type("point-to-point").unwrap(),
            LinkType::PointToPoint
        );
        assert_eq!(parse_link_type("ad-hoc").unwrap(), LinkType::AdHoc);
        assert!(parse_link_type("quantum").is_err());
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let err = NodeConfig::parse("[node").unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }
}
