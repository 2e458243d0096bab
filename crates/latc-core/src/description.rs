//! System description documents.
//!
//! A description is a JSON document for one node: the primary controller or
//! a link satellite. It names the node's role, target platform and hardware
//! revision, and lists the peripheral boards attached to it in order. Order
//! is load-bearing: names and channel addresses are allocated by walking
//! the peripheral list front to back.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while loading a description document.
///
/// These are input errors, distinct from topology errors raised later by
/// the compiler: a document that does not parse never reaches expansion.
#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed description {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Role of a node in the link topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Primary node with no link attached.
    Standalone,
    /// Primary node driving one or more satellites.
    Master,
    /// Downstream node reached over the link.
    Satellite,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Standalone => write!(f, "standalone"),
            NodeRole::Master => write!(f, "master"),
            NodeRole::Satellite => write!(f, "satellite"),
        }
    }
}

/// Description of one controller node and its attached peripherals.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    /// Human name for this build variant, echoed in the emitted header.
    pub variant: String,
    pub role: NodeRole,
    /// Target platform identifier ("vertex", "vertex_soc").
    pub target: String,
    /// Hardware revision string ("v1.0", "v1.1", "v2.0", ...).
    pub hw_rev: String,
    /// Network address of the core device.
    #[serde(default = "default_core_addr")]
    pub core_addr: String,
    /// Link reference clock in Hz.
    #[serde(default = "default_link_frequency")]
    pub link_frequency: f64,
    #[serde(default)]
    pub peripherals: Vec<PeripheralDescription>,
}

fn default_core_addr() -> String {
    "192.168.1.70".to_string()
}

fn default_link_frequency() -> f64 {
    125e6
}

impl NodeDescription {
    /// Load a description from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DescriptionError> {
        let data = std::fs::read_to_string(path).map_err(|source| DescriptionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| DescriptionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Description of one peripheral board.
///
/// The `type` tag selects the expander; the remaining keys form the
/// type-specific parameter bag, kept opaque here and validated by the
/// expander that consumes it. Keeping the tag a plain string means an
/// unknown board type surfaces as a topology error at expansion, not as a
/// parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct PeripheralDescription {
    #[serde(rename = "type")]
    pub kind: String,
    /// Explicit link destination index, for link-routed boards.
    #[serde(default)]
    pub link_destination: Option<u32>,
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl PeripheralDescription {
    /// Whether this board is reached over the link rather than the local
    /// node's channels. The wavedac is the only link-routed board.
    pub fn is_link_routed(&self) -> bool {
        self.kind == "wavedac"
    }

    /// The parameter bag as an owned JSON value, for typed deserialization
    /// by an expander.
    pub fn parameter_bag(&self) -> Value {
        Value::Object(self.parameters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(json: &str) -> NodeDescription {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_description() {
        let desc = parse(
            r#"{
                "variant": "bench",
                "role": "standalone",
                "target": "vertex",
                "hw_rev": "v2.0"
            }"#,
        );
        assert_eq!(desc.role, NodeRole::Standalone);
        assert_eq!(desc.core_addr, "192.168.1.70");
        assert_eq!(desc.link_frequency, 125e6);
        assert!(desc.peripherals.is_empty());
    }

    #[test]
    fn peripheral_bag_is_preserved() {
        let desc = parse(
            r#"{
                "variant": "bench",
                "role": "master",
                "target": "vertex",
                "hw_rev": "v1.1",
                "core_addr": "10.0.0.5",
                "link_frequency": 100e6,
                "peripherals": [
                    {
                        "type": "dio",
                        "bank_direction_low": "input",
                        "bank_direction_high": "output",
                        "edge_counter": true
                    },
                    {"type": "wavedac", "link_destination": 7}
                ]
            }"#,
        );
        assert_eq!(desc.peripherals.len(), 2);
        let dio = &desc.peripherals[0];
        assert_eq!(dio.kind, "dio");
        assert!(!dio.is_link_routed());
        assert_eq!(dio.parameters["bank_direction_low"], "input");
        assert!(dio.link_destination.is_none());

        let wavedac = &desc.peripherals[1];
        assert!(wavedac.is_link_routed());
        assert_eq!(wavedac.link_destination, Some(7));
    }

    #[test]
    fn unknown_role_is_a_parse_error() {
        let err = serde_json::from_str::<NodeDescription>(
            r#"{"variant": "x", "role": "observer", "target": "vertex", "hw_rev": "v2.0"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("observer"));
    }

    #[test]
    fn load_reports_the_path() {
        let missing = NodeDescription::load(Path::new("/nonexistent/desc.json")).unwrap_err();
        assert!(matches!(missing, DescriptionError::Io { .. }));
        assert!(missing.to_string().contains("/nonexistent/desc.json"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let bad = NodeDescription::load(file.path()).unwrap_err();
        assert!(matches!(bad, DescriptionError::Parse { .. }));
    }
}
