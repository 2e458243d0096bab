//! Compilation errors.

use latc_core::description::NodeRole;
use latc_core::registry::RegistryError;
use latc_targets::TargetError;
use thiserror::Error;

/// Errors that abort a registry build. All are fatal to the current
/// invocation; a failed build produces no output.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A node's declared role does not match its position in the topology.
    #[error("invalid role {role} for {position}")]
    InvalidRole { role: NodeRole, position: String },

    /// The node arrangement itself is contradictory.
    #[error("invalid topology: {reason}")]
    InvalidTopology { reason: String },

    /// A peripheral type tag outside the expander dispatch table.
    #[error("unsupported peripheral type: {kind}")]
    UnsupportedPeripheralType { kind: String },

    /// A parameter bag that does not match its type's schema.
    #[error("bad parameters for {kind} peripheral: {source}")]
    InvalidParameters {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("platform lookup failed: {0}")]
    Target(#[from] TargetError),
}
