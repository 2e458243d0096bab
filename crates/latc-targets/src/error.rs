//! Error types for platform lookups.

/// Errors raised when a description names a platform combination outside
/// the known tables.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Unknown target/revision combination.
    #[error("unsupported platform: target {target:?} hw_rev {hw_rev:?}")]
    UnsupportedPlatform { target: String, hw_rev: String },
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, TargetError>;
