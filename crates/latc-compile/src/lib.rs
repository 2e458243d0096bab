//! Topology expansion engine for latc.
//!
//! Turns node descriptions into a flat device registry in three ordered
//! phases: header, local peripherals (primary node then satellites), and
//! link-routed peripherals. All mutable build state (name counters,
//! address offsets) is owned by one call stack and discarded after the
//! build; a build either completes deterministically or fails fast.

pub mod context;
pub mod error;
pub mod expand;
pub mod resolve;
pub mod walker;

pub use error::CompileError;
pub use expand::Expander;
pub use walker::compile;
