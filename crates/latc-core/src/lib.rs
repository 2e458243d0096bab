//! Topology description schema and device registry model for latc.
//!
//! This crate holds the two data models the compiler bridges between:
//! the hierarchical, human-authored [`description`] of a control system's
//! hardware, and the flat [`registry`] of resolved device records the
//! lattice runtime consumes. Serialization of the finished registry lives
//! in [`emit`], decoupled from the model itself.

pub mod description;
pub mod emit;
pub mod registry;

pub use description::{DescriptionError, NodeDescription, NodeRole, PeripheralDescription};
pub use registry::{Arguments, DeviceRecord, Registry, RegistryError};
