//! Target platform lookup tables for latc.
//!
//! Everything here is a fixed table keyed by `(target, hw_rev)`. The
//! numbers encode board facts (CPU core, LED population, how many link
//! endpoints the gateware reserves) that cannot be derived from a
//! description document, so they are preserved as opaque lookups.

pub mod error;
pub mod platform;

pub use error::TargetError;
pub use platform::{cpu_target, led_count, link_destination_base, LINK_BOARD_CPU_TARGET};
