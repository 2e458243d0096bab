//! Destination assignment for link-routed peripherals.

use latc_core::description::{NodeDescription, PeripheralDescription};

use crate::error::CompileError;

/// Resolve a destination index for every link-routed peripheral, in
/// collection order (primary node's first, then satellites' in input
/// order).
///
/// Boards with an explicit `link_destination` keep it. The rest receive
/// consecutive indices counted from the primary platform's destination
/// base; explicitly destined boards do not advance the counter. The base
/// is an opaque platform/revision lookup, only consulted when at least
/// one board actually needs it.
pub fn resolve_destinations(
    primary: &NodeDescription,
    peripherals: &[&PeripheralDescription],
) -> Result<Vec<u32>, CompileError> {
    let mut destinations = Vec::with_capacity(peripherals.len());
    let mut undestined = 0u32;
    for peripheral in peripherals {
        match peripheral.link_destination {
            Some(destination) => destinations.push(destination),
            None => {
                let base = latc_targets::link_destination_base(primary)?;
                destinations.push(base + undestined);
                undestined += 1;
            }
        }
    }
    Ok(destinations)
}
