//! The topology walker: orchestrates one registry build.
//!
//! Three ordered phases: header, local peripherals (primary node then
//! each satellite in input order), link-routed peripherals. Ordering is
//! the whole contract; names and addresses fall out of the walk order.

use std::collections::BTreeMap;

use serde_json::Value;

use latc_core::description::{NodeDescription, NodeRole, PeripheralDescription};
use latc_core::registry::{Arguments, DeviceRecord, Registry};
use latc_targets::LINK_BOARD_CPU_TARGET;

use crate::context::AddressCursor;
use crate::error::CompileError;
use crate::expand::Expander;
use crate::resolve::resolve_destinations;

/// Compile a topology into a device registry.
///
/// `satellites` pairs each satellite's link destination index with its
/// description, in input order.
pub fn compile(
    primary: &NodeDescription,
    satellites: &[(u32, NodeDescription)],
) -> Result<Registry, CompileError> {
    if primary.role == NodeRole::Satellite {
        return Err(CompileError::InvalidRole {
            role: primary.role,
            position: "primary node".to_string(),
        });
    }
    if primary.role == NodeRole::Standalone && !satellites.is_empty() {
        return Err(CompileError::InvalidTopology {
            reason: "a standalone system cannot have satellites".to_string(),
        });
    }

    let mut registry = Registry::new(&primary.variant);
    emit_header(&mut registry, primary)?;

    let mut expander = Expander::new(primary);
    let mut satellite_targets: BTreeMap<u32, String> = BTreeMap::new();
    let mut link_boards: Vec<&PeripheralDescription> = Vec::new();

    // Local-peripheral phase, primary node first.
    let (local, link) = split_link_routed(&primary.peripherals);
    link_boards.extend(link);
    registry.begin_section(&format!("{} peripherals", primary.role), None);
    expand_node(&mut expander, &mut registry, AddressCursor::local(), primary, &local)?;

    for (destination, description) in satellites {
        if description.role != NodeRole::Satellite {
            return Err(CompileError::InvalidRole {
                role: description.role,
                position: format!("satellite at destination {destination}"),
            });
        }
        let (local, link) = split_link_routed(&description.peripherals);
        link_boards.extend(link);
        satellite_targets.insert(*destination, latc_targets::cpu_target(description)?.to_string());
        registry.begin_section(&format!("DEST#{destination} peripherals"), Some(*destination));
        expand_node(
            &mut expander,
            &mut registry,
            AddressCursor::link(*destination),
            description,
            &local,
        )?;
    }

    // Link-routed phase: each board is its own endpoint.
    let destinations = resolve_destinations(primary, &link_boards)?;
    for (peripheral, destination) in link_boards.iter().zip(destinations) {
        satellite_targets.insert(destination, LINK_BOARD_CPU_TARGET.to_string());
        registry.begin_section(&format!("DEST#{destination} peripherals"), Some(destination));
        expander.expand_link_board(&mut registry, destination, peripheral)?;
    }

    let table: Arguments = satellite_targets
        .into_iter()
        .map(|(destination, target)| (destination.to_string(), Value::from(target)))
        .collect();
    registry.set_local_argument("core", "satellite_cpu_targets", Value::Object(table))?;
    Ok(registry)
}

/// Expand one node's local peripherals in order, then its status LEDs at
/// the final offset.
fn expand_node(
    expander: &mut Expander,
    registry: &mut Registry,
    mut cursor: AddressCursor,
    description: &NodeDescription,
    peripherals: &[&PeripheralDescription],
) -> Result<(), CompileError> {
    for peripheral in peripherals {
        let consumed = expander.expand(registry, cursor.position(), peripheral)?;
        cursor.reserve(consumed);
    }
    let leds = latc_targets::led_count(description)?;
    expander.add_board_leds(registry, cursor.position(), None, leds)?;
    cursor.reserve(leds);
    Ok(())
}

fn split_link_routed(
    peripherals: &[PeripheralDescription],
) -> (Vec<&PeripheralDescription>, Vec<&PeripheralDescription>) {
    peripherals.iter().partition(|p| !p.is_link_routed())
}

/// Header phase: the core device plus the fixed service entries.
fn emit_header(registry: &mut Registry, primary: &NodeDescription) -> Result<(), CompileError> {
    let addr = &primary.core_addr;
    registry.insert(
        "core".to_string(),
        DeviceRecord::local("lattice.hw.core", "Core")
            .with_arg("host", addr.clone())
            .with_arg("ref_period", 1.0 / (8.0 * primary.link_frequency))
            .with_arg("analyzer_proxy", "core_analyzer")
            .with_arg("target", latc_targets::cpu_target(primary)?)
            .with_arg("satellite_cpu_targets", Value::Object(Arguments::new())),
    )?;
    registry.insert(
        "core_log".to_string(),
        DeviceRecord::controller(
            "::1",
            1068,
            format!("lattice_corelog -p {{port}} --bind {{bind}} {addr}"),
        ),
    )?;
    registry.insert(
        "core_monitor".to_string(),
        DeviceRecord::controller(
            "::1",
            1384,
            format!(
                "lattice_monitor_proxy --port-proxy {{port_proxy}} --port-control {{port}} --bind {{bind}} {addr}"
            ),
        )
        .with_port_proxy(1383),
    )?;
    registry.insert(
        "core_analyzer".to_string(),
        DeviceRecord::controller(
            "::1",
            1386,
            format!(
                "lattice_analyzer_proxy --port-proxy {{port_proxy}} --port-control {{port}} --bind {{bind}} {addr}"
            ),
        )
        .with_port_proxy(1385),
    )?;
    registry.insert(
        "core_cache".to_string(),
        DeviceRecord::local("lattice.hw.cache", "CoreCache"),
    )?;
    registry.insert(
        "core_dma".to_string(),
        DeviceRecord::local("lattice.hw.dma", "CoreDMA"),
    )?;
    registry.insert(
        "i2c_switch0".to_string(),
        DeviceRecord::local("lattice.hw.i2c", "I2CSwitch").with_arg("address", 0xe0u32),
    )?;
    registry.insert(
        "i2c_switch1".to_string(),
        DeviceRecord::local("lattice.hw.i2c", "I2CSwitch").with_arg("address", 0xe2u32),
    )?;
    Ok(())
}
