//! CPU target, LED and link-destination tables.

use latc_core::description::{NodeDescription, NodeRole};

use crate::error::{Result, TargetError};

/// CPU target of a link-routed wavedac endpoint.
pub const LINK_BOARD_CPU_TARGET: &str = "rv32g";

fn unsupported(description: &NodeDescription) -> TargetError {
    TargetError::UnsupportedPlatform {
        target: description.target.clone(),
        hw_rev: description.hw_rev.clone(),
    }
}

/// CPU target identifier for a node.
pub fn cpu_target(description: &NodeDescription) -> Result<&'static str> {
    match description.target.as_str() {
        "vertex" => match description.hw_rev.as_str() {
            "v1.0" | "v1.1" => Ok("rv32ima"),
            _ => Ok("rv32g"),
        },
        "vertex_soc" => Ok("cortexa9"),
        _ => Err(unsupported(description)),
    }
}

/// Number of user LEDs on a node's front panel.
///
/// On vertex v1.0/v1.1 three LEDs carry link status whenever the node is
/// part of a link topology, leaving fewer for the user.
pub fn led_count(description: &NodeDescription) -> Result<u32> {
    match description.target.as_str() {
        "vertex" => {
            let board_leds = match description.hw_rev.as_str() {
                "v1.0" => 4,
                "v1.1" => 6,
                "v2.0" => 3,
                _ => return Err(unsupported(description)),
            };
            let legacy = matches!(description.hw_rev.as_str(), "v1.0" | "v1.1");
            if legacy && description.role != NodeRole::Standalone {
                Ok(board_leds - 3)
            } else {
                Ok(board_leds)
            }
        }
        "vertex_soc" => Ok(2),
        _ => Err(unsupported(description)),
    }
}

/// First link destination index handed to peripherals without an explicit
/// one. Encodes how many endpoints the primary's gateware already claims.
pub fn link_destination_base(description: &NodeDescription) -> Result<u32> {
    match description.target.as_str() {
        "vertex" => match description.hw_rev.as_str() {
            "v1.0" | "v1.1" => Ok(3),
            _ => Ok(4),
        },
        "vertex_soc" => Ok(5),
        _ => Err(unsupported(description)),
    }
}
