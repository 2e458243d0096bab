//! Peripheral expanders.
//!
//! One expansion rule per board type, dispatched over a closed tag set.
//! Each expander turns `(base address, parameters)` into device records
//! appended to the registry and reports how many address slots it
//! consumed. Expanders draw names from the shared allocator, so they are
//! strictly sequential: call order is part of the output.

mod analog;
mod dac;
mod digital;
mod misc;
mod synth;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use latc_core::description::{NodeDescription, PeripheralDescription};
use latc_core::registry::{DeviceRecord, Registry};

use crate::context::NameAllocator;
use crate::error::CompileError;

/// Number of status LEDs carried by a link-routed board.
const LINK_BOARD_LEDS: u32 = 2;

/// Expands peripheral descriptions into device records.
///
/// Owns the build's name allocator and the primary node's link frequency,
/// which serves as the default reference clock for synthesizer boards.
pub struct Expander {
    names: NameAllocator,
    default_refclk: f64,
}

impl Expander {
    pub fn new(primary: &NodeDescription) -> Self {
        Expander {
            names: NameAllocator::new(),
            default_refclk: primary.link_frequency,
        }
    }

    /// Expand one local peripheral at `base`, returning the number of
    /// address slots consumed.
    pub fn expand(
        &mut self,
        registry: &mut Registry,
        base: u32,
        peripheral: &PeripheralDescription,
    ) -> Result<u32, CompileError> {
        match peripheral.kind.as_str() {
            "dio" => digital::expand_dio(self, registry, base, &parameters(peripheral)?),
            "dio_spi" => digital::expand_dio_spi(self, registry, base, &parameters(peripheral)?),
            "hvamp" => digital::expand_hvamp(self, registry, base),
            "synth" => synth::expand_synth(self, registry, base, &parameters(peripheral)?),
            "pll" => synth::expand_pll(self, registry, base, &parameters(peripheral)?),
            "sampler" => analog::expand_sampler(self, registry, base, &parameters(peripheral)?),
            "digitizer" => analog::expand_digitizer(self, registry, base),
            "servo" => analog::expand_servo(self, registry, base, &parameters(peripheral)?),
            "dac" => dac::expand_dac(self, registry, base),
            "fastdac" => dac::expand_fastdac(self, registry, base, &parameters(peripheral)?),
            "grabber" => misc::expand_grabber(self, registry, base),
            "awg" => misc::expand_awg(self, registry, base, &parameters(peripheral)?),
            kind => Err(CompileError::UnsupportedPeripheralType {
                kind: kind.to_string(),
            }),
        }
    }

    /// Expand a link-routed board inside its own destination address
    /// space. The board is a network endpoint of its own: its status LEDs
    /// come first, then its channels.
    pub fn expand_link_board(
        &mut self,
        registry: &mut Registry,
        destination: u32,
        peripheral: &PeripheralDescription,
    ) -> Result<(), CompileError> {
        match peripheral.kind.as_str() {
            "wavedac" => dac::expand_wavedac(self, registry, destination),
            kind => Err(CompileError::UnsupportedPeripheralType {
                kind: kind.to_string(),
            }),
        }
    }

    /// Append `count` status-LED records at consecutive channels from
    /// `base`. Node LEDs share the `led` category; a link board's LEDs
    /// are named after the board.
    pub fn add_board_leds(
        &mut self,
        registry: &mut Registry,
        base: u32,
        board: Option<&str>,
        count: u32,
    ) -> Result<u32, CompileError> {
        let category = match board {
            Some(board) => format!("{board}_led"),
            None => "led".to_string(),
        };
        for i in 0..count {
            let name = self.name(&category);
            registry.insert(
                name,
                DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", base + i),
            )?;
        }
        Ok(count)
    }

    pub(crate) fn name(&mut self, category: &str) -> String {
        self.names.allocate(category)
    }

    pub(crate) fn default_refclk(&self) -> f64 {
        self.default_refclk
    }
}

/// Deserialize a peripheral's parameter bag into its type's schema.
fn parameters<T: DeserializeOwned>(
    peripheral: &PeripheralDescription,
) -> Result<T, CompileError> {
    serde_json::from_value(peripheral.parameter_bag()).map_err(|source| {
        CompileError::InvalidParameters {
            kind: peripheral.kind.clone(),
            source,
        }
    })
}

/// Running channel assignment within one expansion.
pub(crate) struct Slots {
    base: u32,
    used: u32,
}

impl Slots {
    pub(crate) fn new(base: u32) -> Self {
        Slots { base, used: 0 }
    }

    /// Claim the next channel address.
    pub(crate) fn take(&mut self) -> u32 {
        let channel = self.base + self.used;
        self.used += 1;
        channel
    }

    pub(crate) fn used(&self) -> u32 {
        self.used
    }
}

/// Reference clock selector: a mux index or a named source.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ClkSel {
    Index(u32),
    Source(String),
}

impl Default for ClkSel {
    fn default() -> Self {
        ClkSel::Index(0)
    }
}

impl ClkSel {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            ClkSel::Index(i) => Value::from(*i),
            ClkSel::Source(name) => Value::from(name.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use latc_core::description::{NodeDescription, PeripheralDescription};

    pub(crate) fn primary(link_frequency: f64) -> NodeDescription {
        serde_json::from_str(&format!(
            r#"{{
                "variant": "test",
                "role": "master",
                "target": "vertex",
                "hw_rev": "v2.0",
                "link_frequency": {link_frequency}
            }}"#
        ))
        .unwrap()
    }

    pub(crate) fn peripheral(json: serde_json::Value) -> PeripheralDescription {
        serde_json::from_value(json).unwrap()
    }
}
