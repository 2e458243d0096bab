//! Frequency synthesizer expanders: the quad-DDS board and the quad-PLL
//! board.

use serde::Deserialize;
use serde_json::Value;

use latc_core::registry::{DeviceRecord, Registry};

use crate::error::CompileError;
use crate::expand::{ClkSel, Expander, Slots};

const SYNTH_CHANNELS: u32 = 4;
const PLL_CHANNELS: u32 = 4;

/// Revisions of the doubler mezzanine that predate per-channel control.
const LEGACY_DOUBLER_REVS: [&str; 2] = ["v1.0", "v1.1"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DdsChip {
    #[default]
    Ad9910,
    Ad9912,
}

impl DdsChip {
    fn module(self) -> &'static str {
        match self {
            DdsChip::Ad9910 => "lattice.hw.ad9910",
            DdsChip::Ad9912 => "lattice.hw.ad9912",
        }
    }

    fn class(self) -> &'static str {
        match self {
            DdsChip::Ad9910 => "AD9910",
            DdsChip::Ad9912 => "AD9912",
        }
    }

    fn default_pll_n(self) -> u32 {
        match self {
            DdsChip::Ad9910 => 32,
            DdsChip::Ad9912 => 8,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SynthParams {
    /// Backplane ports the board occupies; a second port adds the
    /// output-enable switches.
    ports: Vec<u32>,
    #[serde(default)]
    synchronization: bool,
    #[serde(default = "default_true")]
    pll_en: bool,
    #[serde(default)]
    clk_sel: ClkSel,
    #[serde(default)]
    clk_div: Option<u32>,
    #[serde(default)]
    refclk: Option<f64>,
    #[serde(default)]
    pll_n: Option<u32>,
    #[serde(default)]
    pll_vco: Option<u32>,
    #[serde(default)]
    dds: DdsChip,
}

fn default_true() -> bool {
    true
}

/// The quad-DDS board: an EEPROM and bus master, an update strobe, the
/// CPLD controller cross-referencing both, and four DDS channels behind
/// SPI chip selects. Slot usage varies with synchronization and port
/// count; the EEPROM, controller and DDS channels are slot-free.
pub(crate) fn expand_synth(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &SynthParams,
) -> Result<u32, CompileError> {
    let name = expander.name("synth");
    let multi_port = params.ports.len() > 1;
    let first_port = *params.ports.first().ok_or_else(|| {
        CompileError::InvalidParameters {
            kind: "synth".to_string(),
            source: <serde_json::Error as serde::de::Error>::custom(
                "ports must name at least one backplane port",
            ),
        }
    })?;
    let mut slots = Slots::new(base);

    registry.insert(
        format!("eeprom_{name}"),
        DeviceRecord::local("lattice.hw.eeprom", "PortEeprom").with_arg("port", first_port),
    )?;
    registry.insert(
        format!("spi_{name}"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    if params.synchronization {
        registry.insert(
            format!("ttl_{name}_sync"),
            DeviceRecord::local("lattice.hw.ttl", "TTLClockGen")
                .with_arg("channel", slots.take())
                .with_arg("acc_width", 4u32),
        )?;
    }
    registry.insert(
        format!("ttl_{name}_io_update"),
        DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
    )?;
    if multi_port {
        for i in 0..SYNTH_CHANNELS {
            registry.insert(
                format!("ttl_{name}_sw{i}"),
                DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
            )?;
        }
    }

    let sync_device = if params.synchronization {
        Value::from(format!("ttl_{name}_sync"))
    } else {
        Value::Null
    };
    let clk_div = params
        .clk_div
        .unwrap_or(if params.pll_en { 0 } else { 1 });
    registry.insert(
        format!("{name}_cpld"),
        DeviceRecord::local("lattice.hw.synth", "CPLD")
            .with_arg("spi_device", format!("spi_{name}"))
            .with_arg("sync_device", sync_device)
            .with_arg("io_update_device", format!("ttl_{name}_io_update"))
            .with_arg("refclk", params.refclk.unwrap_or(expander.default_refclk()))
            .with_arg("clk_sel", params.clk_sel.to_value())
            .with_arg("clk_div", clk_div),
    )?;

    let pll_n = params.pll_n.unwrap_or(params.dds.default_pll_n());
    for i in 0..SYNTH_CHANNELS {
        let mut record = DeviceRecord::local(params.dds.module(), params.dds.class())
            .with_arg("pll_n", pll_n)
            .with_arg("pll_en", params.pll_en)
            .with_arg("chip_select", 4 + i)
            .with_arg("cpld_device", format!("{name}_cpld"));
        if multi_port {
            record = record.with_arg("sw_device", format!("ttl_{name}_sw{i}"));
        }
        if let Some(vco) = params.pll_vco {
            record = record.with_arg("pll_vco", vco);
        }
        if params.synchronization && params.dds == DdsChip::Ad9910 {
            let seed = format!("eeprom_{name}:{}", 64 + 4 * i);
            record = record
                .with_arg("sync_delay_seed", seed.clone())
                .with_arg("io_update_delay", seed);
        }
        registry.insert(format!("{name}_ch{i}"), record)?;
    }
    Ok(slots.used())
}

#[derive(Debug, Deserialize)]
pub(crate) struct PllParams {
    #[serde(default = "default_pll_refclk")]
    refclk: f64,
    #[serde(default)]
    clk_sel: ClkSel,
    /// Fit the frequency-doubler mezzanine.
    #[serde(default)]
    doubler: bool,
    #[serde(default = "default_doubler_hw_rev")]
    doubler_hw_rev: String,
}

fn default_pll_refclk() -> f64 {
    100e6
}

fn default_doubler_hw_rev() -> String {
    "v1.2".to_string()
}

/// The quad-PLL board: one bus master, four output switches, four PLL
/// chips (the `channel` argument is the chip index, not an address) and
/// the CPLD controller. Optionally the doubler mezzanine: one record per
/// chip on current revisions, a single legacy record on old ones.
pub(crate) fn expand_pll(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &PllParams,
) -> Result<u32, CompileError> {
    let name = expander.name("pll");
    let legacy_doubler = LEGACY_DOUBLER_REVS.contains(&params.doubler_hw_rev.as_str());
    let mut slots = Slots::new(base);

    registry.insert(
        format!("spi_{name}"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    for i in 0..PLL_CHANNELS {
        registry.insert(
            format!("ttl_{name}_sw{i}"),
            DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
        )?;
    }
    for i in 0..PLL_CHANNELS {
        registry.insert(
            format!("{name}_ch{i}"),
            DeviceRecord::local("lattice.hw.adf5356", "ADF5356")
                .with_arg("channel", i)
                .with_arg("sw_device", format!("ttl_{name}_sw{i}"))
                .with_arg("cpld_device", format!("{name}_cpld")),
        )?;
        if params.doubler && !legacy_doubler {
            registry.insert(
                format!("{name}_doubler{i}"),
                DeviceRecord::local("lattice.hw.doubler", "DoublerChannel")
                    .with_arg("host_cpld", format!("{name}_cpld"))
                    .with_arg("channel", i),
            )?;
        }
    }
    registry.insert(
        format!("{name}_cpld"),
        DeviceRecord::local("lattice.hw.pll", "Pll")
            .with_arg("spi_device", format!("spi_{name}"))
            .with_arg("refclk", params.refclk)
            .with_arg("clk_sel", params.clk_sel.to_value()),
    )?;
    if params.doubler && legacy_doubler {
        registry.insert(
            format!("{name}_doubler"),
            DeviceRecord::local("lattice.hw.doubler", "DoublerLegacy")
                .with_arg("host_cpld", format!("{name}_cpld")),
        )?;
    }
    Ok(slots.used())
}
