//! DAC board expanders: the SPI DAC, the streaming DAC, and the
//! link-routed waveform DAC.

use serde::Deserialize;

use latc_core::registry::{DeviceRecord, Registry};

use crate::error::CompileError;
use crate::expand::{Expander, Slots, LINK_BOARD_LEDS};

const WAVEDAC_CHANNELS: u32 = 16;

/// The SPI DAC: bus master, load and clear strobes, board record.
pub(crate) fn expand_dac(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
) -> Result<u32, CompileError> {
    let name = expander.name("dac");
    let mut slots = Slots::new(base);
    registry.insert(
        format!("spi_{name}"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        format!("ttl_{name}_ldac"),
        DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        format!("ttl_{name}_clr"),
        DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        name.clone(),
        DeviceRecord::local("lattice.hw.dac", "Dac")
            .with_arg("spi_device", format!("spi_{name}"))
            .with_arg("ldac_device", format!("ttl_{name}_ldac"))
            .with_arg("clr_device", format!("ttl_{name}_clr")),
    )?;
    Ok(slots.used())
}

#[derive(Debug, Deserialize)]
pub(crate) struct FastdacParams {
    #[serde(default)]
    log2_width: u32,
}

/// The streaming DAC occupies a single wide channel.
pub(crate) fn expand_fastdac(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &FastdacParams,
) -> Result<u32, CompileError> {
    registry.insert(
        expander.name("fastdac"),
        DeviceRecord::local("lattice.hw.fastdac", "FastDac")
            .with_arg("channel", base)
            .with_arg("log2_width", params.log2_width),
    )?;
    Ok(1)
}

/// The link-routed waveform DAC owns its whole destination address space:
/// board LEDs first, then configuration and trigger channels, sixteen
/// bias/DDS channel pairs, and two SPI buses feeding the output relay and
/// the readback ADC.
pub(crate) fn expand_wavedac(
    expander: &mut Expander,
    registry: &mut Registry,
    destination: u32,
) -> Result<(), CompileError> {
    let name = expander.name("wavedac");
    let base = destination << 16;
    let leds = expander.add_board_leds(registry, base, Some(&name), LINK_BOARD_LEDS)?;
    let mut slots = Slots::new(base + leds);

    registry.insert(
        format!("{name}_config"),
        DeviceRecord::local("lattice.hw.wavedac", "Config").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        format!("{name}_trigger"),
        DeviceRecord::local("lattice.hw.wavedac", "Trigger").with_arg("channel", slots.take()),
    )?;
    for i in 0..WAVEDAC_CHANNELS {
        registry.insert(
            format!("{name}_dcbias{i}"),
            DeviceRecord::local("lattice.hw.wavedac", "DCBias").with_arg("channel", slots.take()),
        )?;
        registry.insert(
            format!("{name}_dds{i}"),
            DeviceRecord::local("lattice.hw.wavedac", "DDS").with_arg("channel", slots.take()),
        )?;
    }
    for (i, class) in ["Relay", "ADC"].iter().enumerate() {
        let spi = format!("{name}_spi{i}");
        registry.insert(
            spi.clone(),
            DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
        )?;
        registry.insert(
            format!("{name}_{}", class.to_lowercase()),
            DeviceRecord::local("lattice.hw.wavedac", class).with_arg("spi_device", spi),
        )?;
    }
    Ok(())
}
