//! Frame grabber and waveform generator expanders.

use serde::Deserialize;
use serde_json::json;

use latc_core::registry::{DeviceRecord, Registry};

use crate::error::CompileError;
use crate::expand::Expander;

/// Gateware revision identifiers reported to the waveform generator
/// driver.
const AWG_GW_BASE: u32 = 1;
const AWG_GW_IQ: u32 = 2;

/// The frame grabber: one record, two slots (frame data and ROI engine).
pub(crate) fn expand_grabber(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
) -> Result<u32, CompileError> {
    registry.insert(
        expander.name("grabber"),
        DeviceRecord::local("lattice.hw.grabber", "Grabber").with_arg("channel_base", base),
    )?;
    Ok(2)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AwgMode {
    #[default]
    Base,
    Iq,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AwgParams {
    #[serde(default)]
    mode: AwgMode,
}

/// The waveform generator. The IQ gateware folds the upconverter into the
/// DAC datapath: fewer channels, plus a fixed DAC PLL configuration.
pub(crate) fn expand_awg(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &AwgParams,
) -> Result<u32, CompileError> {
    let mut record = DeviceRecord::local("lattice.hw.awg", "Awg")
        .with_arg("channel_base", base)
        .with_arg("miso_delay", 1u32);
    let consumed = match params.mode {
        AwgMode::Base => {
            record = record.with_arg("gw_rev", AWG_GW_BASE);
            5
        }
        AwgMode::Iq => {
            record = record
                .with_arg("dac", json!({"pll_m": 16, "pll_n": 3, "interpolation": 2}))
                .with_arg("gw_rev", AWG_GW_IQ);
            3
        }
    };
    registry.insert(expander.name("awg"), record)?;
    Ok(consumed)
}
