//! Analog front-end expanders: ADC boards and the closed-loop servo.

use serde::Deserialize;
use serde_json::Value;

use latc_core::registry::{DeviceRecord, Registry};

use crate::error::CompileError;
use crate::expand::{ClkSel, Expander, Slots};

const SERVO_CHANNELS: u32 = 8;
const SERVO_SYNTH_BOARDS: usize = 2;

fn default_hw_rev() -> String {
    "v2.2".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SamplerParams {
    #[serde(default = "default_hw_rev")]
    hw_rev: String,
}

/// The 8-channel ADC with a programmable-gain input stage: two bus
/// masters, a conversion strobe, and the board record tying them together.
pub(crate) fn expand_sampler(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &SamplerParams,
) -> Result<u32, CompileError> {
    let name = expander.name("sampler");
    let mut slots = Slots::new(base);
    registry.insert(
        format!("spi_{name}_adc"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        format!("spi_{name}_pgia"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        format!("ttl_{name}_cnv"),
        DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        name.clone(),
        DeviceRecord::local("lattice.hw.sampler", "Sampler")
            .with_arg("spi_adc_device", format!("spi_{name}_adc"))
            .with_arg("spi_pgia_device", format!("spi_{name}_pgia"))
            .with_arg("cnv_device", format!("ttl_{name}_cnv"))
            .with_arg("hw_rev", params.hw_rev.clone()),
    )?;
    Ok(slots.used())
}

/// The plain ADC board: one bus master and a conversion strobe.
pub(crate) fn expand_digitizer(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
) -> Result<u32, CompileError> {
    let name = expander.name("digitizer");
    let mut slots = Slots::new(base);
    registry.insert(
        format!("spi_{name}_adc"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        format!("ttl_{name}_cnv"),
        DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
    )?;
    registry.insert(
        name.clone(),
        DeviceRecord::local("lattice.hw.digitizer", "Digitizer")
            .with_arg("spi_adc_device", format!("spi_{name}_adc"))
            .with_arg("cnv_device", format!("ttl_{name}_cnv")),
    )?;
    Ok(slots.used())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServoParams {
    #[serde(default = "default_hw_rev")]
    sampler_hw_rev: String,
    #[serde(default = "default_servo_pll_n")]
    pll_n: u32,
    #[serde(default = "default_true")]
    pll_en: bool,
    #[serde(default)]
    clk_sel: ClkSel,
    #[serde(default)]
    refclk: Option<f64>,
    #[serde(default)]
    pll_vco: Option<u32>,
}

fn default_servo_pll_n() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

/// The closed-loop servo spans an ADC front end and two synthesizer
/// boards: eight loop channels, the servo record cross-referencing the
/// gain stage and both synthesizers, then the bus masters and single-DDS
/// records the loop drives directly.
pub(crate) fn expand_servo(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &ServoParams,
) -> Result<u32, CompileError> {
    let servo = expander.name("servo");
    let sampler = expander.name("sampler");
    let synths: Vec<String> = (0..SERVO_SYNTH_BOARDS)
        .map(|_| expander.name("synth"))
        .collect();
    let mut slots = Slots::new(base);

    for i in 0..SERVO_CHANNELS {
        registry.insert(
            format!("{servo}_ch{i}"),
            DeviceRecord::local("lattice.hw.servo", "Channel")
                .with_arg("channel", slots.take())
                .with_arg("servo_device", servo.clone()),
        )?;
    }
    let cpld_names: Vec<Value> = synths
        .iter()
        .map(|s| Value::from(format!("{s}_cpld")))
        .collect();
    let dds_names: Vec<Value> = synths
        .iter()
        .map(|s| Value::from(format!("{s}_dds")))
        .collect();
    registry.insert(
        servo.clone(),
        DeviceRecord::local("lattice.hw.servo", "Servo")
            .with_arg("channel", slots.take())
            .with_arg("pgia_device", format!("spi_{sampler}_pgia"))
            .with_arg("cpld_devices", cpld_names)
            .with_arg("dds_devices", dds_names)
            .with_arg("sampler_hw_rev", params.sampler_hw_rev.clone()),
    )?;
    registry.insert(
        format!("spi_{sampler}_pgia"),
        DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
    )?;
    for synth in &synths {
        registry.insert(
            format!("spi_{synth}"),
            DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
        )?;
        registry.insert(
            format!("{synth}_cpld"),
            DeviceRecord::local("lattice.hw.synth", "CPLD")
                .with_arg("spi_device", format!("spi_{synth}"))
                .with_arg("refclk", params.refclk.unwrap_or(expander.default_refclk()))
                .with_arg("clk_sel", params.clk_sel.to_value()),
        )?;
        let mut dds = DeviceRecord::local("lattice.hw.ad9910", "AD9910")
            .with_arg("pll_n", params.pll_n)
            .with_arg("pll_en", params.pll_en)
            .with_arg("chip_select", 3u32)
            .with_arg("cpld_device", format!("{synth}_cpld"));
        if let Some(vco) = params.pll_vco {
            dds = dds.with_arg("pll_vco", vco);
        }
        registry.insert(format!("{synth}_dds"), dds)?;
    }
    Ok(slots.used())
}

#[cfg(test)]
mod tests {
    use crate::expand::testutil::{peripheral, primary};
    use crate::expand::Expander;
    use latc_core::registry::Registry;
    use serde_json::json;

    fn expand(json: serde_json::Value, base: u32) -> (Registry, u32) {
        let mut expander = Expander::new(&primary(125e6));
        let mut registry = Registry::new("test");
        let consumed = expander
            .expand(&mut registry, base, &peripheral(json))
            .unwrap();
        (registry, consumed)
    }

    #[test]
    fn sampler_default_revision() {
        let (registry, consumed) = expand(json!({"type": "sampler"}), 10);
        assert_eq!(consumed, 3);
        let board = registry.get("sampler0").unwrap().arguments().unwrap();
        assert_eq!(board["hw_rev"], "v2.2");
        assert_eq!(board["spi_adc_device"], "spi_sampler0_adc");
        assert_eq!(registry.get("spi_sampler0_adc").unwrap().arguments().unwrap()["channel"], 10);
        assert_eq!(registry.get("spi_sampler0_pgia").unwrap().arguments().unwrap()["channel"], 11);
        assert_eq!(registry.get("ttl_sampler0_cnv").unwrap().arguments().unwrap()["channel"], 12);
    }

    #[test]
    fn digitizer_layout() {
        let (registry, consumed) = expand(json!({"type": "digitizer"}), 0);
        assert_eq!(consumed, 2);
        let board = registry.get("digitizer0").unwrap().arguments().unwrap();
        assert_eq!(board["cnv_device"], "ttl_digitizer0_cnv");
        assert!(board.get("spi_pgia_device").is_none());
    }

    #[test]
    fn servo_spans_three_boards() {
        let (registry, consumed) = expand(json!({"type": "servo", "pll_vco": 765}), 0);
        assert_eq!(consumed, 12);
        assert_eq!(registry.len(), 8 + 1 + 1 + 2 * 3);

        for i in 0..8u32 {
            let ch = registry
                .get(&format!("servo0_ch{i}"))
                .unwrap()
                .arguments()
                .unwrap();
            assert_eq!(ch["channel"], i);
            assert_eq!(ch["servo_device"], "servo0");
        }
        let servo = registry.get("servo0").unwrap().arguments().unwrap();
        assert_eq!(servo["channel"], 8);
        assert_eq!(servo["pgia_device"], "spi_sampler0_pgia");
        assert_eq!(servo["cpld_devices"], json!(["synth0_cpld", "synth1_cpld"]));
        assert_eq!(servo["dds_devices"], json!(["synth0_dds", "synth1_dds"]));
        assert_eq!(servo["sampler_hw_rev"], "v2.2");

        assert_eq!(registry.get("spi_sampler0_pgia").unwrap().arguments().unwrap()["channel"], 9);
        assert_eq!(registry.get("spi_synth0").unwrap().arguments().unwrap()["channel"], 10);
        assert_eq!(registry.get("spi_synth1").unwrap().arguments().unwrap()["channel"], 11);

        let dds = registry.get("synth1_dds").unwrap().arguments().unwrap();
        assert_eq!(dds["chip_select"], 3);
        assert_eq!(dds["pll_n"], 32);
        assert_eq!(dds["pll_vco"], 765);
        assert_eq!(dds["cpld_device"], "synth1_cpld");
    }

    #[test]
    fn servo_then_synth_share_the_category_counter() {
        let mut expander = Expander::new(&primary(125e6));
        let mut registry = Registry::new("test");
        let consumed = expander
            .expand(&mut registry, 0, &peripheral(json!({"type": "servo"})))
            .unwrap();
        expander
            .expand(&mut registry, consumed, &peripheral(json!({"type": "synth", "ports": [1]})))
            .unwrap();
        // the standalone synth board continues after the servo's two
        assert!(registry.contains("synth2_cpld"));
        assert!(registry.contains("synth2_ch0"));
    }
}
