//! Digital I/O expanders: TTL banks, SPI carriers, HV amplifier switches.

use serde::Deserialize;

use latc_core::registry::{DeviceRecord, Registry};

use crate::error::CompileError;
use crate::expand::{Expander, Slots};

const DIO_CHANNELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BankDirection {
    Input,
    Output,
    Clkgen,
}

impl BankDirection {
    fn class(self) -> &'static str {
        match self {
            BankDirection::Input => "TTLInOut",
            BankDirection::Output => "TTLOut",
            BankDirection::Clkgen => "TTLClockGen",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DioParams {
    bank_direction_low: BankDirection,
    bank_direction_high: BankDirection,
    #[serde(default)]
    edge_counter: bool,
}

/// An 8-channel TTL bank. Each channel takes one slot; edge counters are
/// companion records on the same channel and take none.
pub(crate) fn expand_dio(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &DioParams,
) -> Result<u32, CompileError> {
    let banks = [params.bank_direction_low, params.bank_direction_high];
    let names: Vec<String> = (0..DIO_CHANNELS).map(|_| expander.name("ttl")).collect();
    let mut slots = Slots::new(base);
    let mut channels = Vec::with_capacity(DIO_CHANNELS);
    for (i, name) in names.iter().enumerate() {
        let channel = slots.take();
        channels.push(channel);
        registry.insert(
            name.clone(),
            DeviceRecord::local("lattice.hw.ttl", banks[i / 4].class()).with_arg("channel", channel),
        )?;
    }
    if params.edge_counter {
        for (i, name) in names.iter().enumerate() {
            if banks[i / 4] == BankDirection::Input {
                registry.insert(
                    format!("{name}_counter"),
                    DeviceRecord::local("lattice.hw.edge_counter", "EdgeCounter")
                        .with_arg("channel", channels[i]),
                )?;
            }
        }
    }
    Ok(slots.used())
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TtlDirection {
    Input,
    Output,
}

impl TtlDirection {
    fn class(self) -> &'static str {
        match self {
            TtlDirection::Input => "TTLInOut",
            TtlDirection::Output => "TTLOut",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpiBusParams {
    #[serde(default = "default_spi_name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpiTtlParams {
    #[serde(default = "default_ttl_name")]
    name: String,
    direction: TtlDirection,
    #[serde(default)]
    edge_counter: bool,
}

fn default_spi_name() -> String {
    "spi".to_string()
}

fn default_ttl_name() -> String {
    "ttl".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct DioSpiParams {
    #[serde(default)]
    spi: Vec<SpiBusParams>,
    #[serde(default)]
    ttl: Vec<SpiTtlParams>,
}

/// An SPI carrier: a bus master per SPI header, a TTL per pin.
pub(crate) fn expand_dio_spi(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
    params: &DioSpiParams,
) -> Result<u32, CompileError> {
    let mut slots = Slots::new(base);
    for bus in &params.spi {
        registry.insert(
            expander.name(&bus.name),
            DeviceRecord::local("lattice.hw.spi", "SPIMaster").with_arg("channel", slots.take()),
        )?;
    }
    for ttl in &params.ttl {
        let name = expander.name(&ttl.name);
        let channel = slots.take();
        registry.insert(
            name.clone(),
            DeviceRecord::local("lattice.hw.ttl", ttl.direction.class())
                .with_arg("channel", channel),
        )?;
        if ttl.edge_counter {
            registry.insert(
                format!("{name}_counter"),
                DeviceRecord::local("lattice.hw.edge_counter", "EdgeCounter")
                    .with_arg("channel", channel),
            )?;
        }
    }
    Ok(slots.used())
}

/// A bank of 8 high-voltage amplifier enable switches.
pub(crate) fn expand_hvamp(
    expander: &mut Expander,
    registry: &mut Registry,
    base: u32,
) -> Result<u32, CompileError> {
    let name = expander.name("hvamp");
    let mut slots = Slots::new(base);
    for i in 0..8 {
        registry.insert(
            format!("ttl_{name}_sw{i}"),
            DeviceRecord::local("lattice.hw.ttl", "TTLOut").with_arg("channel", slots.take()),
        )?;
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
    fn dio_mixed_banks() {
        let (registry, consumed) = expand(
            json!({"type": "dio", "bank_direction_low": "input", "bank_direction_high": "output"}),
            16,
        );
        assert_eq!(consumed, 8);
        assert_eq!(registry.len(), 8);

        let low = registry.get("ttl0").unwrap();
        assert_eq!(low.arguments().unwrap()["channel"], 16);
        let serialized = serde_json::to_value(low).unwrap();
        assert_eq!(serialized["class"], "TTLInOut");

        let high = serde_json::to_value(registry.get("ttl4").unwrap()).unwrap();
        assert_eq!(high["class"], "TTLOut");
        assert_eq!(high["arguments"]["channel"], 20);
    }

    #[test]
    fn dio_edge_counters_share_channels() {
        let (registry, consumed) = expand(
            json!({
                "type": "dio",
                "bank_direction_low": "input",
                "bank_direction_high": "input",
                "edge_counter": true
            }),
            0,
        );
        // 8 channels + 8 companion counters, still 8 slots
        assert_eq!(consumed, 8);
        assert_eq!(registry.len(), 16);
        for i in 0..8u32 {
            let ttl = registry.get(&format!("ttl{i}")).unwrap().arguments().unwrap();
            let counter = registry
                .get(&format!("ttl{i}_counter"))
                .unwrap()
                .arguments()
                .unwrap();
            assert_eq!(ttl["channel"], counter["channel"]);
        }
    }

    #[test]
    fn dio_output_banks_get_no_counters() {
        let (registry, _) = expand(
            json!({
                "type": "dio",
                "bank_direction_low": "output",
                "bank_direction_high": "input",
                "edge_counter": true
            }),
            0,
        );
        assert!(registry.get("ttl0_counter").is_none());
        assert!(registry.get("ttl4_counter").is_some());
        assert_eq!(registry.len(), 12);
    }

    #[test]
    fn dio_spi_mixed_carrier() {
        let (registry, consumed) = expand(
            json!({
                "type": "dio_spi",
                "spi": [{"name": "motor_spi"}],
                "ttl": [
                    {"name": "shutter", "direction": "output"},
                    {"name": "gate", "direction": "input", "edge_counter": true}
                ]
            }),
            4,
        );
        assert_eq!(consumed, 3);
        assert_eq!(registry.get("motor_spi0").unwrap().arguments().unwrap()["channel"], 4);
        assert_eq!(registry.get("shutter0").unwrap().arguments().unwrap()["channel"], 5);
        let gate = registry.get("gate0").unwrap().arguments().unwrap();
        let counter = registry.get("gate0_counter").unwrap().arguments().unwrap();
        assert_eq!(gate["channel"], 6);
        assert_eq!(gate["channel"], counter["channel"]);
    }

    #[test]
    fn hvamp_switch_bank() {
        let (registry, consumed) = expand(json!({"type": "hvamp"}), 32);
        assert_eq!(consumed, 8);
        assert_eq!(
            registry.get("ttl_hvamp0_sw7").unwrap().arguments().unwrap()["channel"],
            39
        );
    }
}
