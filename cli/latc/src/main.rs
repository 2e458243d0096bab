//! latc — compile hardware topology descriptions into a device registry.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};

use latc_core::description::NodeDescription;
use latc_core::emit;

#[derive(Parser)]
#[command(name = "latc", version, about = "Device registry builder for lattice control systems")]
struct Cli {
    /// JSON system description for the primary (standalone or master) node
    #[arg(value_name = "PRIMARY_DESCRIPTION")]
    primary_description: PathBuf,

    /// Output file, defaults to standard output if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Add a link satellite at the given destination number with devices
    /// from the given JSON description
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["DESTINATION", "DESCRIPTION"],
        action = ArgAction::Append
    )]
    satellite: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "script")]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Assignment-statement script
    Script,
    /// Pretty JSON document
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let primary = NodeDescription::load(&cli.primary_description)?;

    let mut satellites = Vec::new();
    for pair in cli.satellite.chunks_exact(2) {
        let destination = parse_destination(&pair[0])?;
        let description = NodeDescription::load(Path::new(&pair[1]))?;
        satellites.push((destination, description));
    }

    let registry = latc_compile::compile(&primary, &satellites)?;
    let rendered = match cli.format {
        Format::Script => emit::to_script(&registry),
        Format::Json => emit::to_json(&registry)?,
    };

    match &cli.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

/// Destination indices accept decimal or 0x-prefixed hex.
fn parse_destination(text: &str) -> Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid destination index: {text}"))
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::io::Write;

    fn write_description(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    fn master_description(dir: &Path) -> PathBuf {
        write_description(
            dir,
            "master.json",
            r#"{
                "variant": "bench",
                "role": "master",
                "target": "vertex",
                "hw_rev": "v2.0",
                "core_addr": "10.0.10.2",
                "peripherals": [
                    {"type": "dio", "bank_direction_low": "input",
                     "bank_direction_high": "output", "edge_counter": true},
                    {"type": "wavedac"}
                ]
            }"#,
        )
    }

    fn satellite_description(dir: &Path) -> PathBuf {
        write_description(
            dir,
            "satellite.json",
            r#"{
                "variant": "sat",
                "role": "satellite",
                "target": "vertex",
                "hw_rev": "v2.0",
                "peripherals": [{"type": "dac"}]
            }"#,
        )
    }

    /// Full build: primary + one satellite, JSON output file.
    #[test]
    fn compile_to_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("registry.json");

        run(Cli {
            primary_description: master_description(dir.path()),
            output: Some(output.clone()),
            satellite: vec![
                "1".to_string(),
                satellite_description(dir.path()).display().to_string(),
            ],
            format: Format::Json,
        })
        .unwrap();

        let registry: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(registry["core"]["arguments"]["host"], "10.0.10.2");
        assert_eq!(registry["ttl0"]["arguments"]["channel"], 0);
        assert_eq!(registry["spi_dac0"]["arguments"]["channel"], 0x010000);
        // the undestined wavedac resolves to the v2.0 base
        assert_eq!(registry["wavedac0_led0"]["arguments"]["channel"], 0x040000);
        assert_eq!(
            registry["core"]["arguments"]["satellite_cpu_targets"],
            serde_json::json!({"1": "rv32g", "4": "rv32g"})
        );
    }

    /// Script output carries the header binding and section comments.
    #[test]
    fn compile_to_script_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("registry.py");

        run(Cli {
            primary_description: master_description(dir.path()),
            output: Some(output.clone()),
            satellite: vec![],
            format: Format::Script,
        })
        .unwrap();

        let script = fs::read_to_string(&output).unwrap();
        assert!(script.starts_with("# Autogenerated for the bench variant\n"));
        assert!(script.contains("core_addr = \"10.0.10.2\"\n"));
        assert!(script.contains("# master peripherals"));
        assert!(script.contains("device_db[\"ttl0_counter\"] = {"));
    }

    /// Any validation failure must leave no output behind.
    #[test]
    fn standalone_with_satellites_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write_description(
            dir.path(),
            "standalone.json",
            r#"{"variant": "solo", "role": "standalone", "target": "vertex", "hw_rev": "v2.0"}"#,
        );
        let output = dir.path().join("registry.py");

        let err = run(Cli {
            primary_description: primary,
            output: Some(output.clone()),
            satellite: vec![
                "1".to_string(),
                satellite_description(dir.path()).display().to_string(),
            ],
            format: Format::Script,
        })
        .unwrap_err();

        assert!(err.to_string().contains("invalid topology"));
        assert!(!output.exists());
    }

    #[test]
    fn malformed_description_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let primary = write_description(dir.path(), "broken.json", "{ this is not json");

        let err = run(Cli {
            primary_description: primary,
            output: None,
            satellite: vec![],
            format: Format::Script,
        })
        .unwrap_err();
        assert!(err.to_string().contains("malformed description"));
    }

    #[test]
    fn destinations_parse_decimal_and_hex() {
        assert_eq!(parse_destination("7").unwrap(), 7);
        assert_eq!(parse_destination("0x10").unwrap(), 16);
        assert!(parse_destination("east").is_err());
    }

    #[test]
    fn cli_parses_repeated_satellites() {
        let cli = Cli::parse_from([
            "latc",
            "system.json",
            "-s",
            "1",
            "sat1.json",
            "--satellite",
            "0x2",
            "sat2.json",
            "-o",
            "out.py",
        ]);
        assert_eq!(cli.satellite, ["1", "sat1.json", "0x2", "sat2.json"]);
        assert_eq!(cli.output.as_deref(), Some(Path::new("out.py")));
        assert_eq!(cli.format, Format::Script);
    }
}
