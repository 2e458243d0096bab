//! Registry serialization.
//!
//! The registry is built as an in-memory record tree; rendering it is a
//! separate, swappable step. Two formats are provided: a pretty JSON
//! document (the canonical machine format) and an assignment-statement
//! script mirroring how the lattice runtime's `device_db` files read.
//! Neither byte layout is a compatibility contract; the key/value schema
//! of the mapping is.

use serde_json::Value;

use crate::registry::{Arguments, DeviceRecord, Registry};

const INDENT: &str = "    ";

/// Render the registry as a pretty JSON object, one entry per device.
pub fn to_json(registry: &Registry) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(registry)?;
    out.push('\n');
    Ok(out)
}

/// Render the registry as a script of assignment statements: a header
/// binding the core address and the fixed entries, then one statement per
/// device, grouped under per-node section comments.
pub fn to_script(registry: &Registry) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Autogenerated for the {} variant\n",
        registry.variant()
    ));
    if let Some(addr) = core_address(registry) {
        out.push_str(&format!("core_addr = \"{addr}\"\n"));
    }

    let header_end = registry
        .sections()
        .first()
        .map(|s| s.start)
        .unwrap_or(registry.len());

    out.push_str("\ndevice_db = {\n");
    for (name, record) in registry.iter().take(header_end) {
        out.push_str(&format!(
            "{INDENT}\"{name}\": {},\n",
            render_record(record, 1)
        ));
    }
    out.push_str("}\n");

    let mut sections = registry.sections().iter().peekable();
    for (position, (name, record)) in registry.iter().enumerate().skip(header_end) {
        while sections.peek().map(|s| s.start <= position).unwrap_or(false) {
            let section = sections.next().unwrap();
            out.push_str(&format!("\n# {}\n", section.label));
            if let Some(dest) = section.destination {
                if let Some(target) = satellite_target(registry, dest) {
                    out.push_str(&format!(
                        "device_db[\"core\"][\"arguments\"][\"satellite_cpu_targets\"][{dest}] = \"{target}\"\n"
                    ));
                }
            }
        }
        out.push_str(&format!(
            "\ndevice_db[\"{name}\"] = {}\n",
            render_record(record, 0)
        ));
    }
    out
}

fn core_address(registry: &Registry) -> Option<&str> {
    registry
        .get("core")?
        .arguments()?
        .get("host")?
        .as_str()
}

fn satellite_target(registry: &Registry, destination: u32) -> Option<String> {
    registry
        .get("core")?
        .arguments()?
        .get("satellite_cpu_targets")?
        .get(destination.to_string())?
        .as_str()
        .map(str::to_string)
}

fn render_record(record: &DeviceRecord, level: usize) -> String {
    let pad = INDENT.repeat(level + 1);
    let close = INDENT.repeat(level);
    match record {
        DeviceRecord::Local {
            module,
            class,
            arguments,
        } => {
            let mut body = format!(
                "{{\n{pad}\"type\": \"local\",\n{pad}\"module\": \"{module}\",\n{pad}\"class\": \"{class}\",\n"
            );
            if !arguments.is_empty() {
                body.push_str(&format!(
                    "{pad}\"arguments\": {},\n",
                    render_object(arguments, level + 1)
                ));
            }
            body.push_str(&format!("{close}}}"));
            body
        }
        DeviceRecord::Controller {
            host,
            port_proxy,
            port,
            command,
        } => {
            let mut body = format!("{{\n{pad}\"type\": \"controller\",\n{pad}\"host\": \"{host}\",\n");
            if let Some(proxy) = port_proxy {
                body.push_str(&format!("{pad}\"port_proxy\": {proxy},\n"));
            }
            body.push_str(&format!("{pad}\"port\": {port},\n"));
            body.push_str(&format!(
                "{pad}\"command\": {},\n{close}}}",
                quote(command)
            ));
            body
        }
    }
}

fn render_object(object: &Arguments, level: usize) -> String {
    if object.is_empty() {
        return "{}".to_string();
    }
    let pad = INDENT.repeat(level + 1);
    let close = INDENT.repeat(level);
    let mut out = String::from("{\n");
    for (key, value) in object {
        out.push_str(&format!(
            "{pad}\"{key}\": {},\n",
            render_value(key, value, level + 1)
        ));
    }
    out.push_str(&format!("{close}}}"));
    out
}

/// Render one value as a Python literal. Channel addresses print as
/// six-digit hex so the destination index in the high bits stays readable.
fn render_value(key: &str, value: &Value, level: usize) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match n.as_u64() {
            Some(raw) if matches!(key, "channel" | "channel_base") => format!("0x{raw:06x}"),
            _ => n.to_string(),
        },
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let rendered: Vec<_> = items
                .iter()
                .map(|item| render_value("", item, level))
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => render_object(map, level),
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).expect("string serialization is infallible")
}
