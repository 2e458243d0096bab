//! The device registry: the compiler's output model.
//!
//! A registry is an insertion-ordered mapping from logical device names to
//! [`DeviceRecord`]s. Records are created once by an expander and never
//! touched again; the single exception is the post-build amendment that
//! installs the satellite CPU-target table into the core entry, which goes
//! through [`Registry::set_local_argument`].

use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Constructor argument bag of a device record.
pub type Arguments = serde_json::Map<String, Value>;

/// Errors raised by registry mutation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two devices resolved to the same logical name.
    #[error("duplicate device name: {name}")]
    DuplicateName { name: String },

    /// An amendment targeted a name that was never inserted.
    #[error("no such device in registry: {name}")]
    UnknownDevice { name: String },
}

/// One entry in the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceRecord {
    /// A fixed endpoint driven directly by the runtime.
    Local {
        module: String,
        class: String,
        #[serde(skip_serializing_if = "Arguments::is_empty")]
        arguments: Arguments,
    },
    /// A network service the runtime spawns and connects to.
    Controller {
        host: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        port_proxy: Option<u16>,
        port: u16,
        command: String,
    },
}

impl DeviceRecord {
    /// A local record with an empty argument bag.
    pub fn local(module: &str, class: &str) -> Self {
        DeviceRecord::Local {
            module: module.to_string(),
            class: class.to_string(),
            arguments: Arguments::new(),
        }
    }

    /// A controller record without a proxy port.
    pub fn controller(host: &str, port: u16, command: String) -> Self {
        DeviceRecord::Controller {
            host: host.to_string(),
            port_proxy: None,
            port,
            command,
        }
    }

    /// Add a constructor argument. No-op on controller records.
    pub fn with_arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let DeviceRecord::Local { arguments, .. } = &mut self {
            arguments.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn with_port_proxy(mut self, proxy: u16) -> Self {
        if let DeviceRecord::Controller { port_proxy, .. } = &mut self {
            *port_proxy = Some(proxy);
        }
        self
    }

    /// The argument bag, if this is a local record.
    pub fn arguments(&self) -> Option<&Arguments> {
        match self {
            DeviceRecord::Local { arguments, .. } => Some(arguments),
            DeviceRecord::Controller { .. } => None,
        }
    }
}

/// A section marker, grouping the entries appended after it. Used by the
/// script emitter for comment headers; carries the link destination index
/// for satellite and link-board sections.
#[derive(Debug, Clone)]
pub struct Section {
    pub label: String,
    pub destination: Option<u32>,
    pub start: usize,
}

/// Insertion-ordered name → record mapping.
#[derive(Debug, Default)]
pub struct Registry {
    variant: String,
    entries: Vec<(String, DeviceRecord)>,
    index: HashMap<String, usize>,
    sections: Vec<Section>,
}

impl Registry {
    pub fn new(variant: &str) -> Self {
        Registry {
            variant: variant.to_string(),
            ..Registry::default()
        }
    }

    /// Append a record under `name`. Names are unique per registry; a
    /// collision means an allocator invariant was broken upstream.
    pub fn insert(&mut self, name: String, record: DeviceRecord) -> Result<(), RegistryError> {
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, record));
        Ok(())
    }

    /// Open a new section; subsequent inserts belong to it.
    pub fn begin_section(&mut self, label: &str, destination: Option<u32>) {
        self.sections.push(Section {
            label: label.to_string(),
            destination,
            start: self.entries.len(),
        });
    }

    /// Overwrite one constructor argument of an existing local record.
    pub fn set_local_argument(
        &mut self,
        name: &str,
        key: &str,
        value: Value,
    ) -> Result<(), RegistryError> {
        let idx = *self
            .index
            .get(name)
            .ok_or_else(|| RegistryError::UnknownDevice {
                name: name.to_string(),
            })?;
        match &mut self.entries[idx].1 {
            DeviceRecord::Local { arguments, .. } => {
                arguments.insert(key.to_string(), value);
                Ok(())
            }
            DeviceRecord::Controller { .. } => Err(RegistryError::UnknownDevice {
                name: name.to_string(),
            }),
        }
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn get(&self, name: &str) -> Option<&DeviceRecord> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceRecord)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, record) in &self.entries {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}
