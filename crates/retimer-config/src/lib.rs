//! Static device configuration for the retimer subsystem
//!
//! Parent devices source their properties from a TOML configuration tree
//! rather than live hardware description. Each `[[device]]` entry names a
//! device and carries a free-form property table; the `label` property is
//! what retimer handles report through their label attribute. A configured
//! entry can be wrapped as a [`ConfiguredDevice`] and handed straight to the
//! registry as a parent.

use retimer_core::ParentDevice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read device configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse device configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize device configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("No device named {0} in configuration")]
    UnknownDevice(String),
}

/// A single device entry in the configuration tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name (e.g. "pcie-switch0")
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Static properties attached to the device
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl DeviceConfig {
    /// Create an entry with no properties
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            properties: BTreeMap::new(),
        }
    }

    /// Add or replace a property
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

/// The device configuration index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigIndex {
    /// Version of the configuration format
    #[serde(default = "default_version")]
    pub version: String,
    /// List of device entries
    #[serde(default)]
    pub device: Vec<DeviceConfig>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigIndex {
    fn default() -> Self {
        Self {
            version: default_version(),
            device: Vec::new(),
        }
    }
}

impl ConfigIndex {
    /// Load the configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let index: ConfigIndex = toml::from_str(&content)?;
        Ok(index)
    }

    /// Load the configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let index: ConfigIndex = toml::from_str(content)?;
        Ok(index)
    }

    /// Save the configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find a device entry by name
    pub fn get(&self, name: &str) -> Option<&DeviceConfig> {
        self.device.iter().find(|d| d.name == name)
    }

    /// Add a device entry
    pub fn add(&mut self, device: DeviceConfig) {
        self.device.push(device);
    }

    /// Wrap the named entry for use as a registry parent
    pub fn parent(&self, name: &str) -> Result<ConfiguredDevice, ConfigError> {
        self.get(name)
            .cloned()
            .map(ConfiguredDevice::new)
            .ok_or_else(|| ConfigError::UnknownDevice(name.to_string()))
    }
}

/// A configured device entry usable as the parent of retimer handles.
///
/// The caller owns it (typically behind an `Arc`); registered handles keep
/// only weak references, so dropping the device makes its retimers report
/// the fallback label.
#[derive(Debug, Clone)]
pub struct ConfiguredDevice {
    config: DeviceConfig,
}

impl ConfiguredDevice {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }

    /// Erase the concrete type for registration
    pub fn into_parent(self) -> Arc<dyn ParentDevice> {
        Arc::new(self)
    }
}

impl ParentDevice for ConfiguredDevice {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn property(&self, key: &str) -> Option<Vec<u8>> {
        self.config
            .properties
            .get(key)
            .map(|value| value.as_bytes().to_vec())
    }
}

/// Load the configuration from a file, falling back to an empty index
pub fn load_or_default(path: &Path) -> ConfigIndex {
    if path.exists() {
        match ConfigIndex::from_file(path) {
            Ok(index) => {
                info!(
                    path = %path.display(),
                    count = index.device.len(),
                    "Loaded device configuration"
                );
                return index;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load device configuration, using empty index");
            }
        }
    } else {
        info!(path = %path.display(), "Device configuration not found, using empty index");
    }
    ConfigIndex::default()
}
