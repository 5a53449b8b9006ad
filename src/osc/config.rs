//! Dispatcher configuration — fault policy and logging loaded from ~/.osc-dispatch/dispatch.yaml.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// What happens when a listener panics during dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultPolicy {
    /// Catch the panic, record it in the report and keep delivering.
    #[default]
    Isolate,
    /// Let the panic unwind out of `dispatch`, skipping remaining deliveries.
    Propagate,
}

/// Dispatcher configuration loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub fault_policy: FaultPolicy,
    /// Emit a trace event for every message no selector matched.
    #[serde(default)]
    pub log_unmatched: bool,
}

/// Default path for the dispatcher config.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".osc-dispatch");
    path.push("dispatch.yaml");
    path
}

impl DispatchConfig {
    /// Load config from the standard path (~/.osc-dispatch/dispatch.yaml).
    /// Returns None if the file doesn't exist or can't be parsed.
    pub fn load() -> Option<Self> {
        Self::load_at(&default_config_path())
    }

    /// Like [`DispatchConfig::load`] for an explicit path.
    pub fn load_at(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Load config from a file. A missing file yields the default config.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Save config to a file, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }
}
