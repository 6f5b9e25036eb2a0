pub mod store;

pub use store::{StoreError, StoredDevice, StoredDevices};

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::Role;
use crate::serial::interface::DEFAULT_BAUD_RATE;

pub const DEFAULT_REGISTRY_FILE: &str = "sheetjet.toml";

/// How the device registry is restored and discovered
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Registry file holding role -> hardware id bindings
    pub storage_path: PathBuf,
    /// Roles that must be resolved, in prompting order
    pub roles: Vec<Role>,
    /// Try the registry file before asking the operator
    pub load_config: bool,
    /// Rewrite the registry file after a manual search
    pub save_config: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            roles: Role::ALL.to_vec(),
            load_config: true,
            save_config: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_storage_path(path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: path.into(),
            ..Self::default()
        }
    }
}

/// Serial settings for the selector valve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveSettings {
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for ValveSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 1000,
        }
    }
}

impl ValveSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
