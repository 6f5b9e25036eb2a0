pub mod serial;
pub mod device;
pub mod config;

use config::DiscoveryConfig;
use device::{ConsoleOperator, DeviceRegistry, RegistrySnapshot, SystemEnumerator};

/// Bind every configured role on this host, prompting on the terminal for
/// any device the registry file cannot account for
pub fn discover(config: &DiscoveryConfig) -> device::Result<RegistrySnapshot> {
    let registry = DeviceRegistry::new(SystemEnumerator::new());
    registry.resolve_all(config, ConsoleOperator::stdio())
}
