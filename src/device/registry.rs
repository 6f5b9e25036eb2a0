use std::path::Path;

use super::port_monitor::PortEnumerator;
use super::resolver::{HotPlugResolver, Operator};
use super::{EnumerationSnapshot, RegistrySnapshot, Result, Role};
use crate::config::{store, DiscoveryConfig, StoreError, StoredDevice, StoredDevices};

/// Restore role bindings from storage, re-locate them on the live bus, and
/// fall back to the hot-plug search for anything still missing
pub struct DeviceRegistry<E> {
    enumerator: E,
}

impl<E: PortEnumerator> DeviceRegistry<E> {
    pub fn new(enumerator: E) -> Self {
        Self { enumerator }
    }

    /// Bind every role in `config.roles`.
    ///
    /// Returns early, without touching storage, when the stored bindings all
    /// validate. Resolver and storage failures are returned as-is.
    ///
    /// On save, ids already in storage are kept for every role this call did
    /// not resolve, so a partial run never erases another role's binding.
    pub fn resolve_all<O: Operator>(
        &self,
        config: &DiscoveryConfig,
        operator: O,
    ) -> Result<RegistrySnapshot> {
        let stored = if config.load_config || config.save_config {
            load(&config.storage_path).ok()
        } else {
            None
        };
        let mut snapshot = RegistrySnapshot::new();

        if config.load_config {
            if let Some(stored) = &stored {
                let live = self.enumerator.snapshot()?;
                snapshot = validate(stored.clone(), &live);
                if snapshot.unresolved(&config.roles).is_empty() {
                    log::info!("All devices restored from {}", config.storage_path.display());
                    return Ok(snapshot);
                }
            }
        }

        log::info!("Performing manual USB address search.");
        let mut resolver = HotPlugResolver::new(&self.enumerator, operator);
        for role in snapshot.unresolved(&config.roles) {
            let entry = resolver.resolve(role)?;
            snapshot.bind(role, &entry);
        }

        if config.save_config {
            let mut persisted = stored.unwrap_or_default();
            persisted.overlay(&snapshot);
            save(&persisted, &config.storage_path)?;
            log::info!("Saved device registry to {}", config.storage_path.display());
        }
        Ok(snapshot)
    }
}

/// Read stored bindings from `path`.
///
/// Fails softly: anything short of a readable registry with at least one
/// section comes back as `StoreError::NotFound`.
pub fn load(path: &Path) -> std::result::Result<RegistrySnapshot, StoreError> {
    let devices = store::read_devices(path).map_err(|e| {
        log::warn!("Could not read config file {}: {}", path.display(), e);
        e
    })?;

    let mut snapshot = RegistrySnapshot::new();
    for (section, device) in devices {
        let role = match section.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                log::warn!("Ignoring section [{}] in {}: {}", section, path.display(), e);
                continue;
            }
        };
        match device.hardware_id {
            Some(hardware_id) => snapshot.set_hardware_id(role, hardware_id),
            None => log::warn!("Section [{}] in {} has no hardware_id", section, path.display()),
        }
    }
    Ok(snapshot)
}

/// Locate each stored hardware id on the live bus.
///
/// Roles whose device is absent are marked unresolved with a warning.
pub fn validate(mut snapshot: RegistrySnapshot, live: &EnumerationSnapshot) -> RegistrySnapshot {
    let known: Vec<(Role, String)> = snapshot
        .hardware_ids()
        .into_iter()
        .map(|(role, id)| (role, id.to_string()))
        .collect();

    for (role, hardware_id) in known {
        match live.find_hardware_id(&hardware_id) {
            Some(entry) => {
                if live.count_hardware_id(&hardware_id) > 1 {
                    log::warn!(
                        "Hardware id {} appears on several ports; using {} for {}",
                        hardware_id,
                        entry.path,
                        role
                    );
                }
                log::debug!("Found {} with hwid {} at {}", role, hardware_id, entry.path);
                let entry = entry.clone();
                snapshot.bind(role, &entry);
            }
            None => {
                log::warn!("Could not find {} with hwid {}", role, hardware_id);
                snapshot.mark_unresolved(role);
            }
        }
    }
    snapshot
}

/// Write the resolved role -> hardware id pairs to `path`, replacing its
/// previous contents. Paths are never stored.
pub fn save(snapshot: &RegistrySnapshot, path: &Path) -> std::result::Result<(), StoreError> {
    let devices: StoredDevices = snapshot
        .hardware_ids()
        .into_iter()
        .map(|(role, hardware_id)| {
            (
                role.name().to_string(),
                StoredDevice {
                    hardware_id: Some(hardware_id.to_string()),
                    path: None,
                },
            )
        })
        .collect();
    store::write_devices(path, &devices)
}
