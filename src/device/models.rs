use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DiscoveryError, Result};
use crate::serial::PortEntry;

/// Logical instrument roles on the bench
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// VC-Mini valve controller
    #[serde(rename = "VCMini")]
    ValveController,
    /// TG5012A function generator
    #[serde(rename = "TG5012A")]
    FunctionGenerator,
    /// MX Series II selector valve
    #[serde(rename = "MXII")]
    SelectorValve,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::ValveController, Role::FunctionGenerator, Role::SelectorValve];

    /// Section name used in the registry file
    pub fn name(self) -> &'static str {
        match self {
            Role::ValveController => "VCMini",
            Role::FunctionGenerator => "TG5012A",
            Role::SelectorValve => "MXII",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| format!("Unknown device role: {}", s))
    }
}

/// Binding of one role to physical hardware
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub role: Role,
    /// Durable key; `None` until the role is resolved
    pub hardware_id: Option<String>,
    /// Current OS path, only ever taken from a live enumeration
    pub path: Option<String>,
}

impl DeviceIdentity {
    pub fn unresolved(role: Role) -> Self {
        Self {
            role,
            hardware_id: None,
            path: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.hardware_id.is_some()
    }
}

/// Every serial endpoint visible at one instant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumerationSnapshot {
    entries: Vec<PortEntry>,
}

impl EnumerationSnapshot {
    pub fn new(entries: Vec<PortEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PortEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry: &PortEntry) -> bool {
        self.entries.contains(entry)
    }

    /// First endpoint carrying `hardware_id`
    pub fn find_hardware_id(&self, hardware_id: &str) -> Option<&PortEntry> {
        self.entries.iter().find(|e| e.hardware_id == hardware_id)
    }

    /// Number of endpoints carrying `hardware_id`
    pub fn count_hardware_id(&self, hardware_id: &str) -> usize {
        self.entries.iter().filter(|e| e.hardware_id == hardware_id).count()
    }

    /// Entries present here but not in `before`, compared on path and id
    pub fn added_since(&self, before: &EnumerationSnapshot) -> Vec<PortEntry> {
        self.entries
            .iter()
            .filter(|e| !before.contains(e))
            .cloned()
            .collect()
    }
}

impl fmt::Display for EnumerationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromIterator<PortEntry> for EnumerationSnapshot {
    fn from_iter<I: IntoIterator<Item = PortEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Role -> identity map covering every known role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySnapshot {
    devices: BTreeMap<Role, DeviceIdentity>,
}

impl RegistrySnapshot {
    /// Snapshot with every role unresolved
    pub fn new() -> Self {
        Self {
            devices: Role::ALL
                .into_iter()
                .map(|role| (role, DeviceIdentity::unresolved(role)))
                .collect(),
        }
    }

    pub fn get(&self, role: Role) -> Option<&DeviceIdentity> {
        self.devices.get(&role)
    }

    pub fn is_resolved(&self, role: Role) -> bool {
        self.get(role).is_some_and(DeviceIdentity::is_resolved)
    }

    /// Roles from `roles` that still lack a hardware id, in the given order.
    /// Each role appears once even if `roles` repeats it.
    pub fn unresolved(&self, roles: &[Role]) -> Vec<Role> {
        let mut pending = Vec::new();
        for &role in roles {
            if !self.is_resolved(role) && !pending.contains(&role) {
                pending.push(role);
            }
        }
        pending
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceIdentity> {
        self.devices.values()
    }

    /// Record a hardware id without a live path, as restored from storage
    pub fn set_hardware_id(&mut self, role: Role, hardware_id: String) {
        self.devices.insert(
            role,
            DeviceIdentity {
                role,
                hardware_id: Some(hardware_id),
                path: None,
            },
        );
    }

    /// Bind `role` to a live endpoint
    pub fn bind(&mut self, role: Role, entry: &PortEntry) {
        self.devices.insert(
            role,
            DeviceIdentity {
                role,
                hardware_id: Some(entry.hardware_id.clone()),
                path: Some(entry.path.clone()),
            },
        );
    }

    pub fn mark_unresolved(&mut self, role: Role) {
        self.devices.insert(role, DeviceIdentity::unresolved(role));
    }

    /// Copy every resolved identity from `other` over this snapshot. Roles
    /// unresolved in `other` keep what they had here.
    pub fn overlay(&mut self, other: &RegistrySnapshot) {
        for device in other.iter().filter(|d| d.is_resolved()) {
            self.devices.insert(device.role, device.clone());
        }
    }

    /// Current path for `role`, or an error if it has not been located
    pub fn require_path(&self, role: Role) -> Result<&str> {
        self.get(role)
            .and_then(|d| d.path.as_deref())
            .ok_or(DiscoveryError::Unresolved(role))
    }

    /// The persisted part of the snapshot
    pub fn hardware_ids(&self) -> BTreeMap<Role, &str> {
        self.devices
            .values()
            .filter_map(|d| d.hardware_id.as_deref().map(|id| (d.role, id)))
            .collect()
    }
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self::new()
    }
}
