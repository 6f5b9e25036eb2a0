pub mod models;
pub mod port_monitor;
pub mod registry;
pub mod resolver;

pub use models::*;
pub use port_monitor::{PortEnumerator, PortEvent, SystemEnumerator};
pub use registry::DeviceRegistry;
pub use resolver::{ConsoleOperator, HotPlugResolver, Operator, PlugAction};


#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("No device found for {0} (was the right cable unplugged and reconnected?)")]
    NoDeviceDetected(Role),

    #[error("{count} devices changed while searching for {role}; retry without touching other devices")]
    AmbiguousChange { role: Role, count: usize },

    #[error("{0} has no hardware id bound")]
    Unresolved(Role),

    #[error("Port enumeration failed: {0}")]
    Enumeration(#[from] crate::serial::SerialError),

    #[error("Operator prompt failed: {0}")]
    Operator(#[from] std::io::Error),

    #[error("Registry storage error: {0}")]
    Storage(#[from] crate::config::StoreError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
