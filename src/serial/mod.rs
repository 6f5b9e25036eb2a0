pub mod interface;
pub mod protocol;

pub use interface::SerialInterface;
pub use protocol::ValveProtocol;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A serial endpoint as seen by the enumerator at one instant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortEntry {
    pub path: String,
    pub hardware_id: String,
}

impl PortEntry {
    pub fn new(path: impl Into<String>, hardware_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hardware_id: hardware_id.into(),
        }
    }
}

impl std::fmt::Display for PortEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "device:{} hwid:{}", self.path, self.hardware_id)
    }
}

/// Byte-level access to an open serial link.
///
/// `SerialInterface` is the real implementation; tests provide scripted ones.
pub trait SerialPortIO: Send {
    /// Write all of `data` and flush.
    fn send_data(&mut self, data: &[u8]) -> Result<()>;

    /// Read whatever is available into `buffer`.
    ///
    /// Returns `Err(SerialError::Timeout)` when nothing arrived within the
    /// link's own read window; callers decide whether to keep waiting.
    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Drop any bytes received but not yet read.
    fn discard_input(&mut self) -> Result<()> {
        Ok(())
    }

    /// Bound how long the next `read_data` may block.
    fn set_read_timeout(&mut self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Communication timeout")]
    Timeout,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;
