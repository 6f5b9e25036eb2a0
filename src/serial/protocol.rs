//! MX Series II selector valve protocol.
//!
//! Commands and responses are single ASCII lines terminated by a carriage
//! return. Numeric arguments go out as two-digit uppercase hex and numeric
//! replies come back in hex.

use std::time::{Duration, Instant};

use super::{Result, SerialError, SerialInterface, SerialPortIO};
use crate::config::ValveSettings;

pub const TERMINATOR: u8 = b'\r';
pub const MIN_PORT: u32 = 1;
pub const MAX_PORT: u32 = 16;

const CMD_STATUS: &str = "S";
const CMD_HOME: &str = "M00";
const CMD_MODE: &str = "D00";

pub struct ValveProtocol<P: SerialPortIO = SerialInterface> {
    port: P,
    terminator: u8,
    timeout: Duration,
}

impl ValveProtocol<SerialInterface> {
    /// Open the valve at `path`
    pub fn connect(path: &str, settings: &ValveSettings) -> Result<Self> {
        let interface = SerialInterface::open(path, settings.baud_rate, settings.timeout())?;
        Ok(Self::new(interface, settings.timeout()))
    }
}

impl<P: SerialPortIO> ValveProtocol<P> {
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port,
            terminator: TERMINATOR,
            timeout,
        }
    }

    /// Send a command and read back one response line.
    ///
    /// On timeout the bytes read so far are dropped and the link may be out
    /// of step with the valve; see [`ValveProtocol::discard_input`].
    pub fn query(&mut self, command: &str) -> Result<String> {
        self.write(command)?;
        let response = self.read_frame()?;
        log::debug!("Valve replied {:?} to {:?}", response, command);
        Ok(response)
    }

    /// Send a command without waiting for a reply
    pub fn write(&mut self, command: &str) -> Result<()> {
        let frame = encode_frame(command, self.terminator)?;
        self.port.send_data(&frame)
    }

    /// Query the active port.
    ///
    /// Values above 16 are fault codes reported by the valve. They are passed
    /// through unchanged so callers can inspect them.
    pub fn get_port(&mut self) -> Result<u32> {
        let response = self.query(CMD_STATUS)?;
        let port = decode_hex_response(&response)?;
        if port > MAX_PORT {
            log::warn!("Valve failure error {}", port);
        }
        Ok(port)
    }

    /// Move to `port` (1 to 16)
    pub fn set_port(&mut self, port: u32) -> Result<()> {
        if !(MIN_PORT..=MAX_PORT).contains(&port) {
            return Err(SerialError::InvalidArgument(format!(
                "Port must be between {} and {}, got {}",
                MIN_PORT, MAX_PORT, port
            )));
        }
        self.write(&format!("P{}", encode_hex_arg(port as u8)))
    }

    pub fn home(&mut self) -> Result<()> {
        self.write(CMD_HOME)
    }

    pub fn get_mode(&mut self) -> Result<u32> {
        let response = self.query(CMD_MODE)?;
        decode_hex_response(&response)
    }

    pub fn set_mode(&mut self, _mode: u32) -> Result<()> {
        Err(SerialError::NotImplemented("setting the valve mode"))
    }

    /// Drop unread input, e.g. after a timed-out query
    pub fn discard_input(&mut self) -> Result<()> {
        self.port.discard_input()
    }

    pub fn interface(&self) -> &P {
        &self.port
    }

    pub fn interface_mut(&mut self) -> &mut P {
        &mut self.port
    }

    fn read_frame(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let mut frame = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            // Each read may block only for what is left of the overall window.
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::warn!(
                    "No terminator from valve within {:?}; dropping {} partial bytes",
                    self.timeout,
                    frame.len()
                );
                return Err(SerialError::Timeout);
            }
            self.port.set_read_timeout(remaining)?;

            match self.port.read_data(&mut byte) {
                Ok(0) | Err(SerialError::Timeout) => {}
                Ok(_) if byte[0] == self.terminator => break,
                Ok(_) => frame.push(byte[0]),
                Err(e) => return Err(e),
            }
        }

        decode_frame(&frame)
    }
}

/// Build the bytes for one command line
pub fn encode_frame(command: &str, terminator: u8) -> Result<Vec<u8>> {
    if !command.is_ascii() || command.as_bytes().contains(&terminator) {
        return Err(SerialError::InvalidArgument(format!(
            "Command {:?} is not a single ASCII line",
            command
        )));
    }
    let mut frame = Vec::with_capacity(command.len() + 1);
    frame.extend_from_slice(command.as_bytes());
    frame.push(terminator);
    Ok(frame)
}

/// Turn a received line (terminator already stripped) into text
pub fn decode_frame(frame: &[u8]) -> Result<String> {
    if !frame.is_ascii() {
        return Err(SerialError::ProtocolError(format!(
            "Non-ASCII response: {:02X?}",
            frame
        )));
    }
    let text = String::from_utf8_lossy(frame);
    Ok(text.trim().to_string())
}

pub fn encode_hex_arg(value: u8) -> String {
    format!("{:02X}", value)
}

pub fn decode_hex_response(response: &str) -> Result<u32> {
    let digits = response.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SerialError::ProtocolError(format!(
            "Expected a hex number, got {:?}",
            response
        )));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|e| SerialError::ProtocolError(format!("Invalid hex {:?}: {}", response, e)))
}
