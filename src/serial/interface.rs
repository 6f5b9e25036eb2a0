use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use serialport::{ClearBuffer, SerialPort, SerialPortType};

use super::{PortEntry, Result, SerialError, SerialPortIO};

pub const DEFAULT_BAUD_RATE: u32 = 19200;

pub struct SerialInterface {
    port: Box<dyn SerialPort>,
}

impl SerialInterface {
    /// List every serial endpoint currently attached to the host
    pub fn discover_ports() -> Result<Vec<PortEntry>> {
        let ports = serialport::available_ports()?;

        Ok(ports
            .into_iter()
            .map(|port| PortEntry {
                hardware_id: hardware_id(&port.port_type),
                path: port.port_name,
            })
            .collect())
    }

    /// Open `path` and wait for the link to settle.
    ///
    /// Both the open itself and the post-open buffer reset must succeed,
    /// otherwise the port is reported as a failed connection.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| SerialError::ConnectionFailed(format!("{}: {}", path, e)))?;

        port.clear(ClearBuffer::All).map_err(|e| {
            SerialError::ConnectionFailed(format!("{} did not become ready: {}", path, e))
        })?;

        log::info!("Opened serial port {} at {} baud", path, baud_rate);
        Ok(Self { port })
    }
}

impl SerialPortIO for SerialInterface {
    fn send_data(&mut self, data: &[u8]) -> Result<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_data(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(SerialError::Timeout),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    fn discard_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.port.set_timeout(timeout)?;
        Ok(())
    }
}

/// Render the platform description of a port as a stable identifier.
///
/// USB and PCI devices are keyed on vendor/product ids plus the serial
/// number when one is reported, so the same adapter maps to the same string
/// whichever `/dev` node it lands on.
pub fn hardware_id(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let mut id = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
            if let Some(serial) = usb.serial_number.as_deref().filter(|s| !s.is_empty()) {
                id.push_str(" SER=");
                id.push_str(serial);
            }
            id
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "BLUETOOTH".to_string(),
        SerialPortType::Unknown => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(serial_number: Option<&str>) -> SerialPortType {
        SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x0403,
            pid: 0x6001,
            serial_number: serial_number.map(str::to_string),
            manufacturer: Some("FTDI".to_string()),
            product: None,
        })
    }

    #[test]
    fn test_usb_hardware_id_with_serial() {
        assert_eq!(hardware_id(&usb(Some("A600XYZ"))), "USB VID:PID=0403:6001 SER=A600XYZ");
    }

    #[test]
    fn test_usb_hardware_id_without_serial() {
        assert_eq!(hardware_id(&usb(None)), "USB VID:PID=0403:6001");
        assert_eq!(hardware_id(&usb(Some(""))), "USB VID:PID=0403:6001");
    }

    #[test]
    fn test_non_usb_hardware_ids() {
        assert_eq!(hardware_id(&SerialPortType::BluetoothPort), "BLUETOOTH");
        assert_eq!(hardware_id(&SerialPortType::Unknown), "n/a");
    }
}
