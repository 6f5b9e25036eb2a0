//! Manual unplug/replug search for a role's hardware id.
//!
//! Nothing in the enumeration metadata says which adapter belongs to which
//! instrument, so the operator disconnects the cable for one role, the port
//! list is captured, the cable goes back in and the list is captured again.
//! The one endpoint that appeared is the role's device.

use std::fmt;
use std::io::{self, BufRead, Write};

use super::port_monitor::{self, PortEnumerator};
use super::{DiscoveryError, Result, Role};
use crate::serial::PortEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlugAction {
    Disconnect,
    Reconnect,
}

impl fmt::Display for PlugAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlugAction::Disconnect => f.write_str("disconnect"),
            PlugAction::Reconnect => f.write_str("reconnect"),
        }
    }
}

/// The person at the bench.
///
/// `confirm` returns once the operator reports that `action` is done for
/// `role`. There is no timeout.
pub trait Operator {
    fn confirm(&mut self, role: Role, action: PlugAction) -> io::Result<()>;
}

impl<O: Operator + ?Sized> Operator for &mut O {
    fn confirm(&mut self, role: Role, action: PlugAction) -> io::Result<()> {
        (**self).confirm(role, action)
    }
}

/// Prompts on a writer and waits for Enter on a reader
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn confirm(&mut self, role: Role, action: PlugAction) -> io::Result<()> {
        match action {
            PlugAction::Disconnect => write!(
                self.output,
                "    Unplug the USB/Serial cable connected to {}. Press Enter when unplugged...",
                role
            )?,
            PlugAction::Reconnect => write!(
                self.output,
                "    Reconnect the cable for {}. Press Enter when the cable has been plugged in...",
                role
            )?,
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input closed while waiting to {} {}", action, role),
            ));
        }
        Ok(())
    }
}

pub struct HotPlugResolver<E, O> {
    enumerator: E,
    operator: O,
}

impl<E: PortEnumerator, O: Operator> HotPlugResolver<E, O> {
    pub fn new(enumerator: E, operator: O) -> Self {
        Self {
            enumerator,
            operator,
        }
    }

    /// Find the endpoint for `role` through one unplug/replug cycle.
    ///
    /// Only one role may be in its differencing window at a time; a second
    /// cable moving during the window shows up as `AmbiguousChange`.
    pub fn resolve(&mut self, role: Role) -> Result<PortEntry> {
        log::info!("Searching for {}", role);

        self.operator.confirm(role, PlugAction::Disconnect)?;
        let before = self.enumerator.snapshot()?;
        log::debug!("Devices found after unplugging:\n{}", before);

        self.operator.confirm(role, PlugAction::Reconnect)?;
        let after = self.enumerator.snapshot()?;
        log::debug!("Devices found after replugging:\n{}", after);

        for event in port_monitor::changes(&before, &after) {
            log::debug!("{}: {:?}", role, event);
        }

        let mut added = after.added_since(&before);
        match added.len() {
            1 => {
                let entry = added.remove(0);
                log::info!("Found {} at {} ({})", role, entry.path, entry.hardware_id);
                Ok(entry)
            }
            0 => Err(DiscoveryError::NoDeviceDetected(role)),
            count => Err(DiscoveryError::AmbiguousChange { role, count }),
        }
    }
}
