use super::{EnumerationSnapshot, Result};
use crate::serial::{PortEntry, SerialInterface};

/// Changes between two enumeration snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortEvent {
    /// A serial port was added
    PortAdded(PortEntry),
    /// A serial port was removed
    PortRemoved(PortEntry),
}

/// Source of enumeration snapshots.
///
/// Callers poll it at discrete instants; there is no event stream.
pub trait PortEnumerator {
    fn snapshot(&self) -> Result<EnumerationSnapshot>;
}

/// Enumerates the ports attached to this host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnumerator;

impl SystemEnumerator {
    pub fn new() -> Self {
        Self
    }
}

impl PortEnumerator for SystemEnumerator {
    fn snapshot(&self) -> Result<EnumerationSnapshot> {
        Ok(EnumerationSnapshot::new(SerialInterface::discover_ports()?))
    }
}

impl<E: PortEnumerator + ?Sized> PortEnumerator for &E {
    fn snapshot(&self) -> Result<EnumerationSnapshot> {
        (**self).snapshot()
    }
}

/// Everything that appeared or vanished between `before` and `after`
pub fn changes(before: &EnumerationSnapshot, after: &EnumerationSnapshot) -> Vec<PortEvent> {
    let removed = before.added_since(after).into_iter().map(PortEvent::PortRemoved);
    let added = after.added_since(before).into_iter().map(PortEvent::PortAdded);
    removed.chain(added).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_reports_removed_then_added() {
        let a = PortEntry::new("/dev/ttyUSB0", "hw-a");
        let b = PortEntry::new("/dev/ttyUSB1", "hw-b");
        let b_moved = PortEntry::new("/dev/ttyUSB2", "hw-b");

        let before = EnumerationSnapshot::new(vec![a.clone(), b.clone()]);
        let after = EnumerationSnapshot::new(vec![a, b_moved.clone()]);

        assert_eq!(
            changes(&before, &after),
            vec![PortEvent::PortRemoved(b), PortEvent::PortAdded(b_moved)]
        );
    }

    #[test]
    fn test_no_changes_between_equal_snapshots() {
        let snap = EnumerationSnapshot::new(vec![PortEntry::new("/dev/ttyACM0", "n/a")]);
        assert!(changes(&snap, &snap.clone()).is_empty());
    }
}
