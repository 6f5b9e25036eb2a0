use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use sheetjet_lib::device::{
    DiscoveryError, EnumerationSnapshot, HotPlugResolver, Operator, PlugAction, PortEnumerator, Role,
};
use sheetjet_lib::serial::{PortEntry, SerialError};

// Hands out one canned snapshot per call; runs dry with an enumeration error.
struct ScriptedEnumerator {
    snapshots: RefCell<VecDeque<EnumerationSnapshot>>,
}

impl ScriptedEnumerator {
    fn new(snapshots: Vec<Vec<PortEntry>>) -> Self {
        Self {
            snapshots: RefCell::new(snapshots.into_iter().map(EnumerationSnapshot::new).collect()),
        }
    }
}

impl PortEnumerator for ScriptedEnumerator {
    fn snapshot(&self) -> Result<EnumerationSnapshot, DiscoveryError> {
        self.snapshots.borrow_mut().pop_front().ok_or_else(|| {
            DiscoveryError::Enumeration(SerialError::IoError(io::Error::other("enumerator unavailable")))
        })
    }
}

#[derive(Default)]
struct RecordingOperator {
    prompts: Vec<(Role, PlugAction)>,
}

impl Operator for RecordingOperator {
    fn confirm(&mut self, role: Role, action: PlugAction) -> io::Result<()> {
        self.prompts.push((role, action));
        Ok(())
    }
}

fn a() -> PortEntry {
    PortEntry::new("/dev/ttyUSB0", "USB VID:PID=0403:6001 SER=AAA")
}

fn b() -> PortEntry {
    PortEntry::new("/dev/ttyUSB1", "USB VID:PID=0403:6001 SER=BBB")
}

fn c() -> PortEntry {
    PortEntry::new("/dev/ttyUSB2", "USB VID:PID=067B:2303")
}

fn d() -> PortEntry {
    PortEntry::new("/dev/ttyACM0", "USB VID:PID=2341:0043 SER=DDD")
}

#[test]
fn test_single_new_entry_resolves() {
    let enumerator = ScriptedEnumerator::new(vec![vec![a(), b()], vec![a(), b(), c()]]);
    let mut operator = RecordingOperator::default();

    let entry = HotPlugResolver::new(&enumerator, &mut operator)
        .resolve(Role::SelectorValve)
        .unwrap();

    assert_eq!(entry, c());
    assert_eq!(
        operator.prompts,
        vec![
            (Role::SelectorValve, PlugAction::Disconnect),
            (Role::SelectorValve, PlugAction::Reconnect),
        ]
    );
}

#[test]
fn test_no_new_entry_is_no_device_detected() {
    let enumerator = ScriptedEnumerator::new(vec![vec![a(), b()], vec![a(), b()]]);
    let mut operator = RecordingOperator::default();

    let result = HotPlugResolver::new(&enumerator, &mut operator).resolve(Role::ValveController);
    assert!(matches!(result, Err(DiscoveryError::NoDeviceDetected(Role::ValveController))));
}

#[test]
fn test_several_new_entries_is_ambiguous() {
    let enumerator = ScriptedEnumerator::new(vec![vec![a(), b()], vec![a(), c(), d()]]);
    let mut operator = RecordingOperator::default();

    let result = HotPlugResolver::new(&enumerator, &mut operator).resolve(Role::FunctionGenerator);
    assert!(matches!(
        result,
        Err(DiscoveryError::AmbiguousChange { role: Role::FunctionGenerator, count: 2 })
    ));
}

#[test]
fn test_replug_on_new_path_counts_as_new_entry() {
    let moved = PortEntry::new("/dev/ttyUSB3", a().hardware_id);
    let enumerator = ScriptedEnumerator::new(vec![vec![b()], vec![b(), moved.clone()]]);
    let mut operator = RecordingOperator::default();

    let entry = HotPlugResolver::new(&enumerator, &mut operator)
        .resolve(Role::SelectorValve)
        .unwrap();
    assert_eq!(entry, moved);
}

#[test]
fn test_enumeration_failure_propagates() {
    let enumerator = ScriptedEnumerator::new(vec![vec![a()]]);
    let mut operator = RecordingOperator::default();

    let result = HotPlugResolver::new(&enumerator, &mut operator).resolve(Role::SelectorValve);
    assert!(matches!(result, Err(DiscoveryError::Enumeration(_))));
    assert_eq!(operator.prompts.len(), 2);
}

#[test]
fn test_operator_failure_stops_before_enumerating() {
    struct HangUp;
    impl Operator for HangUp {
        fn confirm(&mut self, _role: Role, _action: PlugAction) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
        }
    }

    let enumerator = ScriptedEnumerator::new(vec![vec![a()], vec![a(), b()]]);
    let result = HotPlugResolver::new(&enumerator, HangUp).resolve(Role::SelectorValve);

    assert!(matches!(result, Err(DiscoveryError::Operator(_))));
    assert_eq!(enumerator.snapshots.borrow().len(), 2);
}
