//! Interposer per-slot state and the process-global slot table (spec §3 "Interposer
//! per-slot state", §5 "The slot entry is owned by whichever thread currently holds
//! the open descriptor... an implementation needs only to guard slot creation/
//! teardown against concurrent open/close on the same path").
//!
//! Each slot is independently locked so that, per spec §5, "across slots, there is no
//! cross-slot ordering guarantee" — concurrent operations on different slots never
//! contend on the same mutex.

use std::os::fd::RawFd;
use std::sync::{Mutex, OnceLock};

use crate::config::DEFAULT_SLOT_COUNT;
use crate::protocol::DeviceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Js,
    Event,
}

/// State for a slot that currently has an open descriptor (spec §3: "Socket
/// descriptor or sentinel 'closed'... Optional correction table... Device
/// configuration received from the server").
pub struct OpenSlot {
    pub fd: RawFd,
    pub config: DeviceConfig,
    /// Flags as seen at `open()` time (spec §3 "Open flags as seen by the host at
    /// `open()` time (used to honor `O_NONBLOCK`)").
    pub open_flags: i32,
    /// Opaque blob written back by `JSIOCSCORR` / read by `JSIOCGCORR`.
    pub correction: Vec<u8>,
}

#[derive(Default)]
pub struct Slot {
    pub open: Option<OpenSlot>,
}

pub struct SlotTable {
    pub js: Vec<Mutex<Slot>>,
    pub event: Vec<Mutex<Slot>>,
}

impl SlotTable {
    fn new(count: usize) -> Self {
        SlotTable {
            js: (0..count).map(|_| Mutex::new(Slot::default())).collect(),
            event: (0..count).map(|_| Mutex::new(Slot::default())).collect(),
        }
    }

    fn track(&self, kind: DeviceKind) -> &[Mutex<Slot>] {
        match kind {
            DeviceKind::Js => &self.js,
            DeviceKind::Event => &self.event,
        }
    }

    /// Returns the socket fd for `(kind, index)` if already open, without touching
    /// state — this is the "connection reuse" path (spec §4.E "If the slot is
    /// already open, return the existing descriptor (do not reconnect)").
    pub fn existing_fd(&self, kind: DeviceKind, index: usize) -> Option<RawFd> {
        self.track(kind)
            .get(index)?
            .lock()
            .unwrap()
            .open
            .as_ref()
            .map(|o| o.fd)
    }

    /// Publishes a newly connected slot. Caller must already have confirmed via
    /// [`Self::existing_fd`] that the slot was free; this just re-checks under the
    /// same lock to stay correct against a racing `open()` on another thread.
    pub fn publish(&self, kind: DeviceKind, index: usize, open: OpenSlot) -> Result<(), OpenSlot> {
        let mut slot = self.track(kind)[index].lock().unwrap();
        if slot.open.is_some() {
            return Err(open);
        }
        slot.open = Some(open);
        Ok(())
    }

    /// Removes and returns the open slot matching `fd`, if any is currently
    /// registered under any slot/kind (spec §4.E "close(fd): if fd equals an active
    /// slot's socket descriptor, really close the socket and release the slot").
    pub fn take_by_fd(&self, fd: RawFd) -> Option<(DeviceKind, usize, OpenSlot)> {
        for (kind, track) in [(DeviceKind::Js, &self.js), (DeviceKind::Event, &self.event)] {
            for (index, slot) in track.iter().enumerate() {
                let mut guard = slot.lock().unwrap();
                if guard.open.as_ref().map(|o| o.fd) == Some(fd) {
                    return guard.open.take().map(|o| (kind, index, o));
                }
            }
        }
        None
    }

    /// Returns `true` if `fd` belongs to a currently-open managed slot.
    pub fn is_managed(&self, fd: RawFd) -> bool {
        [&self.js, &self.event].into_iter().any(|track| {
            track
                .iter()
                .any(|slot| slot.lock().unwrap().open.as_ref().map(|o| o.fd) == Some(fd))
        })
    }

    /// Runs `f` with exclusive access to the open slot owning `fd`, if any.
    pub fn with_open_mut<R>(&self, fd: RawFd, f: impl FnOnce(&mut OpenSlot) -> R) -> Option<R> {
        for track in [&self.js, &self.event] {
            for slot in track.iter() {
                let mut guard = slot.lock().unwrap();
                if guard.open.as_ref().map(|o| o.fd) == Some(fd) {
                    return guard.open.as_mut().map(f);
                }
            }
        }
        None
    }

    /// Runs `f` with shared access to the open slot owning `fd`, and the device kind
    /// it belongs to (needed by ioctl emulation to pick joystick vs evdev handling).
    pub fn with_open<R>(&self, fd: RawFd, f: impl FnOnce(DeviceKind, &OpenSlot) -> R) -> Option<R> {
        for (kind, track) in [(DeviceKind::Js, &self.js), (DeviceKind::Event, &self.event)] {
            for slot in track.iter() {
                let guard = slot.lock().unwrap();
                if let Some(open) = guard.open.as_ref() {
                    if open.fd == fd {
                        return Some(f(kind, open));
                    }
                }
            }
        }
        None
    }
}

static SLOTS: OnceLock<SlotTable> = OnceLock::new();

pub fn slots() -> &'static SlotTable {
    SLOTS.get_or_init(|| SlotTable::new(DEFAULT_SLOT_COUNT))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_open(fd: RawFd) -> OpenSlot {
        OpenSlot {
            fd,
            config: DeviceConfig::default(),
            open_flags: 0,
            correction: Vec::new(),
        }
    }

    #[test]
    fn publish_then_lookup_round_trips() {
        let table = SlotTable::new(2);
        assert!(table.existing_fd(DeviceKind::Js, 0).is_none());
        table.publish(DeviceKind::Js, 0, dummy_open(42)).unwrap();
        assert_eq!(table.existing_fd(DeviceKind::Js, 0), Some(42));
        assert!(table.is_managed(42));
    }

    #[test]
    fn publish_twice_without_close_fails() {
        let table = SlotTable::new(2);
        table.publish(DeviceKind::Js, 0, dummy_open(1)).unwrap();
        let err = table.publish(DeviceKind::Js, 0, dummy_open(2));
        assert!(err.is_err());
    }

    #[test]
    fn take_by_fd_frees_the_slot() {
        let table = SlotTable::new(2);
        table.publish(DeviceKind::Event, 1, dummy_open(7)).unwrap();
        let (kind, index, open) = table.take_by_fd(7).unwrap();
        assert_eq!(kind, DeviceKind::Event);
        assert_eq!(index, 1);
        assert_eq!(open.fd, 7);
        assert!(!table.is_managed(7));
        assert!(table.existing_fd(DeviceKind::Event, 1).is_none());
    }

    #[test]
    fn take_by_fd_on_unmanaged_fd_returns_none() {
        let table = SlotTable::new(2);
        assert!(table.take_by_fd(99).is_none());
    }

    #[test]
    fn slot_is_reusable_after_close() {
        let table = SlotTable::new(1);
        table.publish(DeviceKind::Js, 0, dummy_open(1)).unwrap();
        table.take_by_fd(1).unwrap();
        table.publish(DeviceKind::Js, 0, dummy_open(2)).unwrap();
        assert_eq!(table.existing_fd(DeviceKind::Js, 0), Some(2));
    }
}
