//! Ioctl emulation (spec §4.F "Ioctl Emulation"): pure functions from a decoded
//! request plus the slot's device configuration to the bytes that should be copied
//! back into the caller's buffer. No syscalls happen here; `selkies-input-interposer`
//! owns the actual `ioctl()` interposition and calls [`dispatch`] to decide what to
//! do with it.

mod evdev;
mod joystick;

use crate::error::IoctlError;
use crate::kernel_abi::{decode, EV_IOC_TYPE, JS_IOC_TYPE};
use crate::slot::{DeviceKind, OpenSlot};

/// The result of emulating one ioctl: the bytes the shim should copy back into the
/// caller's buffer (empty if nothing needs writing back) and the value the call
/// itself should return. Most requests return `0` on success, but a handful
/// (`JSIOCGNAME`/`EVIOCGNAME`, `EVIOCGKEY`, `EVIOCGBIT`, `EVIOCSFF`) report a
/// non-negative count or id the way the real kernel ioctl does (spec §4.F "On
/// success the handler returns 0 or a non-negative count where the kernel would").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoctlOutcome {
    pub data: Vec<u8>,
    pub retval: i32,
}

impl IoctlOutcome {
    pub fn data(data: Vec<u8>) -> Self {
        Self { data, retval: 0 }
    }

    pub fn data_with_retval(data: Vec<u8>, retval: i32) -> Self {
        Self { data, retval }
    }
}

/// Emulates one ioctl call against an open managed slot.
///
/// `input` holds whatever the caller's buffer currently contains (needed by
/// `JSIOCSCORR` and `EVIOCSFF`, which both read back through the same pointer they
/// write through).
pub fn dispatch(kind: DeviceKind, slot: &mut OpenSlot, request: u64, input: &[u8]) -> Result<IoctlOutcome, IoctlError> {
    let req = decode(request);
    match (kind, req.ty) {
        (_, JS_IOC_TYPE) => joystick::dispatch(slot, req, input),
        (_, EV_IOC_TYPE) => evdev::dispatch(slot, req, input),
        _ => Err(IoctlError::NoSuchIoctl),
    }
}
