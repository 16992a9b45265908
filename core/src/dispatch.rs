//! Path-to-slot resolution and the `open()`/`close()`/`read()` decision logic (spec
//! §4.E "Device I/O Dispatcher"). This module is the pure decision layer; the actual
//! `dlsym`-resolved libc calls live in the `selkies-input-interposer` crate, which
//! calls back into these functions to decide *what* to do.

use std::os::fd::RawFd;

use crate::config::{event_devnode, js_devnode, DEFAULT_SLOT_COUNT};
use crate::connect::connect_and_handshake;
use crate::error::ConnectError;
use crate::kernel_abi::{INPUT_EVENT_SIZE, JS_EVENT_SIZE};
use crate::slot::{slots, DeviceKind, OpenSlot};

/// Returns the slot a managed path names, or `None` if `path` isn't one of ours
/// (spec §4.E "Is this path one we manage? ... else pass through to the real
/// `open()`").
pub fn resolve_path(path: &str) -> Option<(DeviceKind, usize)> {
    for index in 0..DEFAULT_SLOT_COUNT {
        if path == js_devnode(index) {
            return Some((DeviceKind::Js, index));
        }
        if path == event_devnode(index) {
            return Some((DeviceKind::Event, index));
        }
    }
    None
}

/// `open()` on a managed path (spec §4.E): reuse an already-open slot without a
/// fresh handshake, or connect and perform the handshake for a newly opened one.
pub fn open_managed(kind: DeviceKind, index: usize, flags: i32) -> Result<RawFd, ConnectError> {
    if let Some(fd) = slots().existing_fd(kind, index) {
        return Ok(fd);
    }

    let socket_path = match kind {
        DeviceKind::Js => crate::config::js_socket_path(index),
        DeviceKind::Event => crate::config::event_socket_path(index),
    };
    let nonblocking = flags & libc::O_NONBLOCK != 0;
    let (fd, config) = connect_and_handshake(&socket_path, nonblocking)?;

    let open = OpenSlot { fd, config, open_flags: flags, correction: Vec::new() };
    if slots().publish(kind, index, open).is_err() {
        // Lost the race to another thread opening the same slot concurrently; the
        // winner's descriptor is already published, so ours is now redundant.
        unsafe { libc::close(fd) };
        return Ok(slots().existing_fd(kind, index).expect("slot just published by a racing opener"));
    }
    Ok(fd)
}

/// `close(fd)` (spec §4.E): returns `true` if `fd` was a managed slot and has been
/// released, `false` if the caller should fall through to the real `close()`.
pub fn close_managed(fd: RawFd) -> bool {
    if let Some((_, _, open)) = slots().take_by_fd(fd) {
        unsafe { libc::close(open.fd) };
        true
    } else {
        false
    }
}

pub fn is_managed_fd(fd: RawFd) -> bool {
    slots().is_managed(fd)
}

/// The device kind a managed fd belongs to, needed to route `read()`/`ioctl()`
/// emulation correctly. `None` means `fd` isn't one of ours.
pub fn kind_for_fd(fd: RawFd) -> Option<DeviceKind> {
    slots().with_open(fd, |kind, _| kind)
}

/// The fixed per-record size a managed `read()` must use (spec §6 "`/dev/input/jsX`
/// ... 8-byte records", "`/dev/input/eventY` ... `struct input_event` records").
pub fn event_size_for(kind: DeviceKind) -> usize {
    match kind {
        DeviceKind::Js => JS_EVENT_SIZE,
        DeviceKind::Event => INPUT_EVENT_SIZE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferTooSmall;

/// spec §4.E "Require count >= event_size; if not, fail with invalid argument."
/// Returns the exact byte count the real `read()` should be issued with.
pub fn validate_read_count(kind: DeviceKind, count: usize) -> Result<usize, BufferTooSmall> {
    let size = event_size_for(kind);
    if count < size {
        Err(BufferTooSmall)
    } else {
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_matches_js_and_event_nodes() {
        assert_eq!(resolve_path("/dev/input/js0"), Some((DeviceKind::Js, 0)));
        assert_eq!(resolve_path("/dev/input/event1002"), Some((DeviceKind::Event, 2)));
        assert_eq!(resolve_path("/dev/input/js99"), None);
        assert_eq!(resolve_path("/dev/tty0"), None);
    }

    #[test]
    fn validate_read_count_rejects_undersized_buffers() {
        assert_eq!(validate_read_count(DeviceKind::Js, 8), Ok(8));
        assert_eq!(validate_read_count(DeviceKind::Js, 4), Err(BufferTooSmall));
        assert_eq!(validate_read_count(DeviceKind::Event, 24), Ok(24));
        assert_eq!(validate_read_count(DeviceKind::Event, 1), Err(BufferTooSmall));
    }

    #[test]
    fn close_managed_on_unknown_fd_returns_false() {
        assert!(!close_managed(123_456));
    }
}
