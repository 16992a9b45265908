//! Compile-time configuration (spec §4.I).
//!
//! Modeled after the teacher crate's `config::path` module: one place that holds the
//! fixed paths and counts so the rest of the crate never hardcodes them inline. Slot
//! count is compile-time by design (spec.md Non-goals rule out hotplug and dynamic
//! reconfiguration), so unlike the teacher's XDG-searching `get_base_path`, this is a
//! flat set of constants rather than a runtime search.

/// Number of virtual gamepads to emulate (spec §1, §6: "default N = 4").
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// Fixed append-only debug log path (spec §6 "Persisted state").
pub const LOG_FILE_PATH: &str = "/tmp/selkies_virtpad.log";

/// Returns the joystick devnode path for slot `index` (e.g. `/dev/input/js0`).
pub fn js_devnode(index: usize) -> String {
    format!("/dev/input/js{index}")
}

/// Returns the evdev devnode path for slot `index` (e.g. `/dev/input/event1000`).
pub fn event_devnode(index: usize) -> String {
    format!("/dev/input/event{}", 1000 + index)
}

/// Returns the joystick socket path for slot `index` (e.g. `/tmp/selkies_js0.sock`).
pub fn js_socket_path(index: usize) -> String {
    format!("/tmp/selkies_js{index}.sock")
}

/// Returns the event socket path for slot `index` (e.g. `/tmp/selkies_event1000.sock`).
pub fn event_socket_path(index: usize) -> String {
    format!("/tmp/selkies_event{}.sock", 1000 + index)
}
