//! Fake Device Discovery Library (spec §4.A "Fake udev Context Library").
//!
//! An `LD_PRELOAD`ed `cdylib` that answers the subset of libudev's C ABI a gamepad
//! consumer (SDL, evdev-rs, etc.) actually calls, backed entirely by
//! `virtpad_core::discovery`'s synthesized device tree instead of the real `/sys`.
//! Every `#[no_mangle] extern "C"` function here is a thin marshal: convert C
//! pointers/strings in, call into `virtpad_core`, convert the Rust result back out.
//!
//! No `dlsym(RTLD_NEXT, ...)` fallback is needed: functions this library doesn't
//! implement are simply absent from it, so the dynamic linker resolves them against
//! whatever real `libudev.so` is also loaded, exactly as if this library weren't
//! preloaded at all.

mod ffi_handle;
mod list_entry;
mod strings;

use std::ffi::c_char;
use std::os::raw::c_int;
use std::sync::Arc;

use virtpad_core::discovery::handle::{ContextHandle, DeviceHandle, EnumerateHandle, MonitorHandle, QueueHandle, RefCounted};
use virtpad_core::discovery::query;

use ffi_handle::{borrow, into_raw, ref_raw, unref_raw};
use list_entry::{list_chain_to_raw, UdevListEntry};
use strings::{leak_cstring, opt_str_from_ptr, str_from_ptr};

fn ensure_logging() {
    virtpad_core::logging::init();
}

// --- udev context ----------------------------------------------------------------

#[no_mangle]
pub extern "C" fn udev_new() -> *mut RefCounted<virtpad_core::discovery::handle::ContextState> {
    ensure_logging();
    log::debug!("udev_new");
    into_raw(query::new_context())
}

#[no_mangle]
pub unsafe extern "C" fn udev_ref(
    udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
) -> *mut RefCounted<virtpad_core::discovery::handle::ContextState> {
    ref_raw(udev)
}

#[no_mangle]
pub unsafe extern "C" fn udev_unref(
    udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
) -> *mut RefCounted<virtpad_core::discovery::handle::ContextState> {
    unref_raw(udev)
}

// --- udev_device ------------------------------------------------------------------

type DeviceRaw = RefCounted<virtpad_core::discovery::handle::DeviceState>;

unsafe fn device_handle(ptr: *mut DeviceRaw) -> Option<DeviceHandle> {
    borrow(ptr).map(|_| {
        let arc = Arc::from_raw(ptr as *const DeviceRaw);
        let clone = Arc::clone(&arc);
        std::mem::forget(arc);
        clone
    })
}

unsafe fn ctx_handle(ptr: *mut RefCounted<virtpad_core::discovery::handle::ContextState>) -> Option<ContextHandle> {
    borrow(ptr).map(|_| {
        let arc = Arc::from_raw(ptr as *const _);
        let clone = Arc::clone(&arc);
        std::mem::forget(arc);
        clone
    })
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_new_from_syspath(
    udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
    syspath: *const c_char,
) -> *mut DeviceRaw {
    let Some(ctx) = ctx_handle(udev) else { return std::ptr::null_mut() };
    let Some(path) = str_from_ptr(syspath) else { return std::ptr::null_mut() };
    match query::device_from_syspath(&ctx, path) {
        Some(dev) => into_raw(dev),
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_new_from_subsystem_sysname(
    udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
    subsystem: *const c_char,
    sysname: *const c_char,
) -> *mut DeviceRaw {
    let Some(ctx) = ctx_handle(udev) else { return std::ptr::null_mut() };
    let (Some(subsystem), Some(sysname)) = (str_from_ptr(subsystem), str_from_ptr(sysname)) else {
        return std::ptr::null_mut();
    };
    match query::device_from_subsystem_sysname(&ctx, subsystem, sysname) {
        Some(dev) => into_raw(dev),
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_ref(dev: *mut DeviceRaw) -> *mut DeviceRaw {
    ref_raw(dev)
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_unref(dev: *mut DeviceRaw) -> *mut DeviceRaw {
    unref_raw(dev)
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_syspath(dev: *mut DeviceRaw) -> *const c_char {
    let Some(dev) = device_handle(dev) else { return std::ptr::null() };
    leak_cstring(query::syspath(&dev))
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_devnode(dev: *mut DeviceRaw) -> *const c_char {
    let Some(dev) = device_handle(dev) else { return std::ptr::null() };
    match query::devnode(&dev) {
        Some(s) => leak_cstring(s),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_subsystem(dev: *mut DeviceRaw) -> *const c_char {
    let Some(dev) = device_handle(dev) else { return std::ptr::null() };
    leak_cstring(query::subsystem(&dev))
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_sysname(dev: *mut DeviceRaw) -> *const c_char {
    let Some(dev) = device_handle(dev) else { return std::ptr::null() };
    leak_cstring(query::sysname(&dev))
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_devtype(dev: *mut DeviceRaw) -> *const c_char {
    let Some(dev) = device_handle(dev) else { return std::ptr::null() };
    match query::devtype(&dev) {
        Some(s) => leak_cstring(s),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_property_value(dev: *mut DeviceRaw, key: *const c_char) -> *const c_char {
    let (Some(dev), Some(key)) = (device_handle(dev), str_from_ptr(key)) else { return std::ptr::null() };
    match query::property_value(&dev, key) {
        Some(s) => leak_cstring(s),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_sysattr_value(dev: *mut DeviceRaw, key: *const c_char) -> *const c_char {
    let (Some(dev), Some(key)) = (device_handle(dev), str_from_ptr(key)) else { return std::ptr::null() };
    match query::sysattr_value(&dev, key) {
        Some(s) => leak_cstring(s),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_properties_list_entry(dev: *mut DeviceRaw) -> *mut UdevListEntry {
    let Some(dev) = device_handle(dev) else { return std::ptr::null_mut() };
    list_chain_to_raw(query::properties_list_entry(&dev))
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_devlinks_list_entry(dev: *mut DeviceRaw) -> *mut UdevListEntry {
    let Some(dev) = device_handle(dev) else { return std::ptr::null_mut() };
    list_chain_to_raw(query::devlinks_list_entry(&dev))
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_parent(dev: *mut DeviceRaw) -> *mut DeviceRaw {
    let Some(dev) = device_handle(dev) else { return std::ptr::null_mut() };
    match query::generic_parent(&dev) {
        Some(parent) => into_raw(parent),
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_device_get_parent_with_subsystem_devtype(
    dev: *mut DeviceRaw,
    subsystem: *const c_char,
    devtype: *const c_char,
) -> *mut DeviceRaw {
    let Some(dev) = device_handle(dev) else { return std::ptr::null_mut() };
    let Some(subsystem) = str_from_ptr(subsystem) else { return std::ptr::null_mut() };
    let devtype = opt_str_from_ptr(devtype);
    match query::parent_with(&dev, subsystem, devtype) {
        Some(parent) => into_raw(parent),
        None => std::ptr::null_mut(),
    }
}

// --- udev_enumerate -----------------------------------------------------------------

type EnumerateRaw = RefCounted<virtpad_core::discovery::handle::EnumerateState>;

unsafe fn enumerate_handle(ptr: *mut EnumerateRaw) -> Option<EnumerateHandle> {
    borrow(ptr).map(|_| {
        let arc = Arc::from_raw(ptr as *const EnumerateRaw);
        let clone = Arc::clone(&arc);
        std::mem::forget(arc);
        clone
    })
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_new(
    udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
) -> *mut EnumerateRaw {
    let Some(ctx) = ctx_handle(udev) else { return std::ptr::null_mut() };
    into_raw(query::new_enumeration(&ctx))
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_ref(en: *mut EnumerateRaw) -> *mut EnumerateRaw {
    ref_raw(en)
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_unref(en: *mut EnumerateRaw) -> *mut EnumerateRaw {
    unref_raw(en)
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_subsystem(en: *mut EnumerateRaw, subsystem: *const c_char) -> c_int {
    let (Some(en), Some(subsystem)) = (enumerate_handle(en), str_from_ptr(subsystem)) else { return -1 };
    query::add_match_subsystem(&en, subsystem);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_sysname(en: *mut EnumerateRaw, sysname: *const c_char) -> c_int {
    let (Some(en), Some(sysname)) = (enumerate_handle(en), str_from_ptr(sysname)) else { return -1 };
    query::add_match_sysname(&en, sysname);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_property(
    en: *mut EnumerateRaw,
    name: *const c_char,
    value: *const c_char,
) -> c_int {
    let (Some(en), Some(name)) = (enumerate_handle(en), str_from_ptr(name)) else { return -1 };
    query::add_match_property(&en, name, opt_str_from_ptr(value));
    0
}

/// One no-op entry point shared by every `add_match_*` spec §4.C says "accept and
/// succeed, but have no effect" for: tag, parent, is_initialized, expr sysattr.
#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_tag(en: *mut EnumerateRaw, _tag: *const c_char) -> c_int {
    let Some(en) = enumerate_handle(en) else { return -1 };
    query::add_match_noop(&en);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_parent(en: *mut EnumerateRaw, _parent: *mut DeviceRaw) -> c_int {
    let Some(en) = enumerate_handle(en) else { return -1 };
    query::add_match_noop(&en);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_is_initialized(en: *mut EnumerateRaw) -> c_int {
    let Some(en) = enumerate_handle(en) else { return -1 };
    query::add_match_noop(&en);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_add_match_sysattr(
    en: *mut EnumerateRaw,
    _key: *const c_char,
    _value: *const c_char,
) -> c_int {
    let Some(en) = enumerate_handle(en) else { return -1 };
    query::add_match_noop(&en);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_scan_devices(en: *mut EnumerateRaw) -> c_int {
    let Some(en) = enumerate_handle(en) else { return -1 };
    query::scan_devices(&en);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_scan_subsystems(en: *mut EnumerateRaw) -> c_int {
    let Some(en) = enumerate_handle(en) else { return -1 };
    query::scan_subsystems(&en);
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_enumerate_get_list_entry(en: *mut EnumerateRaw) -> *mut UdevListEntry {
    let Some(en) = enumerate_handle(en) else { return std::ptr::null_mut() };
    list_chain_to_raw(query::enumeration_list_entry(&en))
}

// --- udev_list_entry ----------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn udev_list_entry_get_name(entry: *mut UdevListEntry) -> *const c_char {
    match entry.as_ref() {
        Some(e) => e.name_ptr(),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_list_entry_get_value(entry: *mut UdevListEntry) -> *const c_char {
    match entry.as_ref() {
        Some(e) => e.value_ptr(),
        None => std::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_list_entry_get_next(entry: *mut UdevListEntry) -> *mut UdevListEntry {
    match entry.as_ref() {
        Some(e) => e.next_raw(),
        None => std::ptr::null_mut(),
    }
}

// --- udev_monitor -------------------------------------------------------------------

type MonitorRaw = RefCounted<virtpad_core::discovery::handle::MonitorState>;

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_new_from_netlink(
    _udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
    _name: *const c_char,
) -> *mut MonitorRaw {
    into_raw(query::new_monitor())
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_ref(mon: *mut MonitorRaw) -> *mut MonitorRaw {
    ref_raw(mon)
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_unref(mon: *mut MonitorRaw) -> *mut MonitorRaw {
    unref_raw(mon)
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_enable_receiving(_mon: *mut MonitorRaw) -> c_int {
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_get_fd(_mon: *mut MonitorRaw) -> c_int {
    query::monitor_get_fd()
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_receive_device(mon: *mut MonitorRaw) -> *mut DeviceRaw {
    let Some(_) = borrow(mon) else { return std::ptr::null_mut() };
    let fake: MonitorHandle = {
        let arc = Arc::from_raw(mon as *const MonitorRaw);
        let clone = Arc::clone(&arc);
        std::mem::forget(arc);
        clone
    };
    match query::monitor_receive_device(&fake) {
        Some(dev) => into_raw(dev),
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_filter_add_match_subsystem_devtype(
    _mon: *mut MonitorRaw,
    _subsystem: *const c_char,
    _devtype: *const c_char,
) -> c_int {
    0
}

#[no_mangle]
pub unsafe extern "C" fn udev_monitor_filter_update(_mon: *mut MonitorRaw) -> c_int {
    0
}

// --- udev_queue ---------------------------------------------------------------------

type QueueRaw = RefCounted<virtpad_core::discovery::handle::QueueState>;

#[no_mangle]
pub unsafe extern "C" fn udev_queue_new(
    _udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
) -> *mut QueueRaw {
    into_raw(query::new_queue())
}

#[no_mangle]
pub unsafe extern "C" fn udev_queue_ref(q: *mut QueueRaw) -> *mut QueueRaw {
    ref_raw(q)
}

#[no_mangle]
pub unsafe extern "C" fn udev_queue_unref(q: *mut QueueRaw) -> *mut QueueRaw {
    unref_raw(q)
}

#[no_mangle]
pub unsafe extern "C" fn udev_queue_get_queue_is_empty(q: *mut QueueRaw) -> c_int {
    let Some(_) = borrow(q) else { return 1 };
    let handle: QueueHandle = {
        let arc = Arc::from_raw(q as *const QueueRaw);
        let clone = Arc::clone(&arc);
        std::mem::forget(arc);
        clone
    };
    query::queue_is_empty(&handle) as c_int
}

#[no_mangle]
pub unsafe extern "C" fn udev_queue_get_seqnum_is_finished(q: *mut QueueRaw, _seqnum: u64) -> c_int {
    let Some(_) = borrow(q) else { return 1 };
    let handle: QueueHandle = {
        let arc = Arc::from_raw(q as *const QueueRaw);
        let clone = Arc::clone(&arc);
        std::mem::forget(arc);
        clone
    };
    query::seqnum_is_finished(&handle) as c_int
}

// --- udev_hwdb: spec.md names hwdb only to scope it out of this layer; the real
// hwdb is never consulted in the fake tree, and the pack's consumers never query it
// either, so these just return null/empty rather than a synthesized lookup table.

#[no_mangle]
pub unsafe extern "C" fn udev_hwdb_new(
    _udev: *mut RefCounted<virtpad_core::discovery::handle::ContextState>,
) -> *mut std::ffi::c_void {
    std::ptr::null_mut()
}

#[no_mangle]
pub unsafe extern "C" fn udev_hwdb_unref(_hwdb: *mut std::ffi::c_void) -> *mut std::ffi::c_void {
    std::ptr::null_mut()
}

// --- misc ----------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn udev_util_encode_string(input: *const c_char, out: *mut c_char, len: usize) -> c_int {
    let Some(input) = str_from_ptr(input) else { return -1 };
    let encoded = query::util_encode_string(input);
    let bytes = encoded.as_bytes();
    if bytes.len() + 1 > len {
        return -1;
    }
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, out, bytes.len());
    *out.add(bytes.len()) = 0;
    0
}
