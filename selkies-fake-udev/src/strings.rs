//! C string marshaling helpers.

use std::ffi::{c_char, CStr, CString};

/// Borrows `ptr` as UTF-8. `None` for null or non-UTF-8 input -- callers that can't
/// proceed without the argument treat `None` as "fail the call".
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated C string valid for `'a`.
pub unsafe fn str_from_ptr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Same conversion, named separately for call sites where null is a meaningful value
/// (e.g. "match any value") rather than a missing required argument.
///
/// # Safety
/// Same precondition as [`str_from_ptr`].
pub unsafe fn opt_str_from_ptr<'a>(ptr: *const c_char) -> Option<&'a str> {
    str_from_ptr(ptr)
}

/// Hands an owned Rust string to C as a `NUL`-terminated pointer. The `CString` is
/// intentionally leaked: libudev's getters return pointers owned by the queried
/// object for its lifetime, and these injected libraries live for one short-lived
/// host process, so reclaiming per-call string memory buys nothing.
pub fn leak_cstring(s: String) -> *const c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw() as *const c_char,
        Err(_) => std::ptr::null(),
    }
}
