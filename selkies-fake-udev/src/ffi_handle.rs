//! Generic glue between `Arc<RefCounted<T>>` (the handle type every discovery object
//! in `virtpad-core` uses) and the raw pointers libudev's C ABI exchanges.
//!
//! `Arc::into_raw`/`Arc::from_raw` let a raw pointer stand in for "one strong
//! reference is owned out here, outside Rust's tracking"; `ref_raw`/`unref_raw` pair
//! every `udev_*_ref`/`udev_*_unref` call with exactly one `Arc` strong-count
//! increment/decrement, so the backing allocation frees itself the moment the last
//! `unref` drops the last strong reference -- the logical refcount `RefCounted`
//! itself tracks (spec-visible, polled by nothing here) just rides along for parity.

use std::sync::Arc;
use virtpad_core::discovery::handle::RefCounted;

/// Converts an owned handle into the raw pointer form exposed across the FFI
/// boundary. Call once, at construction (`udev_new`, `udev_enumerate_new`, ...).
pub fn into_raw<T>(handle: Arc<RefCounted<T>>) -> *mut RefCounted<T> {
    Arc::into_raw(handle) as *mut RefCounted<T>
}

/// Borrows the pointee without changing any refcount. Returns `None` for null.
///
/// # Safety
/// `ptr` must be a pointer previously returned by [`into_raw`] (directly, or via
/// [`ref_raw`]) and not yet freed by a matching `unref_raw` that returned null.
pub unsafe fn borrow<'a, T>(ptr: *const RefCounted<T>) -> Option<&'a RefCounted<T>> {
    ptr.as_ref()
}

/// `udev_*_ref`: bumps both the logical count and the `Arc` strong count, returning
/// the same pointer (ref never relocates, matching real libudev semantics).
///
/// # Safety
/// Same precondition as [`borrow`].
pub unsafe fn ref_raw<T>(ptr: *mut RefCounted<T>) -> *mut RefCounted<T> {
    if ptr.is_null() {
        return ptr;
    }
    let arc = Arc::from_raw(ptr as *const RefCounted<T>);
    let bumped = arc.bump_ref();
    std::mem::forget(arc);
    Arc::into_raw(bumped) as *mut RefCounted<T>
}

/// `udev_*_unref`: decrements both counts; drops the backing `Arc` strong reference
/// it reclaimed, freeing the allocation once the last reference is gone. Returns the
/// same pointer if other references remain, null once freed (matching libudev).
///
/// # Safety
/// Same precondition as [`borrow`]; `ptr` must not be used again if this returns null.
pub unsafe fn unref_raw<T>(ptr: *mut RefCounted<T>) -> *mut RefCounted<T> {
    if ptr.is_null() {
        return ptr;
    }
    let arc = Arc::from_raw(ptr as *const RefCounted<T>);
    if arc.bump_unref().is_none() {
        std::ptr::null_mut()
    } else {
        ptr
    }
}
