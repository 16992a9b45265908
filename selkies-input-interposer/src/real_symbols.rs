//! Lazy `dlsym(RTLD_NEXT, ...)` resolution of the real libc entry points this library
//! shadows. Grounded in the standard LD_PRELOAD shim idiom: resolve once per symbol,
//! cache in a `OnceLock`, call straight through afterward.

use std::ffi::{c_char, c_int, c_void, CString};
use std::sync::OnceLock;

use virtpad_core::error::SymbolResolutionError;

pub type OpenFn = unsafe extern "C" fn(*const c_char, c_int, libc::mode_t) -> c_int;
pub type CloseFn = unsafe extern "C" fn(c_int) -> c_int;
pub type ReadFn = unsafe extern "C" fn(c_int, *mut c_void, libc::size_t) -> libc::ssize_t;
pub type IoctlFn = unsafe extern "C" fn(c_int, libc::c_ulong, *mut c_void) -> c_int;
pub type EpollCtlFn = unsafe extern "C" fn(c_int, c_int, c_int, *mut libc::epoll_event) -> c_int;

type Resolved<F> = Result<F, SymbolResolutionError>;

static REAL_OPEN: OnceLock<Resolved<OpenFn>> = OnceLock::new();
static REAL_OPEN64: OnceLock<Resolved<OpenFn>> = OnceLock::new();
static REAL_CLOSE: OnceLock<Resolved<CloseFn>> = OnceLock::new();
static REAL_READ: OnceLock<Resolved<ReadFn>> = OnceLock::new();
static REAL_IOCTL: OnceLock<Resolved<IoctlFn>> = OnceLock::new();
static REAL_EPOLL_CTL: OnceLock<Resolved<EpollCtlFn>> = OnceLock::new();

/// Resolves `name` via `dlsym(RTLD_NEXT, ...)`. Spec §7 "Symbol loading failure
/// during dispatcher init" surfaces as the interposed call returning `-1`/`EFAULT`,
/// so failure here is reported to the caller rather than aborting the host process.
fn resolve<F: Copy>(name: &'static str) -> Resolved<F> {
    let cname = CString::new(name).expect("symbol name must not contain NUL");
    let ptr = unsafe { libc::dlsym(libc::RTLD_NEXT, cname.as_ptr()) };
    if ptr.is_null() {
        let err = SymbolResolutionError { symbol: name };
        log::error!("{err}");
        return Err(err);
    }
    Ok(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&ptr) })
}

pub fn real_open() -> Resolved<OpenFn> {
    *REAL_OPEN.get_or_init(|| resolve("open"))
}

pub fn real_open64() -> Resolved<OpenFn> {
    *REAL_OPEN64.get_or_init(|| resolve("open64"))
}

pub fn real_close() -> Resolved<CloseFn> {
    *REAL_CLOSE.get_or_init(|| resolve("close"))
}

pub fn real_read() -> Resolved<ReadFn> {
    *REAL_READ.get_or_init(|| resolve("read"))
}

pub fn real_ioctl() -> Resolved<IoctlFn> {
    *REAL_IOCTL.get_or_init(|| resolve("ioctl"))
}

pub fn real_epoll_ctl() -> Resolved<EpollCtlFn> {
    *REAL_EPOLL_CTL.get_or_init(|| resolve("epoll_ctl"))
}
