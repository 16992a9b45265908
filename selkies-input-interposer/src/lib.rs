//! Device I/O Interposer Library (spec §4.E/§4.F).
//!
//! An `LD_PRELOAD`ed `cdylib` shadowing `open`/`open64`/`close`/`read`/`ioctl`/
//! `epoll_ctl`. Calls against `/dev/input/jsX` and `/dev/input/eventY` are routed to
//! the matching slot's Unix socket and the kernel ioctl ABI is emulated in
//! `virtpad_core`; everything else passes straight through to the real libc symbol
//! resolved lazily via `dlsym(RTLD_NEXT, ...)`.

mod real_symbols;

use std::ffi::{c_char, c_int, c_void, CStr};

use virtpad_core::dispatch::{self, BufferTooSmall};
use virtpad_core::error::SymbolResolutionError;
use virtpad_core::kernel_abi::{decode, ev_nr, EV_IOC_TYPE};
use virtpad_core::slot::slots;

use real_symbols::{real_close, real_epoll_ctl, real_ioctl, real_open, real_open64, real_read};

fn ensure_logging() {
    virtpad_core::logging::init();
}

unsafe fn set_errno(value: c_int) {
    *libc::__errno_location() = value;
}

unsafe fn path_str<'a>(path: *const c_char) -> Option<&'a str> {
    if path.is_null() {
        return None;
    }
    CStr::from_ptr(path).to_str().ok()
}

/// spec §7 "Symbol loading failure during dispatcher init ... returning -1 with
/// EFAULT": the shared landing spot every call site falls back to when its real
/// symbol never resolved.
unsafe fn resolution_failed(err: SymbolResolutionError) -> c_int {
    log::error!("{err}");
    set_errno(libc::EFAULT);
    -1
}

/// Shared body for `open`/`open64`: only the real fallback symbol differs.
unsafe fn handle_open(
    path: *const c_char,
    flags: c_int,
    mode: libc::mode_t,
    real: fn() -> Result<real_symbols::OpenFn, SymbolResolutionError>,
) -> c_int {
    ensure_logging();
    let Some(path_str) = path_str(path) else {
        return match real() {
            Ok(f) => f(path, flags, mode),
            Err(err) => resolution_failed(err),
        };
    };
    let Some((kind, index)) = dispatch::resolve_path(path_str) else {
        return match real() {
            Ok(f) => f(path, flags, mode),
            Err(err) => resolution_failed(err),
        };
    };
    match dispatch::open_managed(kind, index, flags) {
        Ok(fd) => fd,
        Err(err) => {
            log::warn!("open({path_str}) failed: {err}");
            set_errno(libc::EIO);
            -1
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn open(path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
    handle_open(path, flags, mode, real_open)
}

#[no_mangle]
pub unsafe extern "C" fn open64(path: *const c_char, flags: c_int, mode: libc::mode_t) -> c_int {
    handle_open(path, flags, mode, real_open64)
}

#[no_mangle]
pub unsafe extern "C" fn close(fd: c_int) -> c_int {
    if dispatch::close_managed(fd) {
        return 0;
    }
    match real_close() {
        Ok(f) => f(fd),
        Err(err) => resolution_failed(err),
    }
}

#[no_mangle]
pub unsafe extern "C" fn read(fd: c_int, buf: *mut c_void, count: libc::size_t) -> libc::ssize_t {
    let Some(kind) = dispatch::kind_for_fd(fd) else {
        return match real_read() {
            Ok(f) => f(fd, buf, count),
            Err(err) => resolution_failed(err) as libc::ssize_t,
        };
    };
    match dispatch::validate_read_count(kind, count as usize) {
        Ok(event_size) => match real_read() {
            Ok(f) => f(fd, buf, event_size as libc::size_t),
            Err(err) => resolution_failed(err) as libc::ssize_t,
        },
        Err(BufferTooSmall) => {
            set_errno(libc::EINVAL);
            -1
        }
    }
}

/// `EVIOCGRAB`/`EVIOCRMFF` pass their argument by value (the register slot holds the
/// int itself, not a pointer to one); every other ioctl this library handles passes a
/// pointer to a `req.size`-byte buffer.
fn takes_scalar_argument(req: virtpad_core::kernel_abi::IocRequest) -> bool {
    req.ty == EV_IOC_TYPE && (req.nr == ev_nr::GRAB || req.nr == ev_nr::RMFF)
}

#[no_mangle]
pub unsafe extern "C" fn ioctl(fd: c_int, request: libc::c_ulong, argp: *mut c_void) -> c_int {
    let Some(kind) = dispatch::kind_for_fd(fd) else {
        return match real_ioctl() {
            Ok(f) => f(fd, request, argp),
            Err(err) => resolution_failed(err),
        };
    };

    let req = decode(request as u64);
    let input: &[u8] = if takes_scalar_argument(req) || req.size == 0 || argp.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(argp as *const u8, req.size as usize)
    };

    let outcome = slots().with_open_mut(fd, |slot| virtpad_core::ioctl::dispatch(kind, slot, request as u64, input));

    match outcome {
        None => {
            set_errno(libc::ENOTTY);
            -1
        }
        Some(Err(err)) => {
            set_errno(err.errno());
            -1
        }
        Some(Ok(outcome)) => {
            if !outcome.data.is_empty() && !argp.is_null() {
                std::ptr::copy_nonoverlapping(outcome.data.as_ptr(), argp as *mut u8, outcome.data.len());
            }
            outcome.retval
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn epoll_ctl(epfd: c_int, op: c_int, fd: c_int, event: *mut libc::epoll_event) -> c_int {
    let result = match real_epoll_ctl() {
        Ok(f) => f(epfd, op, fd, event),
        Err(err) => return resolution_failed(err),
    };
    if result == 0
        && (op == libc::EPOLL_CTL_ADD || op == libc::EPOLL_CTL_MOD)
        && dispatch::is_managed_fd(fd)
    {
        if let Err(e) = nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_SETFL(nix::fcntl::OFlag::O_NONBLOCK)) {
            log::warn!("failed to force O_NONBLOCK on managed fd {fd}: {e}");
        }
    }
    result
}
