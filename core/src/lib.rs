//! Shared logic behind both injected libraries: the fake discovery tree, the wire
//! protocol to the real gamepad source, kernel ioctl ABI emulation, and the per-slot
//! dispatcher state that ties them together.
//!
//! Split out of the two `cdylib` crates (`selkies-fake-udev`,
//! `selkies-input-interposer`) so that the bulk of this crate's logic — everything
//! except the raw `#[no_mangle] extern "C"` entry points themselves — can be
//! exercised by `cargo test` without linking a test harness against symbols like
//! `open`/`close`/`read` that collide with libc's own.

pub mod config;
pub mod connect;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod ioctl;
pub mod kernel_abi;
pub mod logging;
pub mod protocol;
pub mod slot;
