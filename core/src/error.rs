//! Ambient error types (spec §4.H, §7). Grounded in the teacher's `thiserror` use
//! (e.g. `LedMcError` in `input/source/led/multicolor.rs`, `LoadError` in
//! `config/mod.rs`): one `#[derive(Error)]` enum per concern, never `.unwrap()`'d in
//! non-test code.

use thiserror::Error;

/// Failures during the §4.D connect/handshake algorithm. The FFI shim maps every
/// variant to a failed `open()` returning `-1`/`EIO` (spec §7).
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("timed out connecting to {path} after {elapsed_ms}ms")]
    Timeout { path: String, elapsed_ms: u64 },

    #[error("i/o error connecting to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("peer closed during handshake for {path}")]
    HandshakeEof { path: String },
}

/// The errno-style codes spec §4.F/§7 associate with ioctl handling. Carried as a
/// typed enum rather than a raw `i32` so emulation code can't accidentally return an
/// un-mapped number; the FFI shim is the only place that turns this into `errno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IoctlError {
    #[error("no such ioctl")]
    NoSuchIoctl,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("operation not permitted")]
    NotPermitted,
    #[error("bad address")]
    BadAddress,
}

impl IoctlError {
    /// Raw errno value the FFI shim sets on `-1` return (spec §4.F "Error encoding").
    pub fn errno(self) -> i32 {
        match self {
            IoctlError::NoSuchIoctl => libc::ENOTTY,
            IoctlError::InvalidArgument => libc::EINVAL,
            IoctlError::NotPermitted => libc::EPERM,
            IoctlError::BadAddress => libc::EFAULT,
        }
    }
}

/// spec §7 "Symbol loading failure during dispatcher init": the real libc symbol the
/// dispatcher needs could not be resolved via `dlsym`.
#[derive(Debug, Clone, Copy, Error)]
#[error("failed to resolve real symbol {symbol}")]
pub struct SymbolResolutionError {
    pub symbol: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ioctl_errors_map_to_documented_errno() {
        assert_eq!(IoctlError::NoSuchIoctl.errno(), libc::ENOTTY);
        assert_eq!(IoctlError::InvalidArgument.errno(), libc::EINVAL);
        assert_eq!(IoctlError::NotPermitted.errno(), libc::EPERM);
        assert_eq!(IoctlError::BadAddress.errno(), libc::EFAULT);
    }
}
