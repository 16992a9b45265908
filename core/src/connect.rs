//! Socket client connect/handshake (spec §4.D "Configuration Handshake").
//!
//! Grounded in the teacher's own gamepad connection setup
//! (`input/source/evdev/gamepad.rs`, which opens a uhid control socket and waits on
//! readiness before proceeding) for the retry-with-timeout shape, and in
//! `std::os::unix::net::UnixStream` directly for the transport itself — there is
//! nothing the teacher's dbus/netlink stack contributes here, since the wire format
//! is bespoke to this layer.

use std::io::{Read, Write};
use std::os::fd::{IntoRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use crate::error::ConnectError;
use crate::protocol::{word_size_byte, DeviceConfig, CONFIG_RECORD_SIZE, CONNECT_RETRY_INTERVAL_MS, CONNECT_TIMEOUT_MS};

/// Connects to `socket_path`, retrying while the peer isn't listening yet, performs
/// the configuration handshake, and hands back the raw socket fd (detached from the
/// `UnixStream` wrapper, so the caller owns it exactly like any other fd the host
/// might `read()`/`close()` directly) together with the parsed device configuration.
pub fn connect_and_handshake(
    socket_path: &str,
    nonblocking: bool,
) -> Result<(RawFd, DeviceConfig), ConnectError> {
    let deadline_start = Instant::now();

    let mut stream = loop {
        match UnixStream::connect(socket_path) {
            Ok(stream) => break stream,
            Err(source) => {
                let recoverable = matches!(
                    source.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                );
                let elapsed = deadline_start.elapsed();
                if recoverable && elapsed < Duration::from_millis(CONNECT_TIMEOUT_MS) {
                    std::thread::sleep(Duration::from_millis(CONNECT_RETRY_INTERVAL_MS));
                    continue;
                }
                if recoverable {
                    return Err(ConnectError::Timeout {
                        path: socket_path.to_string(),
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
                return Err(ConnectError::Io { path: socket_path.to_string(), source });
            }
        }
    };

    let mut wire = [0u8; CONFIG_RECORD_SIZE];
    if let Err(source) = stream.read_exact(&mut wire) {
        return Err(match source.kind() {
            std::io::ErrorKind::UnexpectedEof => ConnectError::HandshakeEof { path: socket_path.to_string() },
            _ => ConnectError::Io { path: socket_path.to_string(), source },
        });
    }
    let config = DeviceConfig::from_wire(&wire);

    stream
        .write_all(&[word_size_byte()])
        .map_err(|source| ConnectError::Io { path: socket_path.to_string(), source })?;

    if nonblocking {
        stream
            .set_nonblocking(true)
            .map_err(|source| ConnectError::Io { path: socket_path.to_string(), source })?;
    }

    Ok((stream.into_raw_fd(), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use std::thread;

    fn temp_socket_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("virtpad-core-test-{}-{}", std::process::id(), name));
        path
    }

    fn fake_server_once(path: std::path::PathBuf, wire: [u8; CONFIG_RECORD_SIZE]) -> thread::JoinHandle<Vec<u8>> {
        let listener = UnixListener::bind(&path).unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&wire).unwrap();
            let mut handshake_byte = [0u8; 1];
            stream.read_exact(&mut handshake_byte).unwrap();
            let _ = std::fs::remove_file(&path);
            handshake_byte.to_vec()
        })
    }

    #[test]
    fn connects_reads_config_and_sends_word_size() {
        let path = temp_socket_path("handshake");
        let mut cfg = DeviceConfig { name: "Test Pad".to_string(), vendor: 1, product: 2, ..Default::default() };
        cfg.num_btns = 3;
        let wire = cfg.to_wire();
        let server = fake_server_once(path.clone(), wire);

        let (fd, parsed) = connect_and_handshake(path.to_str().unwrap(), false).unwrap();
        assert!(fd >= 0);
        assert_eq!(parsed.name, "Test Pad");
        assert_eq!(parsed.num_btns, 3);

        let sent = server.join().unwrap();
        assert_eq!(sent[0], word_size_byte());

        unsafe { libc::close(fd) };
    }

    #[test]
    fn missing_socket_eventually_times_out() {
        let path = temp_socket_path("missing");
        let result = connect_and_handshake(path.to_str().unwrap(), false);
        assert!(matches!(result, Err(ConnectError::Timeout { .. })));
    }
}
