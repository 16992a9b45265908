//! Ambient logging (spec §4.G).
//!
//! Grounded in the teacher's `main.rs`, which reads `LOG_LEVEL`, maps it onto
//! `RUST_LOG`, and calls `env_logger::init()`. These libraries have no `main`, so
//! initialization happens lazily on first entry and the default target is an
//! append-mode file instead of stderr, since stderr belongs to the host process we
//! were injected into.

use std::fs::OpenOptions;
use std::sync::Once;

use crate::config::LOG_FILE_PATH;

static INIT: Once = Once::new();

/// Initializes the process-wide logger exactly once. Safe to call from every public
/// entry point; subsequent calls are no-ops. Never panics: if the log file cannot be
/// opened, falls back to a logger that discards everything rather than taking down
/// the host process.
pub fn init() {
    INIT.call_once(|| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        std::env::set_var("RUST_LOG", &level);

        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE_PATH)
        {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                // No writable log file; keep running with logging effectively disabled
                // rather than letting an injected library fail the host's own open().
                builder.filter_level(log::LevelFilter::Off);
                eprintln!("selkies-virtpad: could not open log file {LOG_FILE_PATH}: {e}");
            }
        }
        // `try_init` instead of `init`: if the host process (or the sibling library,
        // also linked into the same address space) already installed a logger, keep it.
        let _ = builder.try_init();
    });
}
