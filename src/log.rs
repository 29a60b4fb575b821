// src/log.rs
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::consts::{LOG_FILE, STORE_DIR};

/// Install the global subscriber: elapsed-time stamps, `RUST_LOG` filter
/// (default `info`), appending to `.store/debug.log` under `root`.
/// Falls back to stderr when the file cannot be opened. Returns the log file
/// path when file logging is active. Safe to call more than once.
pub fn init(root: &Path) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::Uptime::default())
        .with_target(false);

    let path = root.join(STORE_DIR).join(LOG_FILE);
    match open_append(&path) {
        Ok(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .ok()
            .map(|_| path),
        Err(_) => {
            let _ = builder.with_writer(io::stderr).try_init();
            None
        }
    }
}

fn open_append(path: &Path) -> io::Result<fs::File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
