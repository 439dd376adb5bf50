//! File logging bootstrap.
//!
//! Initialized once, when the first workspace is selected; log files roll
//! under `<workspace>/logs`. The validation and table layers stay silent by
//! design, so everything here serves the IPC boundary.

use std::path::Path;

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use once_cell::sync::OnceCell;

const LOG_BASENAME: &str = "zhurnald";
const MAX_LOG_FILE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Starts rolling file logging in `log_dir`. Idempotent for the same
/// directory; a second workspace in the same process keeps the first log
/// location rather than splitting the trail.
pub fn init(log_dir: &Path) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }

    let level = std::env::var("ZHURNALD_LOG").unwrap_or_else(|_| "info".to_string());
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("create log directory {}: {e}", log_dir.display()))?;

    let handle = Logger::try_with_str(&level)
        .map_err(|e| format!("bad log level `{level}`: {e}"))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .start()
        .map_err(|e| format!("start logger: {e}"))?;

    let _ = LOGGER.set(handle);
    log::info!(
        "logging started, version {}, level {}",
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(())
}
