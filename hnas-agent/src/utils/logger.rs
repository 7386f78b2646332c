//! Logging configuration using tracing.
//!
//! Every phase logs to stdout and appends to a per-day file in the log
//! directory, e.g. `hnas_pre_backup_20240115.log`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the log file for `phase` on the given day.
pub fn log_file_path(log_dir: &Path, phase: &str, day: chrono::NaiveDate) -> PathBuf {
    log_dir.join(format!("hnas_{}_backup_{}.log", phase, day.format("%Y%m%d")))
}

/// Initialize logging with the specified level, writing to stdout and to the
/// daily log file under `log_dir`.
pub fn init(level: &str, log_dir: &Path, phase: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let path = log_file_path(log_dir, phase, chrono::Local::now().date_naive());
    let file = fs::create_dir_all(log_dir).and_then(|_| {
        OpenOptions::new().create(true).append(true).open(&path)
    });

    let (file_layer, file_error) = match file {
        Ok(file) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!("Could not open log file {}: {}; logging to stdout only", path.display(), e);
    }

    Ok(())
}
