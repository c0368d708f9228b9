//! Filepath: src/logging.rs
//!
//! Subscriber setup for the binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever runs it. Two setups are provided:
//!
//! - [`init_tracing`]: compact console output filtered by `RUST_LOG`.
//! - [`init_json_tracing`]: console output plus newline-delimited JSON written
//!   through a non-blocking appender. Keep the returned guard alive until the
//!   process exits or buffered lines are lost.
//!
//! Environment variables:
//! - `RUST_LOG`: filter directives (e.g. `mapbench=debug`)
//! - `MAPBENCH_LOG_DIR`: log directory (default: `logs/`)
//! - `MAPBENCH_LOG_CONSOLE`: set to "0" to disable console output
//!
//! ```bash
//! # Per-run results from a sweep
//! jq 'select(.fields.message == "scenario finished")' logs/mapbench.jsonl
//! ```

use std::env;
use std::io;
use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Where and how logs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory for log files.
    pub log_dir: PathBuf,
    /// Log file name.
    pub log_file: String,
    /// Enable console output.
    pub console_enabled: bool,
    /// Level used when `RUST_LOG` is unset or invalid.
    pub default_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file: "mapbench.jsonl".to_string(),
            console_enabled: true,
            default_level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// Defaults overridden by `MAPBENCH_LOG_DIR` and `MAPBENCH_LOG_CONSOLE`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("MAPBENCH_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if env::var("MAPBENCH_LOG_CONSOLE").is_ok_and(|v| v == "0") {
            config.console_enabled = false;
        }

        config
    }

    /// Full path of the JSON log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.log_file)
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string()))
    }
}

/// Install a console subscriber filtered by `RUST_LOG`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let config = LogConfig::from_env();
    let console = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_thread_names(true)
        .with_target(true)
        .compact()
        .with_filter(config.filter());

    let _ = Registry::default().with(console).try_init();
}

/// Install console output plus a JSON file layer.
///
/// # Errors
///
/// Fails if the log directory cannot be created.
pub fn init_json_tracing(config: &LogConfig) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)?;

    let appender = tracing_appender::rolling::never(&config.log_dir, &config.log_file);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let console = config.console_enabled.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_thread_names(true)
            .with_target(true)
            .compact()
            .with_filter(config.filter())
    });

    let file = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .json()
        .with_filter(config.filter());

    let _ = Registry::default().with(console).with(file).try_init();
    Ok(guard)
}
