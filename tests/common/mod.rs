//! Shared test setup: tracing and store fixtures.
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn my_test() {
//!     common::init_tracing();
//!     let (population, store) = common::populated(StoreKind::Papaya, 12);
//! }
//! ```
//!
//! # Configuration
//!
//! Same environment as the binaries (see [`mapbench::LogConfig`]):
//! - `RUST_LOG`: Filter directives (e.g., `mapbench=debug,mapbench::workload=trace`)
//! - `MAPBENCH_LOG_DIR`: Log directory (default: `logs/`)
//! - `MAPBENCH_LOG_CONSOLE`: Set to "0" to disable console output
//!
//! # Log Files
//!
//! Logs are appended to `logs/mapbench.jsonl` as NDJSON:
//!
//! ```bash
//! # Results of one store
//! cat logs/mapbench.jsonl | jq 'select(.fields.store == "papaya")'
//!
//! # Show only errors
//! cat logs/mapbench.jsonl | jq 'select(.level == "ERROR")'
//! ```

#![allow(dead_code)]

use std::fs::OpenOptions;
use std::sync::Once;

use mapbench::{Codec, KeyPopulation, LogConfig, Store, StoreKind};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Ensures tracing is only initialized once per test binary.
static INIT: Once = Once::new();

/// Initialize console and file logging.
///
/// Safe to call multiple times - only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(setup_tracing);
}

fn make_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()))
}

#[expect(clippy::expect_used)]
fn setup_tracing() {
    let config = LogConfig::from_env();

    std::fs::create_dir_all(&config.log_dir).expect("Failed to create log directory");

    // Append: nextest runs each test in its own process.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .expect("Failed to open log file");

    let console_layer = config.console_enabled.then(|| {
        tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_thread_names(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .compact()
            .with_filter(make_filter(&config))
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::sync::Mutex::new(file))
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .with_filter(make_filter(&config));

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

/// A `2^bits` population and a `kind` store holding all of it.
pub fn populated(kind: StoreKind, bits: u32) -> (KeyPopulation, Box<dyn Store>) {
    populated_with(kind, Codec::Fold, bits)
}

/// [`populated`] with an explicit codec.
#[expect(clippy::expect_used)]
pub fn populated_with(kind: StoreKind, codec: Codec, bits: u32) -> (KeyPopulation, Box<dyn Store>) {
    let population = KeyPopulation::with_bits(bits).expect("population fits in u32");
    let store = kind
        .populated(codec, &population)
        .expect("prepopulation succeeds");
    (population, store)
}

/// Writable store kinds.
pub fn writable() -> impl Iterator<Item = StoreKind> {
    StoreKind::ALL.into_iter().filter(|kind| kind.is_writable())
}
