//! # `mapbench`
//!
//! A harness for measuring how concurrent key-value stores behave under
//! parallel load.
//!
//! A run generates a fixed population of 16-byte keys, optionally loads it into
//! a store, then releases W workers at once through a start gate. Each worker
//! performs I gets or puts against keys chosen by a bitmask over the
//! population, and the harness reports wall-clock time per operation.
//!
//! | Component | Module |
//! |-----------|--------|
//! | Key encoding and hash codecs | [`key`] |
//! | Key population and WRAPPER mask | [`population`] |
//! | Store adapter trait and candidates | [`store`] |
//! | Scenario configuration and driver | [`workload`] |
//! | Per-operation timing | [`report`] |
//! | Profiling hooks | [`profile`] |
//!
//! ## Example
//!
//! ```rust
//! use mapbench::{Codec, KeyPopulation, Scenario, StoreKind};
//!
//! let population = KeyPopulation::with_bits(12)?;
//! let store = StoreKind::Papaya.populated(Codec::Fold, &population)?;
//!
//! let report = mapbench::run(&*store, &population, &Scenario::fixed_read(4, 10_000))?;
//! assert_eq!(report.total_ops, 40_000);
//! println!("{report}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Stores
//!
//! Every candidate implements [`Store`]. Only [`FrozenStore`] is unsafe to
//! write concurrently, so it refuses writes entirely and serves as the
//! read-only baseline.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod key;
pub mod logging;
pub mod population;
pub mod profile;
pub mod report;
pub mod store;
pub mod workload;

// Re-export main types for convenience
pub use error::{BenchError, ConfigError, Result, StoreError};
pub use key::{Codec, KEY_SIZE, Key};
pub use logging::{LogConfig, init_json_tracing, init_tracing};
pub use population::{HashTable, KeyPopulation, Wrapper};
pub use profile::{NoopProfiler, Profiler, SpanProfiler};
pub use report::{Report, Summary, WorkerResult};
pub use store::{
    DashStore, FrozenStore, LockedStore, PapayaStore, SccStore, Store, StoreKind, StripedStore,
    Value, prepopulate,
};
pub use workload::{
    AccessPattern, Driver, KeySource, Locking, Partition, ReadPath, Scenario, ScenarioLock, run,
};
