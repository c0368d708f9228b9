//! Error types for benchmark setup and execution.
//!
//! Nothing here is recoverable. A benchmark whose configuration is
//! inconsistent, whose store rejects an operation, or whose fixed population
//! turns out to be incomplete has produced no valid measurement, so every
//! variant ends the run.

use thiserror::Error;

/// A scenario or population that cannot produce a valid measurement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The key population has no keys.
    #[error("key population is empty")]
    EmptyPopulation,

    /// The population size cannot be covered by a bitmask.
    #[error("population size {len} is not a power of two")]
    NotPowerOfTwo {
        /// Population size.
        len: usize,
    },

    /// A population of `2^bits` keys does not fit the 32-bit key space.
    #[error("population of 2^{bits} keys exceeds the 32-bit key space")]
    PopulationTooLarge {
        /// Requested exponent.
        bits: u32,
    },

    /// An explicit wrapper mask does not match the population size.
    #[error("wrapper mask {mask:#x} does not match population size {len} (expected {:#x})", .len.wrapping_sub(1))]
    WrapperMismatch {
        /// Supplied mask.
        mask: usize,
        /// Population size.
        len: usize,
    },

    /// A scenario with zero workers.
    #[error("scenario needs at least one worker")]
    NoWorkers,

    /// A scenario with zero iterations per worker.
    #[error("scenario needs at least one iteration per worker")]
    NoIterations,

    /// A fixed-read scenario against a store that was not prepopulated.
    #[error("store `{store}` holds {len} keys, fixed read needs {expected}")]
    NotPrepopulated {
        /// Store name.
        store: &'static str,
        /// Keys currently in the store.
        len: usize,
        /// Population size.
        expected: usize,
    },

    /// The hashed read path was requested for a scenario that never reads.
    #[error("hashed read path applies only to fixed-read scenarios")]
    HashedFill,
}

/// An operation a store refused to perform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store does not accept writes.
    #[error("store `{store}` is read-only")]
    ReadOnly {
        /// Store name.
        store: &'static str,
    },
}

/// A fatal benchmark failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    /// The scenario failed validation before any worker started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Populating the store before the timed region failed.
    #[error("setup failed: {0}")]
    Setup(#[source] StoreError),

    /// A fixed-read lookup missed a key that the population guarantees.
    #[error("worker {worker} could not get {key:?} (index {index}) at iteration {iteration}")]
    MissingKey {
        /// Worker index.
        worker: usize,
        /// Iteration within the worker.
        iteration: usize,
        /// Population index.
        index: usize,
        /// The key that was missing.
        key: crate::Key,
    },

    /// A computed index fell outside the key population.
    #[error("worker {worker} computed index {index} outside population of {len} at iteration {iteration}")]
    IndexOutOfRange {
        /// Worker index.
        worker: usize,
        /// Iteration within the worker.
        iteration: usize,
        /// Computed index.
        index: usize,
        /// Population size.
        len: usize,
    },

    /// The store returned an error during the timed region.
    #[error("worker {worker} failed at iteration {iteration}: {source}")]
    Store {
        /// Worker index.
        worker: usize,
        /// Iteration within the worker.
        iteration: usize,
        /// Error reported by the store.
        #[source]
        source: StoreError,
    },

    /// A worker thread panicked.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Worker index.
        worker: usize,
    },

    /// The OS refused to start a worker thread. Workers already started are
    /// released without running and joined before this is returned.
    #[error("could not spawn worker {worker}: {reason}")]
    Spawn {
        /// Index of the worker that failed to start.
        worker: usize,
        /// The spawn error's message.
        reason: String,
    },
}

/// Result alias for benchmark runs.
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_mismatch_message() {
        let err = ConfigError::WrapperMismatch {
            mask: 0x1F_FFFF,
            len: 1 << 20,
        };
        assert_eq!(
            err.to_string(),
            "wrapper mask 0x1fffff does not match population size 1048576 (expected 0xfffff)"
        );
    }

    #[test]
    fn test_config_converts_into_bench_error() {
        let err: BenchError = ConfigError::NoWorkers.into();
        assert_eq!(err, BenchError::Config(ConfigError::NoWorkers));
        assert!(err.to_string().contains("at least one worker"));
    }

    #[test]
    fn test_store_error_is_source() {
        use std::error::Error as _;

        let err = BenchError::Store {
            worker: 3,
            iteration: 10,
            source: StoreError::ReadOnly { store: "frozen" },
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("store `frozen` is read-only"));
    }

    #[test]
    fn test_spawn_message() {
        let err = BenchError::Spawn {
            worker: 5,
            reason: "Resource temporarily unavailable".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "could not spawn worker 5: Resource temporarily unavailable"
        );
    }
}
