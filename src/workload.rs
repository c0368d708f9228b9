//! Filepath: src/workload.rs
//!
//! Concurrent workload driver.
//!
//! One [`Scenario`] is one measurement: a fixed number of workers, each
//! running a fixed number of iterations against one store. The driver
//!
//! 1. validates the scenario against the population and the store,
//! 2. finishes all setup (hash table, scenario lock, worker threads),
//! 3. waits until every worker is parked on the start gate, starts the
//!    clock and opens the gate,
//! 4. joins every worker and stops the clock.
//!
//! Nothing in step 1 or 2 is timed. The driver holds the start gate's write
//! lock while it spawns, so if a spawn fails it can still open the gate and
//! the workers that did start return without doing any work.
//!
//! ## Partitioning
//!
//! Worker `w` at iteration `i` touches population index
//! `(i + offset(w)) & WRAPPER`, where `WRAPPER = N - 1` for a power-of-two
//! population of `N` keys:
//!
//! | Partition | `offset(w)` |
//! |-----------|-------------|
//! | [`Partition::Shifted`] | `w` |
//! | [`Partition::Shared`] | `0` |
//! | [`Partition::Disjoint`] | `w * iterations` |
//!
//! The index is bounds-checked against the population before every access,
//! so a bad mask fails the run instead of reading out of range.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::Instant;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{BenchError, ConfigError, Result};
use crate::key::{KEY_SIZE, Key};
use crate::population::{HashTable, KeyPopulation, Wrapper};
use crate::profile::{NoopProfiler, Profiler};
use crate::report::{Report, WorkerResult};
use crate::store::{Store, Value};

// ============================================================================
//  Scenario
// ============================================================================

/// What every worker does on each iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum AccessPattern {
    /// Put `keys[index] -> index`.
    Fill,
    /// Get `keys[index]` from a prepopulated store; a miss is fatal.
    FixedRead,
}

/// How iterations map onto population indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Partition {
    /// `(i + w) & WRAPPER`: workers walk the same keys, staggered by one.
    Shifted,
    /// `i & WRAPPER`: every worker walks the same keys in lockstep.
    Shared,
    /// `(w * iterations + i) & WRAPPER`: consecutive, non-overlapping ranges
    /// while `workers * iterations <= N`.
    Disjoint,
}

impl Partition {
    /// Index offset for `worker`.
    #[inline]
    #[must_use]
    pub const fn offset(self, worker: usize, iterations: usize) -> usize {
        match self {
            Self::Shifted => worker,
            Self::Shared => 0,
            Self::Disjoint => worker.wrapping_mul(iterations),
        }
    }
}

/// Whether the harness wraps store calls in its own lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Locking {
    /// Rely on the store's own concurrency control.
    #[default]
    Internal,
    /// Reads take a shared [`ScenarioLock`] guard, writes an exclusive one.
    External,
}

/// Which read entry point fixed-read scenarios call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ReadPath {
    /// [`Store::get`].
    #[default]
    Simple,
    /// [`Store::get_hashed`] with codes precomputed before timing.
    Hashed,
}

/// Where workers take their keys from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum KeySource {
    /// Index the shared population.
    #[default]
    Population,
    /// Encode the index into a worker-local buffer on every iteration.
    Scratch,
}

/// One benchmark configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    /// Label used in reports and logs.
    pub label: String,
    /// Operation performed on each iteration.
    pub pattern: AccessPattern,
    /// Index partitioning across workers.
    pub partition: Partition,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Iterations per worker.
    pub iterations: usize,
    /// Harness-imposed locking.
    pub locking: Locking,
    /// Read entry point.
    pub read_path: ReadPath,
    /// Key source.
    pub key_source: KeySource,
    /// Explicit WRAPPER mask. Derived from the population when `None`.
    pub wrapper: Option<usize>,
}

impl Scenario {
    /// Read a prepopulated store with staggered workers.
    #[must_use]
    pub fn fixed_read(workers: usize, iterations: usize) -> Self {
        Self::new(
            "fixed-read",
            AccessPattern::FixedRead,
            Partition::Shifted,
            workers,
            iterations,
        )
    }

    /// Write into a store, each worker over its own range.
    #[must_use]
    pub fn fill(workers: usize, iterations: usize) -> Self {
        Self::new(
            "fill",
            AccessPattern::Fill,
            Partition::Disjoint,
            workers,
            iterations,
        )
    }

    fn new(
        label: &str,
        pattern: AccessPattern,
        partition: Partition,
        workers: usize,
        iterations: usize,
    ) -> Self {
        Self {
            label: label.to_owned(),
            pattern,
            partition,
            workers,
            iterations,
            locking: Locking::Internal,
            read_path: ReadPath::Simple,
            key_source: KeySource::Population,
            wrapper: None,
        }
    }

    /// Replace the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace the partition.
    #[must_use]
    pub const fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    /// Replace the locking discipline.
    #[must_use]
    pub const fn with_locking(mut self, locking: Locking) -> Self {
        self.locking = locking;
        self
    }

    /// Replace the read path.
    #[must_use]
    pub const fn with_read_path(mut self, read_path: ReadPath) -> Self {
        self.read_path = read_path;
        self
    }

    /// Replace the key source.
    #[must_use]
    pub const fn with_key_source(mut self, key_source: KeySource) -> Self {
        self.key_source = key_source;
        self
    }

    /// Use an explicit WRAPPER mask. It is still validated before the run.
    #[must_use]
    pub const fn with_wrapper(mut self, mask: usize) -> Self {
        self.wrapper = Some(mask);
        self
    }

    /// Check the scenario against `population` and `store`.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] describing the first inconsistency found.
    pub fn validate<S: Store + ?Sized>(
        &self,
        population: &KeyPopulation,
        store: &S,
    ) -> std::result::Result<Wrapper, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.pattern == AccessPattern::Fill && self.read_path == ReadPath::Hashed {
            return Err(ConfigError::HashedFill);
        }

        let wrapper = match self.wrapper {
            Some(mask) => Wrapper::checked(mask, population.len())?,
            None => population.wrapper()?,
        };

        if self.pattern == AccessPattern::FixedRead && store.len() < population.len() {
            return Err(ConfigError::NotPrepopulated {
                store: store.name(),
                len: store.len(),
                expected: population.len(),
            });
        }

        Ok(wrapper)
    }
}

// ============================================================================
//  ScenarioLock
// ============================================================================

/// Reader-writer lock the driver places around store calls for
/// [`Locking::External`] scenarios.
///
/// Created by the driver for one run and dropped when it ends.
#[derive(Debug, Default)]
pub struct ScenarioLock {
    lock: RwLock<()>,
}

impl ScenarioLock {
    /// Create an unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared guard for reads.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Exclusive guard for writes.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

// ============================================================================
//  Driver
// ============================================================================

/// Runs scenarios over one key population.
#[derive(Debug)]
pub struct Driver<P = NoopProfiler> {
    population: KeyPopulation,
    profiler: P,
}

impl Driver<NoopProfiler> {
    /// A driver without profiling.
    #[must_use]
    pub const fn new(population: KeyPopulation) -> Self {
        Self {
            population,
            profiler: NoopProfiler,
        }
    }
}

impl<P: Profiler> Driver<P> {
    /// A driver that brackets every timed region with `profiler`.
    #[must_use]
    pub const fn with_profiler(population: KeyPopulation, profiler: P) -> Self {
        Self {
            population,
            profiler,
        }
    }

    /// The shared key population.
    #[must_use]
    pub const fn population(&self) -> &KeyPopulation {
        &self.population
    }

    /// The profiler.
    #[must_use]
    pub const fn profiler(&self) -> &P {
        &self.profiler
    }

    /// Consume the driver and return the profiler.
    #[must_use]
    pub fn into_profiler(self) -> P {
        self.profiler
    }

    /// Run `scenario` against `store`.
    ///
    /// # Errors
    ///
    /// - [`BenchError::Config`] if validation fails; no worker is started.
    /// - [`BenchError::MissingKey`], [`BenchError::IndexOutOfRange`] or
    ///   [`BenchError::Store`] from the lowest-numbered failing worker.
    /// - [`BenchError::WorkerPanicked`] if a worker thread panicked.
    /// - [`BenchError::Spawn`] if a worker thread could not be started.
    pub fn run<S: Store + ?Sized>(&mut self, store: &S, scenario: &Scenario) -> Result<Report> {
        let wrapper = scenario.validate(&self.population, store)?;

        let hashes = (scenario.pattern == AccessPattern::FixedRead
            && scenario.read_path == ReadPath::Hashed)
            .then(|| self.population.hash_table_with(|key| store.hash_code(key)));
        let lock = (scenario.locking == Locking::External).then(ScenarioLock::new);

        let ctx = WorkerContext {
            store,
            population: &self.population,
            scenario,
            wrapper,
            hashes: hashes.as_ref(),
            lock: lock.as_ref(),
            start: RwLock::new(()),
            ready: AtomicUsize::new(0),
            abort: AtomicBool::new(false),
        };

        tracing::info!(
            label = %scenario.label,
            store = store.name(),
            pattern = ?scenario.pattern,
            partition = ?scenario.partition,
            workers = scenario.workers,
            iterations = scenario.iterations,
            locking = ?scenario.locking,
            read_path = ?scenario.read_path,
            key_source = ?scenario.key_source,
            keys = self.population.len(),
            "starting scenario"
        );

        let log_failure = |e: &BenchError| {
            tracing::error!(
                label = %scenario.label,
                store = store.name(),
                error = %e,
                "scenario failed"
            );
        };

        let profiler = &mut self.profiler;
        let (outcomes, elapsed) = thread::scope(|scope| {
            let gate = ctx.start.write();
            let mut handles = Vec::with_capacity(scenario.workers);

            for worker in 0..scenario.workers {
                let ctx = &ctx;
                let spawned = spawn_worker(scope, worker, move || {
                    let outcome = ctx.run_worker(worker);
                    if outcome.is_err() {
                        ctx.abort.store(true, Ordering::Relaxed);
                    }
                    outcome
                });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        ctx.abort.store(true, Ordering::Relaxed);
                        drop(gate);
                        for handle in handles {
                            let _ = handle.join();
                        }
                        return Err(BenchError::Spawn {
                            worker,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            while ctx.ready.load(Ordering::Acquire) < scenario.workers {
                thread::yield_now();
            }

            profiler.start(&scenario.label);
            let start = Instant::now();
            drop(gate);

            let outcomes: Vec<Result<WorkerResult>> = handles
                .into_iter()
                .enumerate()
                .map(|(worker, handle)| {
                    handle
                        .join()
                        .unwrap_or(Err(BenchError::WorkerPanicked { worker }))
                })
                .collect();

            let elapsed = start.elapsed();
            profiler.stop(&scenario.label, elapsed);
            Ok((outcomes, elapsed))
        })
        .inspect_err(log_failure)?;

        let results = outcomes
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .inspect_err(log_failure)?;

        let report = Report::aggregate(
            scenario.label.clone(),
            store.name(),
            scenario.iterations,
            &results,
            elapsed,
        );
        // Workers only stop early after an error, so a clean run is complete.
        debug_assert_eq!(
            report.total_ops,
            report.expected_ops(),
            "clean run skipped iterations"
        );
        tracing::info!(
            label = %report.label,
            store = report.store,
            elapsed = ?report.elapsed,
            ns_per_op = report.ns_per_op(),
            "scenario finished"
        );
        Ok(report)
    }
}

/// Run one scenario with a fresh driver and no profiling.
///
/// # Errors
///
/// See [`Driver::run`].
pub fn run<S: Store + ?Sized>(
    store: &S,
    population: &KeyPopulation,
    scenario: &Scenario,
) -> Result<Report> {
    Driver::new(population.clone()).run(store, scenario)
}

// ============================================================================
//  Worker
// ============================================================================

/// Start one named worker thread inside `scope`.
fn spawn_worker<'scope, T, F>(
    scope: &'scope Scope<'scope, '_>,
    worker: usize,
    f: F,
) -> io::Result<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    #[cfg(test)]
    {
        if spawn_fault::hit(worker) {
            return Err(io::Error::other("injected spawn failure"));
        }
    }

    thread::Builder::new()
        .name(format!("worker-{worker}"))
        .spawn_scoped(scope, f)
}

/// Everything a worker reads. Shared by reference across all workers.
struct WorkerContext<'a, S: ?Sized> {
    store: &'a S,
    population: &'a KeyPopulation,
    scenario: &'a Scenario,
    wrapper: Wrapper,
    hashes: Option<&'a HashTable>,
    lock: Option<&'a ScenarioLock>,
    /// Write-locked by the driver until the clock starts.
    start: RwLock<()>,
    /// Workers parked on `start`.
    ready: AtomicUsize,
    abort: AtomicBool,
}

impl<S: Store + ?Sized> WorkerContext<'_, S> {
    fn run_worker(&self, worker: usize) -> Result<WorkerResult> {
        let iterations = self.scenario.iterations;
        let offset = self.scenario.partition.offset(worker, iterations);
        let mut scratch = [0u8; KEY_SIZE];
        let mut result = WorkerResult {
            worker,
            ..WorkerResult::default()
        };

        self.ready.fetch_add(1, Ordering::Release);
        drop(self.start.read());

        for iteration in 0..iterations {
            if self.abort.load(Ordering::Relaxed) {
                break;
            }

            let index = self.wrapper.index(iteration, offset);
            let key = self.key_at(worker, iteration, index, &mut scratch)?;

            match self.scenario.pattern {
                AccessPattern::FixedRead => {
                    if self.read(worker, iteration, index, &key)?.is_none() {
                        return Err(BenchError::MissingKey {
                            worker,
                            iteration,
                            index,
                            key,
                        });
                    }
                    result.hits += 1;
                }
                AccessPattern::Fill => {
                    let _exclusive = self.lock.map(ScenarioLock::write);
                    self.store
                        .put(key, index as Value)
                        .map_err(|source| BenchError::Store {
                            worker,
                            iteration,
                            source,
                        })?;
                }
            }
            result.operations += 1;
        }

        Ok(result)
    }

    #[inline]
    fn key_at(
        &self,
        worker: usize,
        iteration: usize,
        index: usize,
        scratch: &mut [u8; KEY_SIZE],
    ) -> Result<Key> {
        let out_of_range = || BenchError::IndexOutOfRange {
            worker,
            iteration,
            index,
            len: self.population.len(),
        };

        match self.scenario.key_source {
            KeySource::Population => self
                .population
                .get(index)
                .copied()
                .ok_or_else(out_of_range),
            KeySource::Scratch if index < self.population.len() => {
                Ok(Key::encode_into(index as u64, scratch))
            }
            KeySource::Scratch => Err(out_of_range()),
        }
    }

    #[inline]
    fn read(
        &self,
        worker: usize,
        iteration: usize,
        index: usize,
        key: &Key,
    ) -> Result<Option<Value>> {
        let _shared = self.lock.map(ScenarioLock::read);
        match self.hashes {
            Some(table) => {
                let hash = table.get(index).ok_or(BenchError::IndexOutOfRange {
                    worker,
                    iteration,
                    index,
                    len: table.len(),
                })?;
                Ok(self.store.get_hashed(key, hash))
            }
            None => Ok(self.store.get(key)),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::StoreError;
    use crate::key::Codec;
    use crate::profile::SpanProfiler;
    use crate::store::{
        FrozenStore, LockedStore, PapayaStore, StoreKind, StripedStore, prepopulate,
    };

    fn population(bits: u32) -> KeyPopulation {
        KeyPopulation::with_bits(bits).unwrap()
    }

    /// A worker context with an open start gate and a caller-chosen wrapper,
    /// bypassing the driver's validation.
    fn context<'a, S: Store + ?Sized>(
        store: &'a S,
        population: &'a KeyPopulation,
        scenario: &'a Scenario,
        wrapper: Wrapper,
        hashes: Option<&'a HashTable>,
    ) -> WorkerContext<'a, S> {
        WorkerContext {
            store,
            population,
            scenario,
            wrapper,
            hashes,
            lock: None,
            start: RwLock::new(()),
            ready: AtomicUsize::new(0),
            abort: AtomicBool::new(false),
        }
    }

    #[test]
    fn test_partition_offsets() {
        assert_eq!(Partition::Shifted.offset(3, 100), 3);
        assert_eq!(Partition::Shared.offset(3, 100), 0);
        assert_eq!(Partition::Disjoint.offset(3, 100), 300);
    }

    #[test]
    fn test_validate_rejects_zero_workers_and_iterations() {
        let keys = population(4);
        let store = LockedStore::new(Codec::Fold);
        assert_eq!(
            Scenario::fill(0, 1).validate(&keys, &store),
            Err(ConfigError::NoWorkers)
        );
        assert_eq!(
            Scenario::fill(1, 0).validate(&keys, &store),
            Err(ConfigError::NoIterations)
        );
    }

    #[test]
    fn test_validate_rejects_unpopulated_fixed_read() {
        let keys = population(4);
        let store = LockedStore::new(Codec::Fold);
        assert_eq!(
            Scenario::fixed_read(1, 1).validate(&keys, &store),
            Err(ConfigError::NotPrepopulated {
                store: "locked",
                len: 0,
                expected: 16
            })
        );
    }

    #[test]
    fn test_explicit_wrapper_must_match_population() {
        let keys = population(8);
        let store = FrozenStore::from_population(Codec::Fold, &keys);
        let scenario = Scenario::fixed_read(2, 10).with_wrapper(511);

        let err = run(&store, &keys, &scenario).unwrap_err();
        assert_eq!(
            err,
            BenchError::Config(ConfigError::WrapperMismatch { mask: 511, len: 256 })
        );

        let ok = Scenario::fixed_read(2, 10).with_wrapper(255);
        assert!(run(&store, &keys, &ok).is_ok());
    }

    #[test]
    fn test_fixed_read_counts_hits() {
        let keys = population(10);
        let store = PapayaStore::new(Codec::Fold);
        prepopulate(&store, &keys).unwrap();

        let report = run(&store, &keys, &Scenario::fixed_read(3, 5_000)).unwrap();
        assert_eq!(report.workers, 3);
        assert_eq!(report.total_ops, 15_000);
        assert_eq!(report.hits, 15_000);
        assert_eq!(report.total_ops, report.expected_ops());
    }

    #[test]
    fn test_fixed_read_miss_is_fatal() {
        let keys = population(6);
        let store = LockedStore::new(Codec::Fold);
        prepopulate(&store, &keys).unwrap();
        store.delete(&Key::encode(17)).unwrap();
        // Keep the length check satisfied so the miss happens in the loop.
        store.put(Key::encode(1_000), 0).unwrap();

        let err = run(&store, &keys, &Scenario::fixed_read(1, 64)).unwrap_err();
        assert_eq!(
            err,
            BenchError::MissingKey {
                worker: 0,
                iteration: 17,
                index: 17,
                key: Key::encode(17)
            }
        );
    }

    #[test]
    fn test_fill_into_read_only_store_is_fatal() {
        let keys = population(4);
        let store = FrozenStore::empty(Codec::Fold);

        let err = run(&store, &keys, &Scenario::fill(2, 4)).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Store {
                source: StoreError::ReadOnly { store: "frozen" },
                ..
            }
        ));
    }

    #[test]
    fn test_fill_disjoint_writes_every_key_once() {
        let keys = population(12);
        let store = StripedStore::new(Codec::Crc32);

        let report = run(&store, &keys, &Scenario::fill(4, 1024)).unwrap();
        assert_eq!(report.total_ops, 4096);
        assert_eq!(report.hits, 0);
        assert_eq!(store.len(), 4096);
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(store.get(key), Some(i as Value));
        }
    }

    #[test]
    fn test_external_locking_and_hashed_path() {
        let keys = population(10);
        for kind in StoreKind::ALL {
            let store = kind.populated(Codec::Crc32, &keys).unwrap();
            let scenario = Scenario::fixed_read(4, 2_000)
                .with_locking(Locking::External)
                .with_read_path(ReadPath::Hashed)
                .with_label(format!("locked-hashed-{kind}"));

            let report = run(&*store, &keys, &scenario).unwrap();
            assert_eq!(report.hits, 8_000, "{kind}");
        }
    }

    #[test]
    fn test_scratch_key_source_matches_population() {
        let keys = population(9);
        let store = LockedStore::new(Codec::Fold);
        let scenario = Scenario::fill(1, 512).with_key_source(KeySource::Scratch);

        run(&store, &keys, &scenario).unwrap();
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(store.get(key), Some(i as Value));
        }
    }

    #[test]
    fn test_driver_reports_to_profiler() {
        let keys = population(6);
        let store = FrozenStore::from_population(Codec::Fold, &keys);
        let mut driver = Driver::with_profiler(keys, SpanProfiler::new());

        driver.run(&store, &Scenario::fixed_read(2, 100).with_label("one")).unwrap();
        driver.run(&store, &Scenario::fixed_read(2, 100).with_label("two")).unwrap();

        let labels: Vec<_> = driver.profiler().regions().iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(labels, ["one", "two"]);
    }

    #[test]
    fn test_validate_rejects_hashed_fill() {
        let keys = population(4);
        let store = LockedStore::new(Codec::Fold);
        let scenario = Scenario::fill(1, 16).with_read_path(ReadPath::Hashed);

        assert_eq!(
            scenario.validate(&keys, &store),
            Err(ConfigError::HashedFill)
        );
        let err = run(&store, &keys, &scenario).unwrap_err();
        assert_eq!(err, BenchError::Config(ConfigError::HashedFill));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_clean_runs_complete_every_iteration() {
        let keys = population(10);
        let frozen = FrozenStore::from_population(Codec::Fold, &keys);

        for partition in [Partition::Shifted, Partition::Shared, Partition::Disjoint] {
            for key_source in [KeySource::Population, KeySource::Scratch] {
                let read = Scenario::fixed_read(3, 700)
                    .with_partition(partition)
                    .with_key_source(key_source);
                let report = run(&frozen, &keys, &read).unwrap();
                assert_eq!(report.total_ops, 2_100, "{partition:?} {key_source:?}");
                assert_eq!(report.total_ops, report.expected_ops());

                let store = LockedStore::new(Codec::Fold);
                let fill = Scenario::fill(4, 256)
                    .with_partition(partition)
                    .with_key_source(key_source);
                let report = run(&store, &keys, &fill).unwrap();
                assert_eq!(report.total_ops, 1_024, "{partition:?} {key_source:?}");
                assert_eq!(report.total_ops, report.expected_ops());
            }
        }
    }

    #[test]
    fn test_spawn_failure_releases_started_workers() {
        let keys = population(8);
        let store = FrozenStore::from_population(Codec::Fold, &keys);
        let mut driver = Driver::with_profiler(keys, SpanProfiler::new());

        spawn_fault::set(5);
        let started = Instant::now();
        let err = driver
            .run(&store, &Scenario::fixed_read(8, 1_000_000))
            .unwrap_err();

        assert_eq!(
            err,
            BenchError::Spawn {
                worker: 5,
                reason: "injected spawn failure".to_owned()
            }
        );
        assert!(started.elapsed() < Duration::from_secs(10));
        // The timed region never opened.
        assert!(driver.profiler().regions().is_empty());

        // The fault fires once.
        let report = driver.run(&store, &Scenario::fixed_read(8, 100)).unwrap();
        assert_eq!(report.hits, 800);
    }

    #[test]
    fn test_oversized_wrapper_reports_index_out_of_range() {
        let keys = population(4);
        let store = FrozenStore::from_population(Codec::Fold, &keys);
        let wrapper = Wrapper::for_len(32).unwrap();

        for key_source in [KeySource::Population, KeySource::Scratch] {
            let scenario = Scenario::fixed_read(1, 32).with_key_source(key_source);
            let ctx = context(&store, &keys, &scenario, wrapper, None);
            assert_eq!(
                ctx.run_worker(0),
                Err(BenchError::IndexOutOfRange {
                    worker: 0,
                    iteration: 16,
                    index: 16,
                    len: 16
                }),
                "{key_source:?}"
            );
        }
    }

    #[test]
    fn test_short_hash_table_reports_index_out_of_range() {
        let keys = population(5);
        let store = FrozenStore::from_population(Codec::Fold, &keys);
        let table = population(4).hash_table(Codec::Fold);
        let scenario = Scenario::fixed_read(1, 32).with_read_path(ReadPath::Hashed);

        let ctx = context(&store, &keys, &scenario, keys.wrapper().unwrap(), Some(&table));
        assert_eq!(
            ctx.run_worker(0),
            Err(BenchError::IndexOutOfRange {
                worker: 0,
                iteration: 16,
                index: 16,
                len: 16
            })
        );
    }
}
