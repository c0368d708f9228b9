//! Single-scenario benchmark driver.
//!
//! Generates the key population, builds the selected store, runs one scenario
//! and prints the time per operation.
//!
//! Run with:
//! ```bash
//! # 2 workers reading a prepopulated papaya map
//! cargo run --release -- --nprocs 2
//!
//! # 8 workers filling a striped map through the harness lock
//! cargo run --release --features mimalloc -- --ngo 8 --map striped --scenario fill --locking external
//!
//! # With scenario logs
//! RUST_LOG=mapbench=debug cargo run --release -- --map scc --profile
//! ```

use std::process::ExitCode;

use clap::Parser;
use mapbench::{
    AccessPattern, BenchError, Codec, Driver, KeyPopulation, KeySource, Locking, NoopProfiler,
    Partition, Profiler, ReadPath, Report, Scenario, SpanProfiler, StoreKind,
};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "mapbench")]
#[command(about = "Measure per-operation latency of concurrent key-value stores")]
struct Args {
    /// Worker threads, also the size of the setup thread pool
    #[arg(long, default_value_t = 2)]
    nprocs: usize,

    /// Client workers (0 = same as --nprocs)
    #[arg(long, default_value_t = 0)]
    ngo: usize,

    /// Store under test
    #[arg(long, value_enum, default_value_t = StoreKind::Papaya)]
    map: StoreKind,

    /// Operation each worker performs
    #[arg(long, value_enum, default_value_t = AccessPattern::FixedRead)]
    scenario: AccessPattern,

    /// Index partitioning (default: shifted for reads, disjoint for fills)
    #[arg(long, value_enum)]
    partition: Option<Partition>,

    /// Whether the harness wraps store calls in its own lock
    #[arg(long, value_enum, default_value_t = Locking::Internal)]
    locking: Locking,

    /// Read entry point for fixed-read scenarios
    #[arg(long, value_enum, default_value_t = ReadPath::Simple)]
    read_path: ReadPath,

    /// Where workers take their keys from
    #[arg(long, value_enum, default_value_t = KeySource::Population)]
    key_source: KeySource,

    /// Hash codec used by the store
    #[arg(long, value_enum, default_value_t = Codec::Fold)]
    codec: Codec,

    /// Population size as a power of two
    #[arg(long, default_value_t = 20)]
    keys_log2: u32,

    /// Iterations per worker
    #[arg(long, default_value_t = 2_000_000)]
    iterations: usize,

    /// Explicit WRAPPER mask, checked against the population size
    #[arg(long, value_parser = parse_mask)]
    wrapper: Option<usize>,

    /// Record the timed region as a tracing span
    #[arg(long)]
    profile: bool,
}

impl Args {
    const fn workers(&self) -> usize {
        if self.ngo == 0 { self.nprocs } else { self.ngo }
    }

    fn scenario(&self) -> Scenario {
        let workers = self.workers();
        let mut scenario = match self.scenario {
            AccessPattern::FixedRead => Scenario::fixed_read(workers, self.iterations),
            AccessPattern::Fill => Scenario::fill(workers, self.iterations),
        };

        if let Some(partition) = self.partition {
            scenario = scenario.with_partition(partition);
        }
        if let Some(mask) = self.wrapper {
            scenario = scenario.with_wrapper(mask);
        }

        scenario
            .with_locking(self.locking)
            .with_read_path(self.read_path)
            .with_key_source(self.key_source)
            .with_label(format!("{}/{}", self.map, workers))
    }
}

/// Accept a mask in decimal or `0x`-prefixed hex.
fn parse_mask(s: &str) -> Result<usize, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid mask `{s}`: {e}"))
}

fn run<P: Profiler>(args: &Args, mut driver: Driver<P>) -> Result<Report, BenchError> {
    let scenario = args.scenario();
    let store = match scenario.pattern {
        AccessPattern::FixedRead => args
            .map
            .populated(args.codec, driver.population())
            .map_err(BenchError::Setup)?,
        AccessPattern::Fill => args.map.empty(args.codec),
    };

    driver.run(&*store, &scenario)
}

fn main() -> ExitCode {
    mapbench::init_tracing();
    let args = Args::parse();

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.nprocs.max(1))
        .build_global()
    {
        tracing::warn!(error = %e, "could not size the setup thread pool");
    }

    let population = match KeyPopulation::with_bits(args.keys_log2) {
        Ok(population) => population,
        Err(e) => {
            tracing::error!(error = %e, "key generation failed");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = if args.profile {
        run(&args, Driver::with_profiler(population, SpanProfiler::new()))
    } else {
        run(&args, Driver::with_profiler(population, NoopProfiler))
    };

    match result {
        Ok(report) => {
            tracing::info!(%report, "done");
            println!("ns/txn: {}", report.per_op().as_nanos());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "benchmark failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use mapbench::ConfigError;

    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["mapbench"]);
        assert_eq!(args.workers(), 2);
        assert_eq!(args.map, StoreKind::Papaya);
        assert_eq!(args.iterations, 2_000_000);

        let scenario = args.scenario();
        assert_eq!(scenario.pattern, AccessPattern::FixedRead);
        assert_eq!(scenario.partition, Partition::Shifted);
        assert_eq!(scenario.wrapper, None);
    }

    #[test]
    fn test_ngo_overrides_nprocs() {
        let args = Args::parse_from(["mapbench", "--nprocs", "4", "--ngo", "12"]);
        assert_eq!(args.workers(), 12);
        assert_eq!(args.scenario().workers, 12);
    }

    #[test]
    fn test_fill_defaults_to_disjoint() {
        let args = Args::parse_from(["mapbench", "--scenario", "fill", "--map", "dashmap"]);
        assert_eq!(args.scenario().partition, Partition::Disjoint);

        let args = Args::parse_from(["mapbench", "--scenario", "fill", "--partition", "shared"]);
        assert_eq!(args.scenario().partition, Partition::Shared);
    }

    #[test]
    fn test_hashed_fill_is_rejected() {
        let args = Args::parse_from([
            "mapbench",
            "--scenario",
            "fill",
            "--read-path",
            "hashed",
            "--keys-log2",
            "6",
            "--iterations",
            "8",
        ]);
        let population = KeyPopulation::with_bits(args.keys_log2).unwrap();

        let err = run(&args, Driver::new(population)).unwrap_err();
        assert_eq!(err, BenchError::Config(ConfigError::HashedFill));
    }

    #[test]
    fn test_parse_mask() {
        assert_eq!(parse_mask("0xfffff"), Ok(0xF_FFFF));
        assert_eq!(parse_mask("1023"), Ok(1023));
        assert!(parse_mask("0xzz").is_err());
    }
}
