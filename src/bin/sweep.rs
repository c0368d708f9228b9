//! Worker-count sweep across stores.
//!
//! Runs the fixed-read scenario for every store and worker count, several
//! times each, and prints the median, fastest and slowest run per
//! configuration. Each run is also logged as JSON so sweeps can be compared
//! later.
//!
//! Run with:
//! ```bash
//! cargo run --release --features mimalloc --bin mapbench-sweep
//!
//! # Fewer stores, more runs
//! cargo run --release --bin mapbench-sweep -- --map papaya --map locked --runs 10
//!
//! # Inspect per-run results
//! jq 'select(.fields.message == "scenario finished")' logs/mapbench.jsonl
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use mapbench::{
    BenchError, Codec, Driver, KeyPopulation, LogConfig, ReadPath, Report, Scenario, StoreKind,
    Summary,
};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "mapbench-sweep")]
#[command(about = "Fixed-read scaling sweep across concurrent stores")]
struct Args {
    /// Stores to measure (default: all)
    #[arg(long, value_enum)]
    map: Vec<StoreKind>,

    /// Worker counts to sweep
    #[arg(long, value_delimiter = ',', default_value = "1,2,4,8,16,32")]
    workers: Vec<usize>,

    /// Runs per configuration
    #[arg(long, default_value_t = 5)]
    runs: usize,

    /// Population size as a power of two
    #[arg(long, default_value_t = 20)]
    keys_log2: u32,

    /// Iterations per worker
    #[arg(long, default_value_t = 1_000_000)]
    iterations: usize,

    /// Hash codec used by the stores
    #[arg(long, value_enum, default_value_t = Codec::Fold)]
    codec: Codec,

    /// Read entry point
    #[arg(long, value_enum, default_value_t = ReadPath::Simple)]
    read_path: ReadPath,
}

impl Args {
    fn stores(&self) -> Vec<StoreKind> {
        if self.map.is_empty() {
            StoreKind::ALL.to_vec()
        } else {
            self.map.clone()
        }
    }
}

fn sweep_store(args: &Args, driver: &mut Driver, kind: StoreKind) -> Result<(), BenchError> {
    let store = kind
        .populated(args.codec, driver.population())
        .map_err(BenchError::Setup)?;

    for &workers in &args.workers {
        let scenario = Scenario::fixed_read(workers, args.iterations)
            .with_read_path(args.read_path)
            .with_label(format!("{kind}/{workers}"));

        let reports = (0..args.runs)
            .map(|_| driver.run(&*store, &scenario))
            .collect::<Result<Vec<Report>, _>>()?;

        if let Some(summary) = Summary::new(reports) {
            print_summary(&summary);
        }
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    let (fast_run, fastest) = summary.fastest();
    let (slow_run, slowest) = summary.slowest();
    let median = summary.median();

    let per_op = |elapsed: Duration| {
        let ops = u128::from(fastest.total_ops.max(1));
        elapsed.as_nanos() / ops
    };

    println!(
        "{:<14} {:>4} workers  median {:>12?} ({:>4} ns/op)  fastest #{} {:>12?}  slowest #{} {:>12?}",
        fastest.store,
        fastest.workers,
        median,
        per_op(median),
        fast_run + 1,
        fastest.elapsed,
        slow_run + 1,
        slowest.elapsed,
    );

    if slowest.elapsed > median * 3 {
        let ratio = slowest.elapsed.as_secs_f64() / median.as_secs_f64();
        println!("  outlier: slowest run is {ratio:.1}x the median");
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = LogConfig::from_env();
    let _guard = match mapbench::init_json_tracing(&config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: cannot create {}: {e}", config.log_dir.display());
            None
        }
    };

    let population = match KeyPopulation::with_bits(args.keys_log2) {
        Ok(population) => population,
        Err(e) => {
            tracing::error!(error = %e, "key generation failed");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Fixed-read sweep: {} keys, {} iterations/worker, {} runs each",
        population.len(),
        args.iterations,
        args.runs
    );

    let mut driver = Driver::new(population);
    for kind in args.stores() {
        if let Err(e) = sweep_store(&args, &mut driver, kind) {
            tracing::error!(store = %kind, error = %e, "sweep failed");
            eprintln!("error: {kind}: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
