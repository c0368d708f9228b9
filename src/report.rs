//! Filepath: src/report.rs
//!
//! Turning raw worker counts and elapsed time into comparable numbers.
//!
//! The only derived statistic is time per operation: elapsed wall-clock time
//! divided by the number of operations all workers completed. [`Summary`]
//! groups repeated runs of one configuration and keeps the fastest, slowest
//! and median elapsed times, nothing more.

use std::fmt as StdFmt;
use std::time::Duration;

/// What one worker did during the timed region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerResult {
    /// Worker index.
    pub worker: usize,
    /// Store operations completed.
    pub operations: u64,
    /// Lookups that found their key. Zero for write scenarios.
    pub hits: u64,
}

/// Outcome of one scenario run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// Scenario label.
    pub label: String,
    /// Name of the store under test.
    pub store: &'static str,
    /// Worker count.
    pub workers: usize,
    /// Iterations per worker.
    pub iterations: usize,
    /// Operations completed across all workers.
    pub total_ops: u64,
    /// Successful lookups across all workers.
    pub hits: u64,
    /// Time between opening the start gate and the final join.
    pub elapsed: Duration,
}

impl Report {
    /// Fold per-worker results and the measured time into a report.
    #[must_use]
    pub fn aggregate(
        label: impl Into<String>,
        store: &'static str,
        iterations: usize,
        results: &[WorkerResult],
        elapsed: Duration,
    ) -> Self {
        let total_ops = results.iter().map(|r| r.operations).sum();
        let hits = results.iter().map(|r| r.hits).sum();

        Self {
            label: label.into(),
            store,
            workers: results.len(),
            iterations,
            total_ops,
            hits,
            elapsed,
        }
    }

    /// Operations the scenario asked for: workers × iterations.
    #[must_use]
    pub const fn expected_ops(&self) -> u64 {
        (self.workers as u64).saturating_mul(self.iterations as u64)
    }

    /// Elapsed time divided by total operations, truncated to whole nanoseconds.
    #[must_use]
    pub fn per_op(&self) -> Duration {
        if self.total_ops == 0 {
            return Duration::ZERO;
        }
        let nanos = self.elapsed.as_nanos() / u128::from(self.total_ops);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Elapsed nanoseconds per operation.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn ns_per_op(&self) -> f64 {
        if self.total_ops == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.total_ops as f64
    }

    /// Operations per second across all workers.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_ops as f64 / secs
    }
}

impl StdFmt::Display for Report {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(
            f,
            "{} [{}] {} workers x {} ops: {:?} total, {:.2} ns/op, {:.0} ops/sec",
            self.label,
            self.store,
            self.workers,
            self.iterations,
            self.elapsed,
            self.ns_per_op(),
            self.ops_per_sec()
        )
    }
}

// ============================================================================
//  Summary
// ============================================================================

/// Repeated runs of one configuration.
#[derive(Clone, Debug)]
pub struct Summary {
    reports: Vec<Report>,
}

impl Summary {
    /// Group `reports`. Returns `None` when there are none.
    #[must_use]
    pub fn new(reports: Vec<Report>) -> Option<Self> {
        if reports.is_empty() {
            None
        } else {
            Some(Self { reports })
        }
    }

    /// All runs in the order they were recorded.
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Run with the smallest elapsed time, with its index.
    #[must_use]
    pub fn fastest(&self) -> (usize, &Report) {
        self.extreme(std::cmp::Ordering::Less)
    }

    /// Run with the largest elapsed time, with its index.
    #[must_use]
    pub fn slowest(&self) -> (usize, &Report) {
        self.extreme(std::cmp::Ordering::Greater)
    }

    /// Median elapsed time (mean of the middle two for an even count).
    #[must_use]
    pub fn median(&self) -> Duration {
        let mut sorted: Vec<Duration> = self.reports.iter().map(|r| r.elapsed).collect();
        sorted.sort_unstable();

        let mid = sorted.len() / 2;
        match (sorted.get(mid), mid.checked_sub(1).and_then(|i| sorted.get(i))) {
            (Some(&median), _) if sorted.len() % 2 == 1 => median,
            (Some(&hi), Some(&lo)) => lo + (hi - lo) / 2,
            _ => Duration::ZERO,
        }
    }

    #[expect(clippy::indexing_slicing)]
    fn extreme(&self, wanted: std::cmp::Ordering) -> (usize, &Report) {
        let mut best = (0, &self.reports[0]);
        for (i, report) in self.reports.iter().enumerate().skip(1) {
            if report.elapsed.cmp(&best.1.elapsed) == wanted {
                best = (i, report);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(ops: &[u64]) -> Vec<WorkerResult> {
        ops.iter()
            .enumerate()
            .map(|(worker, &operations)| WorkerResult {
                worker,
                operations,
                hits: operations,
            })
            .collect()
    }

    fn report(elapsed_ms: u64) -> Report {
        Report::aggregate(
            "run",
            "locked",
            10,
            &results(&[10, 10]),
            Duration::from_millis(elapsed_ms),
        )
    }

    #[test]
    fn test_aggregate_sums_workers() {
        let report = Report::aggregate(
            "fixed-read",
            "papaya",
            1_000,
            &results(&[1_000, 1_000, 1_000, 1_000]),
            Duration::from_micros(400),
        );
        assert_eq!(report.workers, 4);
        assert_eq!(report.total_ops, 4_000);
        assert_eq!(report.expected_ops(), 4_000);
        assert_eq!(report.hits, 4_000);
        assert_eq!(report.per_op(), Duration::from_nanos(100));
        assert!((report.ns_per_op() - 100.0).abs() < f64::EPSILON);
        assert!((report.ops_per_sec() - 10_000_000.0).abs() < 1.0);
    }

    #[test]
    fn test_per_op_truncates() {
        let report = Report::aggregate("r", "scc", 3, &results(&[3]), Duration::from_nanos(10));
        assert_eq!(report.per_op(), Duration::from_nanos(3));
    }

    #[test]
    fn test_zero_ops_reports_zero() {
        let report = Report::aggregate("r", "scc", 0, &[], Duration::from_millis(5));
        assert_eq!(report.per_op(), Duration::ZERO);
        assert!(report.ns_per_op().abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_contains_ns_per_op() {
        let line = report(1).to_string();
        assert!(line.starts_with("run [locked] 2 workers x 10 ops"));
        assert!(line.contains("ns/op"));
    }

    #[test]
    fn test_summary_extremes_and_median() {
        let summary = Summary::new(vec![report(30), report(10), report(20), report(40)]).unwrap();
        assert_eq!(summary.fastest().0, 1);
        assert_eq!(summary.slowest().0, 3);
        assert_eq!(summary.median(), Duration::from_millis(25));

        let odd = Summary::new(vec![report(5), report(1), report(3)]).unwrap();
        assert_eq!(odd.median(), Duration::from_millis(3));
    }

    #[test]
    fn test_summary_rejects_empty() {
        assert!(Summary::new(Vec::new()).is_none());
    }
}
