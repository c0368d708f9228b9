//! Profiling hooks around the timed region.
//!
//! The driver calls [`Profiler::start`] once every worker is parked on the
//! start gate, immediately before the clock starts, and [`Profiler::stop`]
//! right after the last worker joins. What a profiler does in between is its
//! own business; the driver's measurement does not depend on it.

use std::time::{Duration, Instant};

use tracing::span::EnteredSpan;

/// Instrumentation bracketing a timed region.
pub trait Profiler {
    /// Called immediately before the clock starts.
    fn start(&mut self, label: &str);

    /// Called immediately after the clock stops, with the measured time.
    fn stop(&mut self, label: &str, elapsed: Duration);
}

/// A profiler that does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    #[inline]
    fn start(&mut self, _label: &str) {}

    #[inline]
    fn stop(&mut self, _label: &str, _elapsed: Duration) {}
}

/// Records each timed region as a `tracing` span.
///
/// The span is entered on the driver thread for the duration of the region,
/// and a completion event carries both the driver's measurement and the
/// profiler's own wall-clock reading. An entered span is tied to its thread,
/// so `start` and `stop` must be called from the same one.
#[derive(Debug, Default)]
pub struct SpanProfiler {
    active: Option<(EnteredSpan, Instant)>,
    regions: Vec<(String, Duration)>,
}

impl SpanProfiler {
    /// Create a profiler with no recorded regions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions recorded so far as `(label, elapsed)`.
    #[must_use]
    pub fn regions(&self) -> &[(String, Duration)] {
        &self.regions
    }
}

impl Profiler for SpanProfiler {
    fn start(&mut self, label: &str) {
        let span = tracing::info_span!("timed_region", label).entered();
        tracing::debug!("profiling started");
        self.active = Some((span, Instant::now()));
    }

    fn stop(&mut self, label: &str, elapsed: Duration) {
        let Some((span, started)) = self.active.take() else {
            tracing::warn!(label, "profiler stopped without being started");
            return;
        };

        let wall = started.elapsed();
        tracing::info!(?elapsed, ?wall, "profiling stopped");
        drop(span);
        self.regions.push((label.to_owned(), elapsed));
    }
}
