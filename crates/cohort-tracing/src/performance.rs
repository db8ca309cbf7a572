//! Timing helpers for launches, slot waits, and reductions.
//!
//! ```rust
//! use cohort_tracing::performance::{record_launch, PerformanceSpan};
//!
//! let span = PerformanceSpan::new("league", Some(100));
//! drop(span); // logged only if it took at least 100μs
//!
//! record_launch(1000, 4, 2, 350);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

const NO_THRESHOLD: u64 = u64::MAX;

static DEFAULT_THRESHOLD_US: AtomicU64 = AtomicU64::new(NO_THRESHOLD);

/// Threshold applied by [`crate::perf_span!`]. Set by
/// [`crate::init_global_tracing`] from [`crate::TracingConfig`].
pub fn set_default_threshold_us(threshold_us: Option<u64>) {
    DEFAULT_THRESHOLD_US.store(threshold_us.unwrap_or(NO_THRESHOLD), Ordering::Relaxed);
}

pub fn default_threshold_us() -> Option<u64> {
    match DEFAULT_THRESHOLD_US.load(Ordering::Relaxed) {
        NO_THRESHOLD => None,
        threshold_us => Some(threshold_us),
    }
}

/// RAII timer: logs its duration at debug level when dropped, optionally
/// only when the duration reaches a threshold.
pub struct PerformanceSpan {
    name: String,
    threshold_us: Option<u64>,
    start_time: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    /// Start timing `name`. `threshold_us = None` always logs.
    pub fn new(name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let name = name.into();
        let span = tracing::debug_span!("perf", name = %name);
        Self {
            name,
            threshold_us,
            start_time: Instant::now(),
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threshold_us(&self) -> Option<u64> {
        self.threshold_us
    }

    /// Microseconds since the span was created.
    pub fn elapsed_us(&self) -> u64 {
        self.start_time.elapsed().as_micros() as u64
    }

    /// Enter the underlying `tracing` span.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        let elapsed_us = self.elapsed_us();
        if self.threshold_us.is_none_or(|t| elapsed_us >= t) {
            let _entered = self.span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Record a completed league launch.
pub fn record_launch(league_size: usize, team_size: usize, crews: usize, duration_us: u64) {
    let teams_per_sec = if duration_us > 0 {
        league_size as f64 / duration_us as f64 * 1_000_000.0
    } else {
        0.0
    };

    tracing::debug!(
        event = "launch",
        league_size,
        team_size,
        crews,
        duration_us,
        teams_per_sec,
        "league_complete"
    );
}

/// Record a team-wide reduction.
pub fn record_reduction(mode: &str, elements: usize, team_size: usize, duration_us: u64) {
    tracing::trace!(
        event = "reduction",
        mode,
        elements,
        team_size,
        duration_us,
        "team_reduction_complete"
    );
}
