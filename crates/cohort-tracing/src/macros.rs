//! Instrumentation macros.

/// Open a [`crate::performance::PerformanceSpan`] named `$name` with the
/// process-wide default threshold.
///
/// Extra `field = value` pairs are emitted as a trace event when the span
/// opens, so the fields show up next to the timing in the log.
///
/// ```rust
/// use cohort_tracing::perf_span;
///
/// {
///     let _span = perf_span!("launch", league_size = 128, team_size = 4);
///     // ... work ...
/// }
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, $crate::performance::default_threshold_us())
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        $crate::tracing::trace!(perf = $name, $($field = $value),+, "perf_span_open");
        $crate::performance::PerformanceSpan::new($name, $crate::performance::default_threshold_us())
    }};
}

/// Like [`perf_span!`] but only logs when the duration reaches
/// `$threshold_us` microseconds.
#[macro_export]
macro_rules! perf_span_threshold {
    ($name:expr, $threshold_us:expr) => {{
        $crate::performance::PerformanceSpan::new($name, Some($threshold_us))
    }};
    ($name:expr, $threshold_us:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        $crate::tracing::trace!(perf = $name, $($field = $value),+, "perf_span_open");
        $crate::performance::PerformanceSpan::new($name, Some($threshold_us))
    }};
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_perf_span_macro() {
        let span = perf_span!("plain");
        assert_eq!(span.threshold_us(), crate::performance::default_threshold_us());
    }

    #[test]
    fn test_perf_span_with_fields() {
        let span = perf_span!("fields", league_size = 16, team_size = 2);
        assert_eq!(span.name(), "fields");
    }

    #[test]
    fn test_perf_span_threshold_macro() {
        let span = perf_span_threshold!("threshold", 500, elements = 42);
        assert_eq!(span.threshold_us(), Some(500));
    }
}
