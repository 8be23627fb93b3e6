//! Logging facilities for Leibniz.
//!
//! Leibniz uses the `tracing` crate for instrumentation. Nothing is printed
//! unless the application installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("leibniz_core::signal=trace")
//!     .init();
//! ```
//!
//! The constants in [`targets`] name every target the core crate logs
//! under, for use in filter directives.

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "leibniz_core";
    /// Event loop target.
    pub const EVENT_LOOP: &str = "leibniz_core::event_loop";
    /// Timer system target.
    pub const TIMER: &str = "leibniz_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "leibniz_core::signal";
    /// Worker thread target.
    pub const WORKER: &str = "leibniz_core::worker";
    /// [`PerfSpan`](super::PerfSpan) timings.
    pub const PERF: &str = "leibniz_core::perf";
}

/// A guard that measures an operation.
///
/// Enters an `info` span for its lifetime and logs the elapsed time at
/// `debug` level when dropped.
///
/// ```
/// use leibniz_core::logging::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("series_run");
///     // ... work ...
/// }
/// ```
pub struct PerfSpan {
    name: &'static str,
    started: std::time::Instant,
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span. It stays active until dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            name,
            started: std::time::Instant::now(),
            span: span.entered(),
        }
    }

    /// Time since the span was created.
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}

impl Drop for PerfSpan {
    fn drop(&mut self) {
        tracing::debug!(
            target: targets::PERF,
            operation = self.name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "operation finished"
        );
    }
}
