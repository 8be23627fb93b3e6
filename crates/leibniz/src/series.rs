//! The Gregory-Leibniz series worker.
//!
//! `pi = 4 * (1 - 1/3 + 1/5 - 1/7 + ...)`, computed one term per step.
//!
//! [`Series`] is the pure, unpaced sequence of partial sums. [`SeriesRun`]
//! adds pacing (a delay after each step, standing in for expensive work) and
//! cooperative cancellation, and ends every run with exactly one terminal
//! event.
//!
//! # Example
//!
//! ```
//! use leibniz::series::{SeriesEvent, SeriesRun};
//! use leibniz_core::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let events: Vec<SeriesEvent> = SeriesRun::new(3).events(&token).collect();
//!
//! assert_eq!(events.len(), 4);
//! assert!(matches!(events[3], SeriesEvent::Done(_)));
//! ```

use std::time::Duration;

use leibniz_core::CancellationToken;
use leibniz_core::logging::PerfSpan;

/// Log target for the series worker.
pub const TARGET: &str = "leibniz::series";

/// The `i`-th term: `+4/(2i+1)` for even `i`, `-4/(2i+1)` for odd `i`.
pub fn term(i: u32) -> f64 {
    let magnitude = 4.0 / (2.0 * f64::from(i) + 1.0);
    if i % 2 == 0 { magnitude } else { -magnitude }
}

/// Sum of the first `iterations` terms.
pub fn gregory_leibniz(iterations: u32) -> f64 {
    Series::new(iterations).value()
}

/// Status bar text for a finished run.
pub fn done_text(value: f64) -> String {
    format!("pi={value:?}")
}

/// Status bar text for a stopped run.
pub fn cancelled_text(completed: u32) -> String {
    format!("Stopped after {completed} iterations")
}

/// One unit of progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStep {
    /// Zero-based iteration index.
    pub index: u32,
    /// Partial sum after adding term `index`.
    pub sum: f64,
    /// `index / iterations * 100`.
    pub percent: f64,
}

impl SeriesStep {
    /// Status bar text: `i={index} pi={sum}`.
    pub fn status_text(&self) -> String {
        format!("i={} pi={:?}", self.index, self.sum)
    }
}

/// The lazy sequence of partial sums.
#[derive(Debug, Clone)]
pub struct Series {
    iterations: u32,
    next: u32,
    sum: f64,
}

impl Series {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            next: 0,
            sum: 0.0,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Steps not yet produced.
    pub fn remaining(&self) -> u32 {
        self.iterations - self.next
    }

    /// The final sum, consuming the remaining steps.
    pub fn value(self) -> f64 {
        let current = self.sum;
        self.last().map_or(current, |step| step.sum)
    }
}

impl Iterator for Series {
    type Item = SeriesStep;

    fn next(&mut self) -> Option<SeriesStep> {
        if self.next >= self.iterations {
            return None;
        }
        let index = self.next;
        self.sum += term(index);
        self.next += 1;
        Some(SeriesStep {
            index,
            sum: self.sum,
            percent: f64::from(index) / f64::from(self.iterations) * 100.0,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Series {}

/// What a run emits: progress per step, then one terminal event.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesEvent {
    Progress(SeriesStep),
    Done(f64),
    Cancelled { completed: u32 },
}

impl SeriesEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SeriesEvent::Progress(_))
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Completed(f64),
    Cancelled { completed: u32 },
}

/// A paced, cancellable run of the series.
#[derive(Debug, Clone)]
pub struct SeriesRun {
    iterations: u32,
    step_delay: Duration,
}

impl SeriesRun {
    /// A run with no delay between steps.
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            step_delay: Duration::ZERO,
        }
    }

    /// Pause for `delay` after each step. A cancellation cuts the pause short.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// The lazy event sequence of this run.
    ///
    /// The token is checked before each iteration. Once a step has started it
    /// always completes and is reported.
    pub fn events(&self, token: &CancellationToken) -> SeriesEvents {
        SeriesEvents {
            series: Series::new(self.iterations),
            token: token.clone(),
            step_delay: self.step_delay,
            pause_pending: false,
            completed: 0,
            finished: false,
        }
    }

    /// Drive the run to the end, handing every event to `sink`.
    pub fn run<F>(&self, token: &CancellationToken, mut sink: F) -> Outcome
    where
        F: FnMut(&SeriesEvent),
    {
        let _span = PerfSpan::new("series_run");
        tracing::debug!(target: TARGET, iterations = self.iterations, "series run started");

        let mut outcome = Outcome::Cancelled { completed: 0 };
        for event in self.events(token) {
            sink(&event);
            match event {
                SeriesEvent::Done(value) => outcome = Outcome::Completed(value),
                SeriesEvent::Cancelled { completed } => outcome = Outcome::Cancelled { completed },
                SeriesEvent::Progress(_) => {}
            }
        }
        outcome
    }
}

/// Iterator returned by [`SeriesRun::events`].
pub struct SeriesEvents {
    series: Series,
    token: CancellationToken,
    step_delay: Duration,
    pause_pending: bool,
    completed: u32,
    finished: bool,
}

impl Iterator for SeriesEvents {
    type Item = SeriesEvent;

    fn next(&mut self) -> Option<SeriesEvent> {
        if self.finished {
            return None;
        }

        if self.pause_pending {
            self.pause_pending = false;
            if !self.step_delay.is_zero() {
                self.token.wait_timeout(self.step_delay);
            }
        }

        if self.series.remaining() == 0 {
            self.finished = true;
            let value = self.series.clone().value();
            tracing::debug!(target: TARGET, value, "series done");
            return Some(SeriesEvent::Done(value));
        }

        if self.token.is_cancelled() {
            self.finished = true;
            tracing::debug!(target: TARGET, completed = self.completed, "series cancelled");
            return Some(SeriesEvent::Cancelled {
                completed: self.completed,
            });
        }

        let step = self.series.next()?;
        self.completed += 1;
        self.pause_pending = true;
        tracing::trace!(target: TARGET, index = step.index, sum = step.sum, "series step");
        Some(SeriesEvent::Progress(step))
    }
}
