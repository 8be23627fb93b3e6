//! Messages exchanged with the polling worker thread.
//!
//! The UI side sends [`Job`]s down the in-queue; the worker answers on the
//! out-queue with [`WorkerMessage`]s. Messages are immutable once sent.

use leibniz_core::CancellationToken;

use crate::series::{SeriesEvent, cancelled_text, done_text};

/// A request to run the series.
#[derive(Debug, Clone)]
pub struct Job {
    pub iterations: u32,
    /// Cancels this job only.
    pub token: CancellationToken,
}

impl Job {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations,
            token: CancellationToken::new(),
        }
    }
}

/// What the worker reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// Progress bar value in percent.
    Progress(f64),
    /// Status bar text.
    Status(String),
    /// Final value of a completed run.
    Done(f64),
    /// A run stopped after this many iterations.
    Cancelled(u32),
}

impl WorkerMessage {
    /// Translate one series event into the messages that carry it.
    ///
    /// A step becomes a progress and a status message, in that order.
    pub fn from_event(event: &SeriesEvent) -> Vec<WorkerMessage> {
        match event {
            SeriesEvent::Progress(step) => vec![
                WorkerMessage::Progress(step.percent),
                WorkerMessage::Status(step.status_text()),
            ],
            SeriesEvent::Done(value) => vec![WorkerMessage::Done(*value)],
            SeriesEvent::Cancelled { completed } => vec![WorkerMessage::Cancelled(*completed)],
        }
    }

    /// Status bar text this message leads to, if any.
    pub fn status_text(&self) -> Option<String> {
        match self {
            WorkerMessage::Progress(_) => None,
            WorkerMessage::Status(text) => Some(text.clone()),
            WorkerMessage::Done(value) => Some(done_text(*value)),
            WorkerMessage::Cancelled(completed) => Some(cancelled_text(*completed)),
        }
    }
}
