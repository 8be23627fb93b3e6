//! A series object living on a worker thread, talking through signals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use leibniz_core::{CancellationToken, LoopProxy, Signal, WorkerThread};
use parking_lot::Mutex;

use super::{Driver, TARGET};
use crate::config::Variant;
use crate::error::Result;
use crate::series::{Outcome, SeriesEvent, SeriesRun, cancelled_text, done_text};
use crate::window::MainWindow;

/// The worker-side object.
///
/// # Signals
///
/// - `start((u32, CancellationToken))`: Run that many iterations under the token
/// - `progress((f64, String))`: Percent complete and status text, once per step
/// - `done(f64)`: The final value of a completed run
/// - `cancelled(u32)`: A run stopped after this many steps
pub struct SeriesObject {
    pub start: Signal<(u32, CancellationToken)>,
    pub progress: Signal<(f64, String)>,
    pub done: Signal<f64>,
    pub cancelled: Signal<u32>,
    step_delay: Duration,
}

impl SeriesObject {
    pub fn new(step_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            start: Signal::new(),
            progress: Signal::new(),
            done: Signal::new(),
            cancelled: Signal::new(),
            step_delay,
        })
    }

    /// Connect `start` so that runs execute on `thread`'s loop.
    pub fn move_to_thread(self: &Arc<Self>, thread: &LoopProxy) {
        let object: Weak<Self> = Arc::downgrade(self);
        self.start.connect_to(thread, move |(iterations, token)| {
            if let Some(object) = object.upgrade() {
                object.calculate(*iterations, token);
            }
        });
    }

    /// Run the series here, emitting one signal per event.
    pub fn calculate(&self, iterations: u32, token: &CancellationToken) -> Outcome {
        SeriesRun::new(iterations)
            .with_step_delay(self.step_delay)
            .run(token, |event| match event {
                SeriesEvent::Progress(step) => {
                    self.progress.emit((step.percent, step.status_text()));
                }
                SeriesEvent::Done(value) => self.done.emit(*value),
                SeriesEvent::Cancelled { completed } => self.cancelled.emit(*completed),
            })
    }
}

/// Runs the series on a dedicated [`WorkerThread`].
pub struct SignalDriver {
    worker: WorkerThread,
    object: Arc<SeriesObject>,
    current: Mutex<Option<CancellationToken>>,
    shut_down: AtomicBool,
}

impl SignalDriver {
    /// Spawn the worker and connect its results to `window` through `ui`.
    pub fn new(window: &Arc<MainWindow>, ui: &LoopProxy, step_delay: Duration) -> Result<Self> {
        let worker = WorkerThread::builder().name("leibniz-series").spawn()?;
        let object = SeriesObject::new(step_delay);
        object.move_to_thread(worker.proxy());

        let weak = Arc::downgrade(window);
        object.progress.connect_to(ui, move |(percent, status)| {
            if let Some(window) = weak.upgrade() {
                window.progress_bar.set_percent(*percent);
                window.update_status_bar.emit(status.clone());
            }
        });
        let weak = Arc::downgrade(window);
        object.done.connect_to(ui, move |&value| {
            if let Some(window) = weak.upgrade() {
                window.progress_bar.set_value(100);
                window.update_status_bar.emit(done_text(value));
            }
        });
        let weak = Arc::downgrade(window);
        object.cancelled.connect_to(ui, move |&completed| {
            if let Some(window) = weak.upgrade() {
                window.update_status_bar.emit(cancelled_text(completed));
            }
        });

        Ok(Self {
            worker,
            object,
            current: Mutex::new(None),
            shut_down: AtomicBool::new(false),
        })
    }

    pub fn object(&self) -> &Arc<SeriesObject> {
        &self.object
    }
}

impl Driver for SignalDriver {
    fn variant(&self) -> Variant {
        Variant::Signals
    }

    fn start(&self, iterations: u32) {
        if self.shut_down.load(Ordering::Acquire) {
            tracing::warn!(target: TARGET, "signal driver is shut down, not starting");
            return;
        }
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }
        tracing::debug!(target: TARGET, iterations, worker = %self.worker.name(), "queueing run");
        self.object.start.emit((iterations, token));
    }

    fn stop(&self) {
        if let Some(token) = self.current.lock().as_ref() {
            token.cancel();
        }
    }

    fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop();
        self.worker.quit_and_wait();
        tracing::debug!(target: TARGET, "signal driver shut down");
    }
}
