//! A plain worker thread fed and drained through two queues.
//!
//! The UI sends [`Job`]s on the in-queue. The worker answers on the
//! out-queue, and a repeating timer on the UI loop drains that queue. Neither
//! side ever blocks on the other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use leibniz_core::{CancellationToken, LoopProxy, TimerId};
use parking_lot::Mutex;

use super::{Driver, TARGET};
use crate::config::Variant;
use crate::error::Result;
use crate::message::{Job, WorkerMessage};
use crate::series::SeriesRun;
use crate::window::MainWindow;

/// How long the idle worker waits for a job before rechecking its exit flag.
const JOB_WAIT: Duration = Duration::from_millis(50);

/// Runs the series on a `std::thread` and polls for its messages.
pub struct PollingDriver {
    jobs: Mutex<Option<Sender<Job>>>,
    messages: Receiver<WorkerMessage>,
    exit_flag: CancellationToken,
    current: Mutex<Option<CancellationToken>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    window: Weak<MainWindow>,
    ui: LoopProxy,
    timer: TimerId,
    shut_down: AtomicBool,
}

impl PollingDriver {
    /// Spawn the worker thread and start the queue timer on `ui`.
    pub fn new(
        window: &Arc<MainWindow>,
        ui: &LoopProxy,
        step_delay: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (job_tx, job_rx) = unbounded();
        let (message_tx, message_rx) = unbounded();
        let exit_flag = CancellationToken::new();

        let worker_exit = exit_flag.clone();
        let thread = thread::Builder::new()
            .name("leibniz-polling".to_string())
            .spawn(move || worker_loop(job_rx, message_tx, worker_exit, step_delay))?;

        let timer_messages = message_rx.clone();
        let weak = Arc::downgrade(window);
        let timer = ui.start_timer(poll_interval, move || {
            if let Some(window) = weak.upgrade() {
                drain_messages(&timer_messages, &window);
            }
        });

        Ok(Self {
            jobs: Mutex::new(Some(job_tx)),
            messages: message_rx,
            exit_flag,
            current: Mutex::new(None),
            thread: Mutex::new(Some(thread)),
            window: Arc::downgrade(window),
            ui: ui.clone(),
            timer,
            shut_down: AtomicBool::new(false),
        })
    }
}

impl Driver for PollingDriver {
    fn variant(&self) -> Variant {
        Variant::Polling
    }

    fn start(&self, iterations: u32) {
        let job = Job::new(iterations);
        if let Some(previous) = self.current.lock().replace(job.token.clone()) {
            previous.cancel();
        }

        let jobs = self.jobs.lock();
        match jobs.as_ref().map(|jobs| jobs.send(job)) {
            Some(Ok(())) => tracing::debug!(target: TARGET, iterations, "job queued"),
            Some(Err(_)) | None => {
                tracing::warn!(target: TARGET, "polling worker has exited, not starting");
            }
        }
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
        self.exit_flag.cancel();
        self.stop();
        self.jobs.lock().take();

        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                tracing::error!(target: TARGET, "polling worker panicked");
            }
        }
        if self.ui.stop_timer(self.timer).is_err() {
            tracing::trace!(target: TARGET, "queue timer already gone");
        }
        if let Some(window) = self.window.upgrade() {
            drain_messages(&self.messages, &window);
        }
        tracing::debug!(target: TARGET, "polling driver shut down");
    }
}

impl Drop for PollingDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The worker thread: wait for jobs until the exit flag is set.
fn worker_loop(
    jobs: Receiver<Job>,
    messages: Sender<WorkerMessage>,
    exit_flag: CancellationToken,
    step_delay: Duration,
) {
    tracing::debug!(target: TARGET, "polling worker started");
    while !exit_flag.is_cancelled() {
        let job = match jobs.recv_timeout(JOB_WAIT) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        SeriesRun::new(job.iterations)
            .with_step_delay(step_delay)
            .run(&job.token, |event| {
                for message in WorkerMessage::from_event(event) {
                    if messages.send(message).is_err() {
                        tracing::trace!(target: TARGET, "message queue closed");
                    }
                }
            });
    }
    tracing::debug!(target: TARGET, "polling worker finished");
}

/// Apply every queued message to `window`. Returns at once when the queue is
/// empty; returns the number of messages applied.
pub fn drain_messages(messages: &Receiver<WorkerMessage>, window: &MainWindow) -> usize {
    let mut applied = 0;
    loop {
        match messages.try_recv() {
            Ok(message) => {
                apply(window, &message);
                applied += 1;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return applied,
        }
    }
}

fn apply(window: &MainWindow, message: &WorkerMessage) {
    match message {
        WorkerMessage::Progress(percent) => window.progress_bar.set_percent(*percent),
        WorkerMessage::Done(_) => {
            window.progress_bar.set_value(100);
        }
        WorkerMessage::Status(_) | WorkerMessage::Cancelled(_) => {}
    }
    if let Some(text) = message.status_text() {
        window.update_status_bar.emit(text);
    }
}
