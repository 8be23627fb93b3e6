//! The headless event loop.
//!
//! An [`EventLoop`] belongs to the thread that created it. Other threads reach
//! it through a cloneable [`LoopProxy`]: they post deferred tasks, queued
//! signal invocations, timer changes, and quit requests. The loop dispatches
//! everything on its own thread, by priority and then in posting order.
//!
//! Creating a loop also registers it as the *current* loop of its thread, so
//! signals connected on that thread know where to deliver queued calls.
//!
//! # Example
//!
//! ```
//! use leibniz_core::EventLoop;
//! use std::time::Duration;
//!
//! let event_loop = EventLoop::new();
//! let proxy = event_loop.proxy();
//!
//! std::thread::spawn(move || {
//!     proxy.post_task(|| println!("runs on the loop thread")).unwrap();
//!     proxy.exit(3).unwrap();
//! });
//!
//! assert_eq!(event_loop.run(), 3);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BinaryHeap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::event::{LoopEvent, PrioritizedEvent};
use crate::invocation::QueuedInvocation;
use crate::logging::targets;
use crate::timer::{TimerId, TimerKind, TimerManager};

/// Upper bound on a single blocking wait inside [`EventLoop::run`].
const MAX_IDLE_WAIT: Duration = Duration::from_millis(500);

thread_local! {
    static CURRENT_LOOP: RefCell<Option<LoopProxy>> = const { RefCell::new(None) };
}

/// State shared between a loop and all of its proxies.
struct LoopShared {
    sender: Sender<LoopEvent>,
    timers: Mutex<TimerManager>,
    thread: ThreadId,
    name: String,
}

/// A thread-safe handle to an [`EventLoop`].
///
/// Every operation is safe to call from any thread. Posting to a loop that
/// has been dropped fails with [`CoreError::LoopExited`].
#[derive(Clone)]
pub struct LoopProxy {
    shared: Arc<LoopShared>,
}

impl LoopProxy {
    /// The loop registered on the calling thread, if any.
    pub fn current() -> Option<LoopProxy> {
        CURRENT_LOOP.with(|cell| cell.borrow().clone())
    }

    /// The thread that owns the loop.
    pub fn thread_id(&self) -> ThreadId {
        self.shared.thread
    }

    /// The loop's name (used in logs).
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether the calling thread owns this loop.
    pub fn is_loop_thread(&self) -> bool {
        std::thread::current().id() == self.shared.thread
    }

    /// Whether two proxies refer to the same loop.
    pub fn same_loop(&self, other: &LoopProxy) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Post a raw event.
    pub fn post(&self, event: LoopEvent) -> Result<()> {
        self.shared
            .sender
            .send(event)
            .map_err(|_| CoreError::LoopExited)
    }

    /// Post a task to run on the loop thread.
    pub fn post_task<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(LoopEvent::DeferredTask(QueuedInvocation::new(task)))
    }

    /// Post a queued signal invocation, handing it back if the loop is gone.
    pub(crate) fn post_invocation(
        &self,
        invocation: QueuedInvocation,
    ) -> std::result::Result<(), QueuedInvocation> {
        self.shared
            .sender
            .send(LoopEvent::QueuedSignal(invocation))
            .map_err(|err| match err.into_inner() {
                LoopEvent::QueuedSignal(invocation) => invocation,
                // We only ever put a QueuedSignal in.
                _ => QueuedInvocation::new(|| {}),
            })
    }

    /// Ask the loop to leave `run()` with exit code 0.
    pub fn quit(&self) -> Result<()> {
        self.exit(0)
    }

    /// Ask the loop to leave `run()` with the given exit code.
    pub fn exit(&self, code: i32) -> Result<()> {
        tracing::debug!(target: targets::EVENT_LOOP, name = %self.shared.name, code, "exit requested");
        self.post(LoopEvent::Quit { code })
    }

    /// Wake the loop so it recomputes its timer deadline.
    pub fn wake_up(&self) -> Result<()> {
        self.post(LoopEvent::WakeUp)
    }

    /// Start a repeating timer whose callback runs on the loop thread.
    pub fn start_timer<F>(&self, interval: Duration, callback: F) -> TimerId
    where
        F: FnMut() + Send + 'static,
    {
        self.start(TimerKind::Repeating, interval, Box::new(callback))
    }

    /// Start a single-shot timer whose callback runs on the loop thread.
    pub fn single_shot<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callback = Some(callback);
        self.start(
            TimerKind::SingleShot,
            delay,
            Box::new(move || {
                if let Some(callback) = callback.take() {
                    callback();
                }
            }),
        )
    }

    /// Stop a timer.
    pub fn stop_timer(&self, id: TimerId) -> Result<()> {
        self.shared.timers.lock().stop(id)?;
        Ok(())
    }

    /// Check if a timer is still scheduled.
    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.shared.timers.lock().is_active(id)
    }

    /// Number of scheduled timers.
    pub fn active_timer_count(&self) -> usize {
        self.shared.timers.lock().active_count()
    }

    fn start(&self, kind: TimerKind, interval: Duration, callback: crate::timer::TimerCallback) -> TimerId {
        let id = self.shared.timers.lock().start(kind, interval, callback);
        // The loop may be sleeping past the new deadline.
        let _ = self.wake_up();
        id
    }
}

impl std::fmt::Debug for LoopProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopProxy")
            .field("name", &self.shared.name)
            .field("thread", &self.shared.thread)
            .finish()
    }
}

/// A single-threaded event loop.
///
/// The loop is bound to its creating thread (it is neither `Send` nor `Sync`).
pub struct EventLoop {
    proxy: LoopProxy,
    receiver: Receiver<LoopEvent>,
    sequence: Cell<u64>,
    exit_code: Cell<Option<i32>>,
    _not_send: PhantomData<*const ()>,
}

impl EventLoop {
    /// Create a loop on the current thread and make it the thread's current loop.
    pub fn new() -> Self {
        let name = std::thread::current()
            .name()
            .unwrap_or("unnamed")
            .to_string();
        Self::with_name(name)
    }

    /// Create a loop with an explicit name for logging.
    pub fn with_name(name: impl Into<String>) -> Self {
        let (sender, receiver) = unbounded();
        let proxy = LoopProxy {
            shared: Arc::new(LoopShared {
                sender,
                timers: Mutex::new(TimerManager::new()),
                thread: std::thread::current().id(),
                name: name.into(),
            }),
        };

        CURRENT_LOOP.with(|cell| *cell.borrow_mut() = Some(proxy.clone()));
        tracing::debug!(target: targets::EVENT_LOOP, name = %proxy.name(), "event loop created");

        Self {
            proxy,
            receiver,
            sequence: Cell::new(0),
            exit_code: Cell::new(None),
            _not_send: PhantomData,
        }
    }

    /// A thread-safe handle to this loop.
    pub fn proxy(&self) -> LoopProxy {
        self.proxy.clone()
    }

    /// Post a task to run on a later iteration.
    pub fn post_task<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.proxy.post_task(task);
    }

    /// Start a repeating timer.
    pub fn start_timer<F>(&self, interval: Duration, callback: F) -> TimerId
    where
        F: FnMut() + Send + 'static,
    {
        self.proxy.start_timer(interval, callback)
    }

    /// Start a single-shot timer.
    pub fn single_shot<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        self.proxy.single_shot(delay, callback)
    }

    /// Stop a timer.
    pub fn stop_timer(&self, id: TimerId) -> Result<()> {
        self.proxy.stop_timer(id)
    }

    /// Check if a timer is still scheduled.
    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.proxy.is_timer_active(id)
    }

    /// Request `run()` to return `code` after the current iteration.
    pub fn exit(&self, code: i32) {
        let _ = self.proxy.exit(code);
    }

    /// Request `run()` to return 0 after the current iteration.
    pub fn quit(&self) {
        self.exit(0);
    }

    /// Run until an exit is requested, returning the exit code.
    #[tracing::instrument(skip(self), target = "leibniz_core::event_loop", level = "debug", fields(name = %self.proxy.name()))]
    pub fn run(&self) -> i32 {
        tracing::info!(target: targets::EVENT_LOOP, "starting event loop");
        loop {
            self.process_events(MAX_IDLE_WAIT);
            if let Some(code) = self.exit_code.take() {
                tracing::info!(target: targets::EVENT_LOOP, code, "event loop finished");
                return code;
            }
        }
    }

    /// Run one iteration: wait up to `max_wait` (or until the next timer) for
    /// an event, then dispatch every ready event and due timer.
    ///
    /// Returns the number of events and timer callbacks dispatched.
    pub fn process_events(&self, max_wait: Duration) -> usize {
        let wait = match self.proxy.shared.timers.lock().time_until_next() {
            Some(until_timer) => until_timer.min(max_wait),
            None => max_wait,
        };

        let mut ready = BinaryHeap::new();
        match self.receiver.recv_timeout(wait) {
            Ok(event) => ready.push(self.prioritize(event)),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {}
        }
        while let Ok(event) = self.receiver.try_recv() {
            ready.push(self.prioritize(event));
        }

        let mut dispatched = self.fire_timers();
        while let Some(entry) = ready.pop() {
            dispatched += self.dispatch(entry.event);
        }
        dispatched
    }

    /// Dispatch everything that is ready right now without blocking.
    pub fn process_pending(&self) -> usize {
        self.process_events(Duration::ZERO)
    }

    /// Keep dispatching for `duration` of wall-clock time.
    ///
    /// Exit requests are honored: the remaining time is skipped and the
    /// request stays pending for a later `run()`.
    pub fn process_events_for(&self, duration: Duration) -> usize {
        let deadline = Instant::now() + duration;
        let mut dispatched = 0;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            dispatched += self.process_events(deadline - now);
            if let Some(code) = self.exit_code.get() {
                tracing::trace!(target: targets::EVENT_LOOP, code, "exit pending");
                break;
            }
        }
        dispatched
    }

    fn prioritize(&self, event: LoopEvent) -> PrioritizedEvent {
        let sequence = self.sequence.get();
        self.sequence.set(sequence + 1);
        PrioritizedEvent::new(event, sequence)
    }

    fn fire_timers(&self) -> usize {
        let due = self.proxy.shared.timers.lock().take_expired(Instant::now());
        let count = due.len();
        for (id, mut callback) in due {
            // Lock released: callbacks may start or stop timers.
            callback();
            self.proxy.shared.timers.lock().restore(id, callback);
        }
        count
    }

    fn dispatch(&self, event: LoopEvent) -> usize {
        match event {
            LoopEvent::QueuedSignal(invocation) | LoopEvent::DeferredTask(invocation) => {
                invocation.execute();
                1
            }
            LoopEvent::Quit { code } => {
                self.exit_code.set(Some(code));
                1
            }
            LoopEvent::WakeUp => 0,
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        CURRENT_LOOP.with(|cell| {
            let mut current = cell.borrow_mut();
            if current.as_ref().is_some_and(|p| p.same_loop(&self.proxy)) {
                *current = None;
            }
        });
        tracing::debug!(target: targets::EVENT_LOOP, name = %self.proxy.name(), "event loop dropped");
    }
}

static_assertions::assert_impl_all!(LoopProxy: Send, Sync);
static_assertions::assert_not_impl_any!(EventLoop: Send, Sync);
