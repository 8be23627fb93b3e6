//! Deferred slot invocations for cross-thread signal delivery.
//!
//! When a signal is emitted on one thread for a slot that belongs to another
//! thread's event loop, the slot call is packaged as a [`QueuedInvocation`]
//! and posted to that loop. The loop executes invocations on its own thread,
//! in the order they were posted.
//!
//! Blocking deliveries carry a [`CompletionHandle`]; the emitting thread holds
//! the matching [`CompletionWaiter`] and blocks until the slot has run.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A type-erased slot call that can be executed later on another thread.
pub struct QueuedInvocation {
    invoke: Box<dyn FnOnce() + Send>,
    completion: Option<CompletionHandle>,
}

impl QueuedInvocation {
    /// Create a new queued invocation.
    pub fn new<F>(invoke: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            completion: None,
        }
    }

    /// Create a queued invocation that signals `completion` once it has run.
    pub fn with_completion<F>(invoke: F, completion: CompletionHandle) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            invoke: Box::new(invoke),
            completion: Some(completion),
        }
    }

    /// Execute the invocation, consuming it.
    pub fn execute(self) {
        (self.invoke)();
        if let Some(completion) = self.completion {
            completion.signal_done();
        }
    }
}

impl fmt::Debug for QueuedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedInvocation")
            .field("blocking", &self.completion.is_some())
            .finish_non_exhaustive()
    }
}

struct CompletionState {
    done: Mutex<bool>,
    condvar: Condvar,
}

/// The executing side of a blocking invocation.
pub struct CompletionHandle {
    inner: Arc<CompletionState>,
}

impl CompletionHandle {
    fn signal_done(self) {
        let mut done = self.inner.done.lock();
        *done = true;
        self.inner.condvar.notify_all();
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        // An invocation discarded without running (its loop went away) must
        // still release the emitter.
        let mut done = self.inner.done.lock();
        if !*done {
            *done = true;
            self.inner.condvar.notify_all();
        }
    }
}

/// The emitting side of a blocking invocation.
pub struct CompletionWaiter {
    inner: Arc<CompletionState>,
}

impl CompletionWaiter {
    /// Block until the invocation has executed (or been discarded).
    ///
    /// Waiting on the thread that is supposed to run the invocation deadlocks.
    pub fn wait(self) {
        let mut done = self.inner.done.lock();
        while !*done {
            self.inner.condvar.wait(&mut done);
        }
    }

    /// Wait with a timeout. Returns `true` if the invocation completed.
    pub fn wait_timeout(self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.inner.done.lock();
        while !*done {
            if self.inner.condvar.wait_until(&mut done, deadline).timed_out() {
                break;
            }
        }
        *done
    }
}

/// Create a completion handle/waiter pair for a blocking invocation.
pub fn completion_pair() -> (CompletionHandle, CompletionWaiter) {
    let state = Arc::new(CompletionState {
        done: Mutex::new(false),
        condvar: Condvar::new(),
    });

    (
        CompletionHandle {
            inner: state.clone(),
        },
        CompletionWaiter { inner: state },
    )
}
