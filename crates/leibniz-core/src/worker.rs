//! Dedicated worker threads that run their own event loop.
//!
//! A [`WorkerThread`] owns one OS thread. That thread creates an
//! [`EventLoop`] and runs it until asked to quit, so objects living on the
//! worker receive queued signals and tasks exactly like objects on the UI
//! thread do.
//!
//! # Example
//!
//! ```
//! use leibniz_core::{Signal, WorkerThread};
//!
//! let worker = WorkerThread::builder().name("compute").spawn().unwrap();
//!
//! let start = Signal::<u32>::new();
//! start.connect_to(worker.proxy(), |&n| {
//!     println!("working on {} steps", n);
//! });
//! start.emit(5);
//!
//! worker.quit_and_wait();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{CoreError, Result};
use crate::event_loop::{EventLoop, LoopProxy};
use crate::logging::targets;

/// Configuration for creating a [`WorkerThread`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name for the worker thread (and its event loop).
    pub name: String,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "leibniz-worker".to_string(),
            stack_size: None,
        }
    }
}

impl WorkerConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating worker threads with custom configuration.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a new WorkerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the worker thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Start the worker thread.
    pub fn spawn(self) -> Result<WorkerThread> {
        WorkerThread::with_config(self.config)
    }
}

/// State shared between the handle and the worker thread.
struct WorkerState {
    running: AtomicBool,
    shutdown_mutex: Mutex<()>,
    shutdown_condvar: Condvar,
}

impl WorkerState {
    fn finish(&self) {
        let _guard = self.shutdown_mutex.lock();
        self.running.store(false, Ordering::Release);
        self.shutdown_condvar.notify_all();
    }
}

/// A thread running its own [`EventLoop`].
///
/// Dropping the handle asks the loop to quit and joins the thread.
pub struct WorkerThread {
    proxy: LoopProxy,
    handle: Mutex<Option<JoinHandle<i32>>>,
    state: Arc<WorkerState>,
}

impl WorkerThread {
    /// Spawn a worker with default configuration.
    pub fn spawn() -> Result<Self> {
        Self::with_config(WorkerConfig::default())
    }

    /// Create a builder for a custom worker.
    pub fn builder() -> WorkerBuilder {
        WorkerBuilder::new()
    }

    /// Spawn a worker with custom configuration.
    ///
    /// Returns once the worker's event loop exists, so the proxy is usable
    /// immediately.
    pub fn with_config(config: WorkerConfig) -> Result<Self> {
        let (proxy_tx, proxy_rx) = crossbeam_channel::bounded(1);
        let state = Arc::new(WorkerState {
            running: AtomicBool::new(true),
            shutdown_mutex: Mutex::new(()),
            shutdown_condvar: Condvar::new(),
        });

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread_state = state.clone();
        let loop_name = config.name;
        let handle = builder
            .spawn(move || {
                let event_loop = EventLoop::with_name(loop_name);
                let code = if proxy_tx.send(event_loop.proxy()).is_ok() {
                    tracing::debug!(target: targets::WORKER, name = %event_loop.proxy().name(), "worker started");
                    event_loop.run()
                } else {
                    -1
                };
                drop(event_loop);
                thread_state.finish();
                code
            })
            .map_err(|e| CoreError::WorkerSpawn(e.to_string()))?;

        let proxy = proxy_rx.recv().map_err(|_| {
            CoreError::WorkerSpawn("worker exited before its event loop started".to_string())
        })?;

        Ok(Self {
            proxy,
            handle: Mutex::new(Some(handle)),
            state,
        })
    }

    /// The worker's event loop. Use it as a connection receiver or to post tasks.
    pub fn proxy(&self) -> &LoopProxy {
        &self.proxy
    }

    /// The worker thread's name.
    pub fn name(&self) -> &str {
        self.proxy.name()
    }

    /// Check if the worker's event loop is still running.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Run a closure on the worker thread.
    pub fn post_task<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.proxy.post_task(task)
    }

    /// Ask the worker's event loop to quit. Does not wait.
    ///
    /// Work already running on the worker finishes first; the loop only sees
    /// the request when it next processes events.
    pub fn quit(&self) {
        if self.proxy.quit().is_err() {
            tracing::trace!(target: targets::WORKER, name = %self.name(), "worker loop already gone");
        }
    }

    /// Wait for the worker thread to finish and return its exit code.
    ///
    /// Returns `None` if the thread was already joined or panicked.
    pub fn wait(&self) -> Option<i32> {
        if self.proxy.is_loop_thread() {
            tracing::error!(target: targets::WORKER, name = %self.name(), "worker cannot wait for itself");
            return None;
        }

        let handle = self.handle.lock().take()?;
        match handle.join() {
            Ok(code) => {
                tracing::debug!(target: targets::WORKER, name = %self.name(), code, "worker finished");
                Some(code)
            }
            Err(_) => {
                tracing::error!(target: targets::WORKER, name = %self.name(), "worker thread panicked");
                None
            }
        }
    }

    /// Quit the loop and wait for the thread to finish.
    pub fn quit_and_wait(&self) -> Option<i32> {
        self.quit();
        self.wait()
    }

    /// Wait for the worker to stop running, up to `timeout`.
    ///
    /// Returns `true` if the worker finished within the timeout. Does not join.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.state.shutdown_mutex.lock();
        while self.is_running() {
            if self.state.shutdown_condvar.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        !self.is_running()
    }
}

impl std::fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerThread")
            .field("name", &self.name())
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        if self.handle.lock().is_some() {
            self.quit();
            self.wait();
        }
    }
}

static_assertions::assert_impl_all!(WorkerThread: Send, Sync);
