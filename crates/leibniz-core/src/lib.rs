//! Core systems for Leibniz.
//!
//! This crate provides the headless plumbing behind the Leibniz demo
//! application:
//!
//! - **Event Loop**: A per-thread loop that dispatches tasks, queued signals and timers
//! - **Signal/Slot System**: Type-safe notifications that cross threads safely
//! - **Timers**: One-shot and repeating timers run by the event loop
//! - **Worker Threads**: Dedicated threads with their own event loop
//! - **Cancellation**: Cooperative stop flags for long-running work
//!
//! # Signal/Slot Example
//!
//! ```
//! use leibniz_core::Signal;
//!
//! let progress = Signal::<(f64, String)>::new();
//!
//! let conn_id = progress.connect(|(percent, status)| {
//!     println!("{percent:.0}%: {status}");
//! });
//!
//! progress.emit((20.0, "i=1 pi=2.6666666666666665".to_string()));
//! progress.disconnect(conn_id);
//! ```
//!
//! # Cross-Thread Example
//!
//! ```
//! use leibniz_core::{EventLoop, Signal};
//! use std::sync::Arc;
//!
//! let event_loop = EventLoop::new();
//! let done = Arc::new(Signal::<f64>::new());
//!
//! // Connected on the loop thread: emissions from elsewhere are queued here.
//! let proxy = event_loop.proxy();
//! done.connect(move |pi| {
//!     println!("pi={pi}");
//!     proxy.quit().unwrap();
//! });
//!
//! let emitter = done.clone();
//! std::thread::spawn(move || emitter.emit(3.14));
//!
//! assert_eq!(event_loop.run(), 0);
//! ```

pub mod cancel;
mod error;
pub mod event;
pub mod event_loop;
pub mod invocation;
pub mod logging;
pub mod signal;
pub mod timer;
pub mod worker;

pub use cancel::CancellationToken;
pub use error::{CoreError, Result, SignalError, TimerError};
pub use event::{EventPriority, LoopEvent};
pub use event_loop::{EventLoop, LoopProxy};
pub use invocation::{CompletionHandle, CompletionWaiter, QueuedInvocation, completion_pair};
pub use signal::{ConnectionGuard, ConnectionId, ConnectionType, Signal};
pub use timer::{TimerCallback, TimerId, TimerKind};
pub use worker::{WorkerBuilder, WorkerConfig, WorkerThread};
