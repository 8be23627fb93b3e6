//! Concurrency drivers.
//!
//! A driver decides where the series runs and how its progress reaches the
//! window:
//!
//! - [`BlockingDriver`]: on the UI thread itself. The window freezes.
//! - [`SignalDriver`]: on a worker thread with its own event loop; progress
//!   comes back as queued signals.
//! - [`PollingDriver`]: on a plain thread; progress comes back through a
//!   queue that a UI timer drains.
//!
//! All three report the same partial sums. Each run gets its own
//! cancellation token, and starting a run cancels the one in progress.

mod blocking;
mod polling;
mod signals;

use std::sync::Arc;

use leibniz_core::{ConnectionType, LoopProxy};

pub use blocking::BlockingDriver;
pub use polling::{PollingDriver, drain_messages};
pub use signals::{SeriesObject, SignalDriver};

use crate::config::{Config, Variant};
use crate::error::Result;
use crate::window::MainWindow;

/// Log target for the drivers.
pub const TARGET: &str = "leibniz::driver";

/// Runs the series on behalf of a window.
pub trait Driver: Send + Sync {
    /// Which realization this is.
    fn variant(&self) -> Variant;

    /// Start a run, cancelling any run in progress.
    fn start(&self, iterations: u32);

    /// Cancel the run in progress, if any.
    fn stop(&self);

    /// Cancel, then release threads and timers. Blocks until the worker has
    /// finished. Later calls do nothing.
    fn shutdown(&self);
}

/// Build the driver selected by `config`.
///
/// `ui` is the event loop of the thread that owns `window`.
pub fn create(config: &Config, window: &Arc<MainWindow>, ui: &LoopProxy) -> Result<Arc<dyn Driver>> {
    let driver: Arc<dyn Driver> = match config.variant {
        Variant::Blocking => Arc::new(BlockingDriver::new(window, config.step_delay())),
        Variant::Signals => Arc::new(SignalDriver::new(window, ui, config.step_delay())?),
        Variant::Polling => Arc::new(PollingDriver::new(
            window,
            ui,
            config.step_delay(),
            config.poll_interval(),
        )?),
    };
    tracing::info!(target: TARGET, variant = %config.variant, "driver created");
    Ok(driver)
}

/// Wire `window` to `driver`.
///
/// Start runs `iterations` steps, Stop reports `Stop clicked` and cancels,
/// and closing the window shuts the driver down before `closed` is emitted.
pub fn install(window: &Arc<MainWindow>, driver: Arc<dyn Driver>, iterations: u32) {
    let direct = ConnectionType::Direct;

    window.start_requested.disconnect_all();
    let start_driver = driver.clone();
    window
        .start_requested
        .connect_with_type(move |_| start_driver.start(iterations), direct);

    window.stop_requested.disconnect_all();
    let stop_driver = driver.clone();
    let weak = Arc::downgrade(window);
    window.stop_requested.connect_with_type(
        move |_| {
            if let Some(window) = weak.upgrade() {
                window.update_status_bar.emit("Stop clicked".to_string());
            }
            stop_driver.stop();
        },
        direct,
    );

    let variant = driver.variant();
    window
        .closing
        .connect_with_type(move |_| driver.shutdown(), direct);

    tracing::debug!(target: TARGET, %variant, iterations, "driver installed");
}
