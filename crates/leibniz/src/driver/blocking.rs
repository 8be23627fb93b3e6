//! Computation on the UI thread.

use std::sync::{Arc, Weak};
use std::time::Duration;

use leibniz_core::CancellationToken;
use parking_lot::Mutex;

use super::{Driver, TARGET};
use crate::config::Variant;
use crate::series::SeriesRun;
use crate::window::MainWindow;

/// Runs the whole series inside the Start slot.
///
/// The calling thread is busy until the run ends, so a window driven this way
/// processes no other input meanwhile. `stop()` only has an effect when called
/// from another thread.
pub struct BlockingDriver {
    window: Weak<MainWindow>,
    step_delay: Duration,
    current: Mutex<Option<CancellationToken>>,
}

impl BlockingDriver {
    pub fn new(window: &Arc<MainWindow>, step_delay: Duration) -> Self {
        Self {
            window: Arc::downgrade(window),
            step_delay,
            current: Mutex::new(None),
        }
    }
}

impl Driver for BlockingDriver {
    fn variant(&self) -> Variant {
        Variant::Blocking
    }

    fn start(&self, iterations: u32) {
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }
        let Some(window) = self.window.upgrade() else {
            tracing::warn!(target: TARGET, "window is gone, not starting");
            return;
        };

        tracing::debug!(target: TARGET, iterations, "blocking run on the UI thread");
        SeriesRun::new(iterations)
            .with_step_delay(self.step_delay)
            .run(&token, |event| window.show_series_event(event));
    }

    fn stop(&self) {
        if let Some(token) = self.current.lock().as_ref() {
            token.cancel();
        }
    }

    fn shutdown(&self) {
        self.stop();
    }
}
