//! End-to-end tests of the three drivers behind a window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use leibniz::driver::{self, Driver};
use leibniz::window::MainWindow;
use leibniz::{Config, Variant};
use leibniz_core::{ConnectionType, EventLoop};
use parking_lot::Mutex;

const ALL_VARIANTS: [Variant; 3] = [Variant::Blocking, Variant::Signals, Variant::Polling];

/// A window and driver on the calling thread's event loop.
struct Harness {
    event_loop: EventLoop,
    window: Arc<MainWindow>,
    messages: Arc<Mutex<Vec<String>>>,
    progress: Arc<Mutex<Vec<i32>>>,
    driver: Arc<dyn Driver>,
}

impl Harness {
    fn new(variant: Variant, iterations: u32, step_delay_ms: u64) -> Self {
        let event_loop = EventLoop::new();
        let window = MainWindow::new("test");

        let messages = Arc::new(Mutex::new(Vec::new()));
        let messages_clone = messages.clone();
        window.status_bar.message_changed.connect_with_type(
            move |message| messages_clone.lock().push(message.clone()),
            ConnectionType::Direct,
        );
        let progress = Arc::new(Mutex::new(Vec::new()));
        let progress_clone = progress.clone();
        window.progress_bar.value_changed.connect_with_type(
            move |value| progress_clone.lock().push(*value),
            ConnectionType::Direct,
        );

        let config = Config {
            variant,
            iterations,
            step_delay_ms,
            poll_interval_ms: 5,
            ..Default::default()
        };
        let driver = driver::create(&config, &window, &event_loop.proxy()).unwrap();
        driver::install(&window, driver.clone(), iterations);

        Self {
            event_loop,
            window,
            messages,
            progress,
            driver,
        }
    }

    fn last_message(&self) -> String {
        self.messages.lock().last().cloned().unwrap_or_default()
    }

    /// Whether step `index` has been shown.
    fn reached(&self, index: u32) -> bool {
        let prefix = format!("i={index} ");
        self.messages.lock().iter().any(|m| m.starts_with(&prefix))
    }

    fn is_finished(&self) -> bool {
        let last = self.last_message();
        last.starts_with("pi=") || last.starts_with("Stopped after")
    }

    /// Pump the loop until `done` holds, failing after a few seconds.
    fn pump_until(&self, done: impl Fn(&Self) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(self) {
            assert!(Instant::now() < deadline, "timed out; messages: {:?}", self.messages.lock());
            self.event_loop.process_events(Duration::from_millis(10));
        }
    }

    /// Status messages reporting partial sums or a result.
    fn series_messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.starts_with("i=") || m.starts_with("pi=") || m.starts_with("Stopped"))
            .cloned()
            .collect()
    }
}

#[test]
fn test_five_iterations_every_driver() {
    let expected = vec![
        "i=0 pi=4.0",
        "i=1 pi=2.666666666666667",
        "i=2 pi=3.466666666666667",
        "i=3 pi=2.8952380952380956",
        "i=4 pi=3.3396825396825403",
        "pi=3.3396825396825403",
    ];

    for variant in ALL_VARIANTS {
        let harness = Harness::new(variant, 5, 0);
        assert_eq!(harness.driver.variant(), variant);

        harness.window.start_button.click();
        harness.pump_until(Harness::is_finished);

        assert_eq!(harness.series_messages(), expected, "{variant}");
        assert_eq!(*harness.progress.lock(), vec![20, 40, 60, 80, 100], "{variant}");
        assert!(harness.window.close());
    }
}

#[test]
fn test_drivers_agree_on_partial_sums() {
    let runs: Vec<Vec<String>> = ALL_VARIANTS
        .iter()
        .map(|&variant| {
            let harness = Harness::new(variant, 40, 0);
            harness.window.start_action.trigger();
            harness.pump_until(Harness::is_finished);
            harness.window.close();
            harness.series_messages()
        })
        .collect();

    assert_eq!(runs[0].len(), 41);
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[0], runs[2]);
}

#[test]
fn test_zero_iterations() {
    for variant in ALL_VARIANTS {
        let harness = Harness::new(variant, 0, 0);
        harness.window.start_button.click();
        harness.pump_until(Harness::is_finished);
        assert_eq!(harness.series_messages(), vec!["pi=0.0"], "{variant}");
        assert_eq!(harness.window.progress_bar.value(), 100);
        harness.window.close();
    }
}

#[test]
fn test_stop_cancels_threaded_runs() {
    for variant in [Variant::Signals, Variant::Polling] {
        let harness = Harness::new(variant, 1000, 5);
        harness.window.start_button.click();
        harness.pump_until(|h| h.reached(3));

        harness.window.stop_button.click();
        harness.pump_until(Harness::is_finished);

        let messages = harness.series_messages();
        let last = messages.last().unwrap();
        let steps = messages.len() - 1;
        assert_eq!(last, &format!("Stopped after {steps} iterations"), "{variant}");
        assert!(steps >= 4 && steps < 1000);
        assert!(harness.window.progress_bar.value() < 100);
        assert!(harness.messages.lock().contains(&"Stop clicked".to_string()));
        harness.window.close();
    }
}

#[test]
fn test_restart_cancels_previous_run() {
    let harness = Harness::new(Variant::Signals, 1000, 5);
    harness.window.start_button.click();
    harness.pump_until(|h| h.reached(1));

    harness.driver.start(3);
    harness.pump_until(|h| h.last_message().starts_with("pi="));

    let messages = harness.series_messages();
    assert!(messages.iter().any(|m| m.starts_with("Stopped after")));
    assert_eq!(messages.last().unwrap(), "pi=3.466666666666667");
    harness.window.close();
}

#[test]
fn test_close_joins_worker() {
    for variant in [Variant::Signals, Variant::Polling] {
        let harness = Harness::new(variant, 100_000, 10);
        harness.window.start_button.click();
        harness.pump_until(|h| h.reached(1));

        let started = Instant::now();
        assert!(harness.window.close());
        assert!(started.elapsed() < Duration::from_secs(2), "{variant}");
        assert!(harness.window.is_closed());

        // A second shutdown is a no-op.
        harness.driver.shutdown();
    }

    let polling = Harness::new(Variant::Polling, 100_000, 10);
    polling.window.start_button.click();
    polling.pump_until(|h| h.reached(0));
    polling.window.close();
    assert!(polling.last_message().starts_with("Stopped after"));
}
