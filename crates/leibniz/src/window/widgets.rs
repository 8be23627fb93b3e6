//! The headless widgets of the main window.
//!
//! Widgets hold their state behind locks so that slots, which must be
//! `Send + Sync`, can update them. Every state change is announced through a
//! signal; front ends render by connecting to those signals.

use std::sync::atomic::{AtomicBool, Ordering};

use leibniz_core::Signal;
use parking_lot::RwLock;

/// A push button.
///
/// # Signals
///
/// - `clicked(())`: Emitted when the button is clicked while enabled
pub struct Button {
    text: String,
    enabled: AtomicBool,
    pub clicked: Signal<()>,
}

impl Button {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            enabled: AtomicBool::new(true),
            clicked: Signal::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Simulate a click. Returns `false` if the button is disabled.
    pub fn click(&self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.clicked.emit(());
        true
    }
}

/// The status bar at the bottom of the window.
///
/// # Signals
///
/// - `message_changed(String)`: Emitted whenever a message is shown or cleared
pub struct StatusBar {
    message: RwLock<String>,
    pub message_changed: Signal<String>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            message: RwLock::new(String::new()),
            message_changed: Signal::new(),
        }
    }

    /// The message currently displayed.
    pub fn current_message(&self) -> String {
        self.message.read().clone()
    }

    /// Display `text`, replacing the previous message.
    pub fn show_message(&self, text: impl Into<String>) {
        let text = text.into();
        *self.message.write() = text.clone();
        self.message_changed.emit(text);
    }

    /// Clear the current message.
    pub fn clear_message(&self) {
        let was_empty = {
            let mut message = self.message.write();
            let was_empty = message.is_empty();
            message.clear();
            was_empty
        };
        if !was_empty {
            self.message_changed.emit(String::new());
        }
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct ProgressRange {
    minimum: i32,
    maximum: i32,
    value: i32,
}

/// A progress bar over an integer range, `0..=100` by default.
///
/// # Signals
///
/// - `value_changed(i32)`: Emitted when the value changes
pub struct ProgressBar {
    state: RwLock<ProgressRange>,
    pub value_changed: Signal<i32>,
}

impl ProgressBar {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ProgressRange {
                minimum: 0,
                maximum: 100,
                value: 0,
            }),
            value_changed: Signal::new(),
        }
    }

    pub fn value(&self) -> i32 {
        self.state.read().value
    }

    pub fn minimum(&self) -> i32 {
        self.state.read().minimum
    }

    pub fn maximum(&self) -> i32 {
        self.state.read().maximum
    }

    /// Set the current progress value.
    ///
    /// The value is clamped to the range [minimum, maximum].
    pub fn set_value(&self, value: i32) {
        let changed = {
            let mut state = self.state.write();
            let clamped = if state.minimum <= state.maximum {
                value.clamp(state.minimum, state.maximum)
            } else {
                value.clamp(state.maximum, state.minimum)
            };
            if state.value == clamped {
                None
            } else {
                state.value = clamped;
                Some(clamped)
            }
        };

        if let Some(value) = changed {
            self.value_changed.emit(value);
        }
    }

    /// Set the value from a float percentage, truncating the fraction.
    pub fn set_percent(&self, percent: f64) {
        // `as` saturates and maps NaN to 0.
        self.set_value(percent as i32);
    }

    /// Set the progress range. The value is clamped into it.
    pub fn set_range(&self, minimum: i32, maximum: i32) {
        let value = {
            let mut state = self.state.write();
            state.minimum = minimum;
            state.maximum = maximum;
            state.value
        };
        self.set_value(value);
    }

    /// Return to the minimum.
    pub fn reset(&self) {
        let minimum = self.minimum();
        self.set_value(minimum);
    }

    /// Display text, e.g. `"40%"`.
    pub fn text(&self) -> String {
        let state = *self.state.read();
        let span = (state.maximum - state.minimum) as f64;
        if span == 0.0 {
            return String::new();
        }
        let percentage = ((state.value - state.minimum) as f64 / span * 100.0).round() as i32;
        format!("{percentage}%")
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}
