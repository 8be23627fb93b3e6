//! The headless main window.
//!
//! [`MainWindow`] models the demo window as data plus signals: three buttons,
//! a menu bar, a status bar and a progress bar. Nothing is drawn; a front end
//! renders the window by connecting to the widgets' signals.
//!
//! # Default wiring
//!
//! | Source                           | Effect                                   |
//! |----------------------------------|------------------------------------------|
//! | Start button, `&Start` (Ctrl+S)  | `start_requested`, status `Start clicked` |
//! | Stop button, `S&top` (Ctrl+T)    | `stop_requested`, status `Stop clicked`  |
//! | Quit button, `&Quit` (Ctrl+Q)    | [`MainWindow::close`]                    |
//! | `&Help` (F1)                     | `help_requested` with a [`HelpDialog`]   |
//! | `update_status_bar(text)`        | status bar shows `text`                  |
//!
//! A driver replaces the Start/Stop handlers and hooks `closing`; see
//! [`crate::driver::install`].

mod action;
mod shortcut;
mod widgets;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use leibniz_core::{ConnectionType, Signal};
use parking_lot::RwLock;

pub use action::{Action, Menu, MenuBar, MenuItem};
pub use shortcut::{KeyCombination, KeyParseError, Modifiers, MnemonicText, StandardKey, parse_mnemonic};
pub use widgets::{Button, ProgressBar, StatusBar};

use crate::series::{SeriesEvent, cancelled_text, done_text};

/// Log target for the window model.
pub const TARGET: &str = "leibniz::window";

/// Text of the Help dialog.
pub const HELP_TEXT: &str =
    "Press Start to start processing.  Press Stop to stop processing.  Press Quit to exit the program.";

/// An informational message box request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpDialog {
    pub title: String,
    pub text: String,
}

impl Default for HelpDialog {
    fn default() -> Self {
        Self {
            title: "Help".to_string(),
            text: HELP_TEXT.to_string(),
        }
    }
}

/// The demo's main window.
///
/// Created behind an `Arc` because its own slots refer back to it.
///
/// # Signals
///
/// - `update_status_bar(String)`: Show a message in the status bar
/// - `start_requested(())` / `stop_requested(())`: Start or Stop was activated
/// - `help_requested(HelpDialog)`: The Help dialog should be shown
/// - `closing(())`: The window is about to close; hooks run synchronously
/// - `closed(())`: The window has closed
pub struct MainWindow {
    title: RwLock<String>,
    pub start_button: Button,
    pub stop_button: Button,
    pub quit_button: Button,
    pub start_action: Arc<Action>,
    pub stop_action: Arc<Action>,
    pub quit_action: Arc<Action>,
    pub help_action: Arc<Action>,
    menu_bar: MenuBar,
    pub status_bar: StatusBar,
    pub progress_bar: ProgressBar,
    pub update_status_bar: Signal<String>,
    pub start_requested: Signal<()>,
    pub stop_requested: Signal<()>,
    pub help_requested: Signal<HelpDialog>,
    pub closing: Signal<()>,
    pub closed: Signal<()>,
    close_started: AtomicBool,
    is_closed: AtomicBool,
}

/// Wrap a window method as a slot holding only a weak reference.
fn slot<Args, F>(window: &Weak<MainWindow>, f: F) -> impl Fn(&Args) + Send + Sync + 'static
where
    Args: 'static,
    F: Fn(&MainWindow, &Args) + Send + Sync + 'static,
{
    let window = window.clone();
    move |args| {
        if let Some(window) = window.upgrade() {
            f(&window, args);
        }
    }
}

impl MainWindow {
    pub fn new(title: impl Into<String>) -> Arc<Self> {
        let title = title.into();
        Arc::new_cyclic(|weak| {
            let start_button = Button::new("Start");
            let stop_button = Button::new("Stop");
            let quit_button = Button::new("Quit");

            let start_action = Arc::new(Action::new("&Start").with_shortcut(KeyCombination::ctrl('s')));
            let stop_action = Arc::new(Action::new("S&top").with_shortcut(KeyCombination::ctrl('t')));
            let quit_action =
                Arc::new(Action::new("&Quit").with_shortcut(StandardKey::Quit.key_combination()));
            let help_action = Arc::new(
                Action::new("&Help").with_shortcut(StandardKey::HelpContents.key_combination()),
            );

            let mut file_menu = Menu::new("&File");
            file_menu.add_action(start_action.clone());
            file_menu.add_action(stop_action.clone());
            file_menu.add_separator();
            file_menu.add_action(quit_action.clone());
            let mut help_menu = Menu::new("&Help");
            help_menu.add_action(help_action.clone());
            let mut menu_bar = MenuBar::new();
            menu_bar.add_menu(file_menu);
            menu_bar.add_menu(help_menu);

            let direct = ConnectionType::Direct;
            for source in [&start_button.clicked, &start_action.triggered] {
                source.connect_with_type(
                    slot(weak, |w: &MainWindow, _: &()| w.start_requested.emit(())),
                    direct,
                );
            }
            for source in [&stop_button.clicked, &stop_action.triggered] {
                source.connect_with_type(
                    slot(weak, |w: &MainWindow, _: &()| w.stop_requested.emit(())),
                    direct,
                );
            }
            for source in [&quit_button.clicked, &quit_action.triggered] {
                source.connect_with_type(
                    slot(weak, |w: &MainWindow, _: &()| {
                        w.close();
                    }),
                    direct,
                );
            }
            help_action.triggered.connect_with_type(
                slot(weak, |w: &MainWindow, _: &()| w.help_requested.emit(HelpDialog::default())),
                direct,
            );

            let start_requested = Signal::<()>::new();
            start_requested.connect_with_type(
                slot(weak, |w: &MainWindow, _: &()| {
                    w.update_status_bar.emit("Start clicked".to_string());
                }),
                direct,
            );
            let stop_requested = Signal::<()>::new();
            stop_requested.connect_with_type(
                slot(weak, |w: &MainWindow, _: &()| {
                    w.update_status_bar.emit("Stop clicked".to_string());
                }),
                direct,
            );
            let update_status_bar = Signal::<String>::new();
            update_status_bar.connect_with_type(
                slot(weak, |w: &MainWindow, message: &String| {
                    w.status_bar.show_message(message.clone());
                }),
                direct,
            );

            MainWindow {
                title: RwLock::new(title),
                start_button,
                stop_button,
                quit_button,
                start_action,
                stop_action,
                quit_action,
                help_action,
                menu_bar,
                status_bar: StatusBar::new(),
                progress_bar: ProgressBar::new(),
                update_status_bar,
                start_requested,
                stop_requested,
                help_requested: Signal::new(),
                closing: Signal::new(),
                closed: Signal::new(),
                close_started: AtomicBool::new(false),
                is_closed: AtomicBool::new(false),
            }
        })
    }

    pub fn title(&self) -> String {
        self.title.read().clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.title.write() = title.into();
    }

    pub fn menu_bar(&self) -> &MenuBar {
        &self.menu_bar
    }

    /// Trigger the action bound to `shortcut`, e.g. `"Ctrl+S"`.
    ///
    /// Returns `false` if the text does not parse or nothing is bound to it.
    pub fn activate_shortcut(&self, shortcut: &str) -> bool {
        let combination = match shortcut.parse::<KeyCombination>() {
            Ok(combination) => combination,
            Err(err) => {
                tracing::debug!(target: TARGET, shortcut, %err, "not a shortcut");
                return false;
            }
        };
        self.activate(&combination)
    }

    /// Trigger the action bound to `combination`.
    pub fn activate(&self, combination: &KeyCombination) -> bool {
        match self.menu_bar.find_shortcut(combination) {
            Some(action) => action.trigger(),
            None => {
                tracing::debug!(target: TARGET, shortcut = %combination, "no action for shortcut");
                false
            }
        }
    }

    /// Reflect one series event in the progress bar and status bar.
    pub fn show_series_event(&self, event: &SeriesEvent) {
        match event {
            SeriesEvent::Progress(step) => {
                self.progress_bar.set_percent(step.percent);
                self.update_status_bar.emit(step.status_text());
            }
            SeriesEvent::Done(value) => {
                self.progress_bar.set_value(100);
                self.update_status_bar.emit(done_text(*value));
            }
            SeriesEvent::Cancelled { completed } => {
                self.update_status_bar.emit(cancelled_text(*completed));
            }
        }
    }

    /// Close the window.
    ///
    /// Emits `closing` and waits for its slots (close hooks such as worker
    /// joins run inside), then marks the window closed and emits `closed`.
    /// Returns `false` if the window was already closing or closed.
    pub fn close(&self) -> bool {
        if self.close_started.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!(target: TARGET, title = %self.title(), "closing window");
        self.closing.emit(());
        self.is_closed.store(true, Ordering::Release);
        self.closed.emit(());
        true
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::Acquire)
    }
}

static_assertions::assert_impl_all!(MainWindow: Send, Sync);
