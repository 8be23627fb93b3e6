//! Leibniz - a responsive-worker demo on a headless signal/slot core.
//!
//! A slowly converging series (`pi = 4 * sum((-1)^i / (2i + 1))`) is computed
//! one paced term at a time while a main window stays responsive. The same
//! computation is wired to the window three ways; see [`driver`].
//!
//! # Example
//!
//! ```
//! use leibniz::driver::{self, BlockingDriver};
//! use leibniz::window::MainWindow;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let window = MainWindow::new("2: MainWindow");
//! let driver = Arc::new(BlockingDriver::new(&window, Duration::ZERO));
//! driver::install(&window, driver, 5);
//!
//! window.start_button.click();
//! assert_eq!(window.progress_bar.value(), 100);
//! assert!(window.status_bar.current_message().starts_with("pi=3.33"));
//! ```

pub mod cli;
pub mod command;
pub mod config;
pub mod driver;
mod error;
pub mod message;
pub mod series;
pub mod window;

pub use command::{Command, CommandParseError};
pub use config::{Config, Variant};
pub use driver::Driver;
pub use error::{ConfigError, Error, Result};
pub use series::{Outcome, Series, SeriesEvent, SeriesRun, SeriesStep, gregory_leibniz};
pub use window::MainWindow;
