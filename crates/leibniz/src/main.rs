//! Terminal front end for the Leibniz demo.
//!
//! The window is rendered as lines on stdout. Commands are read from stdin,
//! one per line; end of input quits. Logs go to stderr.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::{Arc, Weak};
use std::thread;

use clap::Parser;
use leibniz::cli::Cli;
use leibniz::{Command, Result, driver, window::MainWindow};
use leibniz_core::{ConnectionType, EventLoop, LoopProxy};
use tracing_subscriber::EnvFilter;

/// Exit code for configuration and startup errors.
const EXIT_STARTUP_ERROR: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            eprintln!("leibniz: {err}");
            ExitCode::from(EXIT_STARTUP_ERROR)
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = cli.load_config()?;
    tracing::info!(
        variant = %config.variant,
        iterations = config.iterations,
        step_delay_ms = config.step_delay_ms,
        "starting"
    );

    let event_loop = EventLoop::with_name("ui");
    let ui = event_loop.proxy();
    let window = MainWindow::new(config.title.clone());
    render_to_stdout(&window);

    let quit = ui.clone();
    window.closed.connect_with_type(
        move |_| {
            if quit.quit().is_err() {
                tracing::debug!("ui loop already gone");
            }
        },
        ConnectionType::Direct,
    );

    let driver = driver::create(&config, &window, &ui)?;
    driver::install(&window, driver, config.iterations);

    println!("{}", window.title());
    println!("{}", Command::usage());
    spawn_input_reader(ui, Arc::downgrade(&window))?;

    let code = event_loop.run();
    window.close();
    Ok(code)
}

/// Print status bar, progress bar and Help dialog changes.
fn render_to_stdout(window: &Arc<MainWindow>) {
    let direct = ConnectionType::Direct;
    window
        .status_bar
        .message_changed
        .connect_with_type(|message| println!("status: {message}"), direct);
    window
        .progress_bar
        .value_changed
        .connect_with_type(|value| println!("progress: {value}%"), direct);
    window.help_requested.connect_with_type(
        |dialog| println!("[{}] {}", dialog.title, dialog.text),
        direct,
    );
}

/// Read commands on a background thread and run them on the UI loop.
fn spawn_input_reader(ui: LoopProxy, window: Weak<MainWindow>) -> io::Result<()> {
    thread::Builder::new()
        .name("leibniz-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!(%err, "stdin read failed");
                        break;
                    }
                };
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(err) => {
                        eprintln!("{err}; {}", Command::usage());
                        continue;
                    }
                };

                let target = window.clone();
                let posted = ui.post_task(move || {
                    if let Some(window) = target.upgrade()
                        && !command.execute(&window)
                    {
                        tracing::info!(%command, "command had no effect");
                    }
                });
                if posted.is_err() {
                    return;
                }
            }

            let target = window.clone();
            let closed = ui.post_task(move || {
                if let Some(window) = target.upgrade() {
                    window.close();
                }
            });
            if closed.is_err() {
                tracing::debug!("ui loop already gone at end of input");
            }
        })?;
    Ok(())
}
