//! Typed front-end commands.
//!
//! The terminal front end reads one command per line. Words (`start`, `s`,
//! `quit`, ...) press the matching button; anything that parses as a chord
//! (`Ctrl+S`, `F1`) goes through the menu bar like a key press would.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::window::{KeyCombination, KeyParseError, MainWindow};

/// Error type for parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("invalid shortcut {text:?}: {source}")]
    Shortcut {
        text: String,
        #[source]
        source: KeyParseError,
    },
}

/// One user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Help,
    Quit,
    /// A key press routed through the menu bar.
    Shortcut(KeyCombination),
}

impl Command {
    /// Apply the command to `window`.
    ///
    /// Returns `false` if nothing reacted, e.g. an unbound shortcut.
    pub fn execute(&self, window: &MainWindow) -> bool {
        match self {
            Command::Start => window.start_button.click(),
            Command::Stop => window.stop_button.click(),
            Command::Help => window.help_action.trigger(),
            Command::Quit => window.quit_button.click(),
            Command::Shortcut(combination) => window.activate(combination),
        }
    }

    /// One-line usage summary for the front end.
    pub fn usage() -> &'static str {
        "commands: start (s), stop (t), help (h, ?), quit (q), or a shortcut such as Ctrl+S"
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CommandParseError::Empty);
        }

        match s.to_lowercase().as_str() {
            "start" | "s" => return Ok(Command::Start),
            "stop" | "t" => return Ok(Command::Stop),
            "help" | "h" | "?" => return Ok(Command::Help),
            "quit" | "q" | "exit" => return Ok(Command::Quit),
            _ => {}
        }

        match s.parse::<KeyCombination>() {
            Ok(combination) if combination.is_chord() => Ok(Command::Shortcut(combination)),
            Ok(_) => Err(CommandParseError::Unknown(s.to_string())),
            Err(source) if s.contains('+') => Err(CommandParseError::Shortcut {
                text: s.to_string(),
                source,
            }),
            Err(_) => Err(CommandParseError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => f.write_str("start"),
            Command::Stop => f.write_str("stop"),
            Command::Help => f.write_str("help"),
            Command::Quit => f.write_str("quit"),
            Command::Shortcut(combination) => write!(f, "{combination}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leibniz_core::ConnectionType;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_parse_words() {
        assert_eq!("start".parse::<Command>(), Ok(Command::Start));
        assert_eq!(" S ".parse::<Command>(), Ok(Command::Start));
        assert_eq!("t".parse::<Command>(), Ok(Command::Stop));
        assert_eq!("?".parse::<Command>(), Ok(Command::Help));
        assert_eq!("EXIT".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_shortcuts() {
        assert_eq!(
            "ctrl+s".parse::<Command>(),
            Ok(Command::Shortcut(KeyCombination::ctrl('s')))
        );
        assert!(matches!("F1".parse::<Command>(), Ok(Command::Shortcut(_))));
        assert_eq!("Ctrl+S".parse::<Command>().unwrap().to_string(), "Ctrl+S");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandParseError::Empty));
        assert_eq!(
            "x".parse::<Command>(),
            Err(CommandParseError::Unknown("x".to_string()))
        );
        assert_eq!(
            "go now".parse::<Command>(),
            Err(CommandParseError::Unknown("go now".to_string()))
        );
        assert!(matches!(
            "Ctrl+".parse::<Command>(),
            Err(CommandParseError::Shortcut { .. })
        ));
    }

    #[test]
    fn test_execute() {
        let window = MainWindow::new("test");
        let helps = Arc::new(Mutex::new(0));
        let helps_clone = helps.clone();
        window
            .help_requested
            .connect_with_type(move |_| *helps_clone.lock() += 1, ConnectionType::Direct);

        assert!(Command::Start.execute(&window));
        assert_eq!(window.status_bar.current_message(), "Start clicked");
        assert!("Ctrl+T".parse::<Command>().unwrap().execute(&window));
        assert_eq!(window.status_bar.current_message(), "Stop clicked");
        assert!(Command::Help.execute(&window));
        assert_eq!(*helps.lock(), 1);
        assert!(!"Ctrl+Z".parse::<Command>().unwrap().execute(&window));

        assert!(Command::Quit.execute(&window));
        assert!(window.is_closed());
    }
}
