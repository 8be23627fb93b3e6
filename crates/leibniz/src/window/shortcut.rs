//! Keyboard shortcuts and mnemonics.
//!
//! Shortcuts are written the usual way (`"Ctrl+S"`, `"Ctrl+Shift+F1"`) and
//! compared after normalization, so `"ctrl+s"` and `"Control + S"` match the
//! same action.
//!
//! Mnemonics are marked with `&` in action and menu text: `"&File"` has the
//! mnemonic `f`, and `"&&"` is a literal ampersand.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error type for parsing key combinations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    /// The string is empty.
    #[error("empty key sequence")]
    Empty,
    /// No key was specified (only modifiers).
    #[error("no key specified (only modifiers)")]
    NoKey,
    /// More than one non-modifier key.
    #[error("more than one key in combination: {0}")]
    MultipleKeys(String),
    /// Unknown key name.
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

/// Modifier keys held with a combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// One key plus modifiers, e.g. `Ctrl+S`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombination {
    modifiers: Modifiers,
    /// Canonical key name: an uppercase letter, a digit, `F1`..`F24`, or a
    /// named key such as `Esc`.
    key: String,
}

impl KeyCombination {
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `Ctrl+<key>`.
    pub fn ctrl(key: char) -> Self {
        Self {
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
            key: key.to_ascii_uppercase().to_string(),
        }
    }

    /// Whether this looks like a chord rather than a typed word: it has a
    /// modifier or is a function key.
    pub fn is_chord(&self) -> bool {
        !self.modifiers.is_empty() || is_function_key(&self.key)
    }
}

impl fmt::Display for KeyCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [(m.ctrl, "Ctrl"), (m.alt, "Alt"), (m.shift, "Shift"), (m.meta, "Meta")] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        f.write_str(&self.key)
    }
}

impl FromStr for KeyCombination {
    type Err = KeyParseError;

    /// Parse `"Ctrl+S"`-style text. Modifier names and keys are case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut modifiers = Modifiers::NONE;
        let mut key: Option<String> = None;

        for part in s.split('+').map(str::trim) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" | "command" | "super" | "win" => modifiers.meta = true,
                _ => {
                    if key.is_some() {
                        return Err(KeyParseError::MultipleKeys(s.to_string()));
                    }
                    key = Some(parse_key(part)?);
                }
            }
        }

        match key {
            Some(key) => Ok(Self { modifiers, key }),
            None => Err(KeyParseError::NoKey),
        }
    }
}

fn is_function_key(key: &str) -> bool {
    key.strip_prefix('F')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| (1..=24).contains(&n))
}

/// Canonical name of a single key.
fn parse_key(s: &str) -> Result<String, KeyParseError> {
    let mut chars = s.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphanumeric() {
            return Ok(ch.to_ascii_uppercase().to_string());
        }
        return Err(KeyParseError::UnknownKey(s.to_string()));
    }

    let upper = s.to_ascii_uppercase();
    if is_function_key(&upper) {
        return Ok(upper);
    }

    let named = match s.to_lowercase().as_str() {
        "esc" | "escape" => "Esc",
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "space" => "Space",
        "backspace" => "Backspace",
        "del" | "delete" => "Del",
        "ins" | "insert" => "Ins",
        "home" => "Home",
        "end" => "End",
        "pgup" | "pageup" => "PgUp",
        "pgdown" | "pagedown" => "PgDown",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        _ => return Err(KeyParseError::UnknownKey(s.to_string())),
    };
    Ok(named.to_string())
}

/// Platform-standard shortcuts used by the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardKey {
    Quit,
    HelpContents,
}

impl StandardKey {
    pub fn key_combination(self) -> KeyCombination {
        match self {
            StandardKey::Quit => KeyCombination::ctrl('q'),
            StandardKey::HelpContents => KeyCombination {
                modifiers: Modifiers::NONE,
                key: "F1".to_string(),
            },
        }
    }
}

/// Text with its `&` markers resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnemonicText {
    /// Text as displayed, without the markers.
    pub display_text: String,
    /// The mnemonic character, lowercased.
    pub mnemonic: Option<char>,
    /// Byte index of the mnemonic character in `display_text`.
    pub mnemonic_index: Option<usize>,
}

/// Parse `&` mnemonic markers.
///
/// - `"&File"` displays `File` with mnemonic `f`
/// - `"S&top"` displays `Stop` with mnemonic `t`
/// - `"Fish && Chips"` displays `Fish & Chips` with no mnemonic
///
/// Only the first marker counts; a lone trailing `&` is kept as text.
pub fn parse_mnemonic(text: &str) -> MnemonicText {
    let mut display_text = String::with_capacity(text.len());
    let mut mnemonic: Option<char> = None;
    let mut mnemonic_index: Option<usize> = None;

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            display_text.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('&') => {
                display_text.push('&');
                chars.next();
            }
            Some(next) if next.is_alphanumeric() => {
                if mnemonic.is_none() {
                    mnemonic = Some(next.to_ascii_lowercase());
                    mnemonic_index = Some(display_text.len());
                }
                display_text.push(next);
                chars.next();
            }
            _ => display_text.push(ch),
        }
    }

    MnemonicText {
        display_text,
        mnemonic,
        mnemonic_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_normalize() {
        let combo: KeyCombination = "ctrl+s".parse().unwrap();
        assert_eq!(combo, KeyCombination::ctrl('S'));
        assert_eq!(combo.to_string(), "Ctrl+S");

        let combo: KeyCombination = " Shift + Control + f1 ".parse().unwrap();
        assert_eq!(combo.to_string(), "Ctrl+Shift+F1");
        assert!(combo.is_chord());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeyCombination>(), Err(KeyParseError::Empty));
        assert_eq!("Ctrl+Alt".parse::<KeyCombination>(), Err(KeyParseError::NoKey));
        assert!(matches!(
            "Ctrl+S+T".parse::<KeyCombination>(),
            Err(KeyParseError::MultipleKeys(_))
        ));
        assert!(matches!(
            "Ctrl+Banana".parse::<KeyCombination>(),
            Err(KeyParseError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_plain_letter_is_not_a_chord() {
        let combo: KeyCombination = "s".parse().unwrap();
        assert!(!combo.is_chord());
        let f1: KeyCombination = "F1".parse().unwrap();
        assert!(f1.is_chord());
    }

    #[test]
    fn test_standard_keys() {
        assert_eq!(StandardKey::Quit.key_combination().to_string(), "Ctrl+Q");
        assert_eq!(StandardKey::HelpContents.key_combination().to_string(), "F1");
    }

    #[test]
    fn test_parse_mnemonic() {
        let file = parse_mnemonic("&File");
        assert_eq!(file.display_text, "File");
        assert_eq!(file.mnemonic, Some('f'));
        assert_eq!(file.mnemonic_index, Some(0));

        let stop = parse_mnemonic("S&top");
        assert_eq!(stop.display_text, "Stop");
        assert_eq!(stop.mnemonic, Some('t'));
        assert_eq!(stop.mnemonic_index, Some(1));
    }

    #[test]
    fn test_parse_mnemonic_literal_ampersand() {
        let text = parse_mnemonic("Fish && Chips");
        assert_eq!(text.display_text, "Fish & Chips");
        assert_eq!(text.mnemonic, None);

        let trailing = parse_mnemonic("Save &");
        assert_eq!(trailing.display_text, "Save &");
        assert_eq!(trailing.mnemonic, None);
    }

    #[test]
    fn test_first_mnemonic_wins() {
        let text = parse_mnemonic("&Open &Recent");
        assert_eq!(text.display_text, "Open Recent");
        assert_eq!(text.mnemonic, Some('o'));
    }
}
