//! Keyboard shortcuts.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::events::Command;

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key, lowercased; `' '` for space.
    pub key: char,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn plain(key: char) -> Self {
        Self {
            key: key.to_ascii_lowercase(),
            ctrl: false,
            shift: false,
        }
    }

    pub fn ctrl(key: char) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn ctrl_shift(key: char) -> Self {
        Self {
            shift: true,
            ..Self::ctrl(key)
        }
    }
}

impl FromStr for KeyPress {
    type Err = anyhow::Error;

    /// Parses combos such as `space`, `ctrl+e` or `Ctrl+Shift+S`.
    fn from_str(s: &str) -> Result<Self> {
        let mut press = KeyPress::plain(' ');
        let mut key = None;
        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => press.ctrl = true,
                "shift" => press.shift = true,
                "space" => key = Some(' '),
                other => {
                    let mut chars = other.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => key = Some(c),
                        _ => bail!("unrecognized key '{}' in '{}'", part, s),
                    }
                }
            }
        }
        match key {
            Some(key) => {
                press.key = key.to_ascii_lowercase();
                Ok(press)
            }
            None => bail!("no key in '{}'", s),
        }
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.key {
            ' ' => f.write_str("space"),
            key => write!(f, "{}", key),
        }
    }
}

/// Maps a key press to its command.
pub fn command_for(press: KeyPress) -> Option<Command> {
    if !press.ctrl {
        return (press.key == ' ').then_some(Command::TogglePlay);
    }
    match press.key {
        'q' | 'w' | 'c' => Some(Command::Quit),
        'e' => Some(Command::ToggleEffects),
        'd' => Some(Command::ToggleSpectrogram),
        'o' => Some(Command::LoadSettings),
        's' if press.shift => Some(Command::SaveSound),
        's' => Some(Command::SaveSettings),
        _ => None,
    }
}
