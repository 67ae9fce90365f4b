//! Line protocol for driving a headless session from stdin.
//!
//! ```text
//! set <field> <value>     change a numeric field (not applied yet)
//! commit                  apply pending changes
//! noise <color>           switch noise color
//! play | spectrogram      toggle playback / spectrogram
//! effects                 toggle the effects panel
//! load [path]             load settings (chooser when no path)
//! save [path]             save settings
//! render [path]           save the sound to a file
//! reset                   restore default sound settings
//! key <combo>             press a shortcut, e.g. `key ctrl+shift+s`
//! status                  print the current state as JSON
//! quit
//! ```

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, Context, Result};
use soxnoise_params::field::parse_number;
use soxnoise_params::{NoiseColor, NumericField};
use tracing::warn;

use crate::events::{Command, DiscreteAction, Event, FilePurpose};
use crate::keymap::{self, KeyPress};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Event(Event),
    /// Print the current state.
    Status,
}

impl From<Event> for Request {
    fn from(event: Event) -> Self {
        Request::Event(event)
    }
}

/// Parses one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Request>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let request = match verb.to_ascii_lowercase().as_str() {
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("usage: set <field> <value>"))?;
            let field: NumericField = field.parse()?;
            let value = parse_number(value.trim())?;
            Event::FieldChanged(field, value).into()
        }
        "commit" => Event::Commit.into(),
        "noise" => {
            let noise: NoiseColor = rest.parse().context("usage: noise <color>")?;
            Event::Discrete(DiscreteAction::SetNoise(noise)).into()
        }
        "play" => Event::Discrete(DiscreteAction::TogglePlay).into(),
        "spectrogram" => Event::Discrete(DiscreteAction::ToggleSpectrogram).into(),
        "effects" => Event::Command(Command::ToggleEffects).into(),
        "load" => file_request(FilePurpose::LoadSettings, Command::LoadSettings, rest),
        "save" => file_request(FilePurpose::SaveSettings, Command::SaveSettings, rest),
        "render" => file_request(FilePurpose::SaveSound, Command::SaveSound, rest),
        "reset" => Event::Command(Command::Reset).into(),
        "key" => {
            let press: KeyPress = rest.parse()?;
            let command =
                keymap::command_for(press).ok_or_else(|| anyhow!("no binding for {}", press))?;
            Event::Command(command).into()
        }
        "status" => Request::Status,
        "quit" | "exit" => Event::Command(Command::Quit).into(),
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(request))
}

fn file_request(purpose: FilePurpose, command: Command, rest: &str) -> Request {
    if rest.is_empty() {
        Event::Command(command).into()
    } else {
        Event::FileChosen {
            purpose,
            path: PathBuf::from(rest),
        }
        .into()
    }
}

/// Reads stdin on a background thread. End of input sends `quit`.
pub fn spawn_reader(tx: Sender<Request>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("stdin: {}", e);
                    break;
                }
            };
            match parse_line(&line) {
                Ok(Some(request)) => {
                    if tx.send(request).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("{:#}", e),
            }
        }
        let _ = tx.send(Event::Command(Command::Quit).into());
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(line: &str) -> Event {
        match parse_line(line).unwrap() {
            Some(Request::Event(event)) => event,
            other => panic!("expected event for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_set_and_commit() {
        assert_eq!(
            event("set band-center 600"),
            Event::FieldChanged(NumericField::BandCenter, 600.0)
        );
        assert_eq!(
            event("  set tremolo_depth 12.5 "),
            Event::FieldChanged(NumericField::TremoloDepth, 12.5)
        );
        assert_eq!(event("commit"), Event::Commit);
    }

    #[test]
    fn test_paths_keep_spaces() {
        assert_eq!(
            event("save /tmp/my settings.sxn"),
            Event::FileChosen {
                purpose: FilePurpose::SaveSettings,
                path: PathBuf::from("/tmp/my settings.sxn"),
            }
        );
        assert_eq!(event("render"), Event::Command(Command::SaveSound));
    }

    #[test]
    fn test_keys_and_status() {
        assert_eq!(event("key ctrl+shift+s"), Event::Command(Command::SaveSound));
        assert_eq!(event("key space"), Event::Command(Command::TogglePlay));
        assert_eq!(parse_line("status").unwrap(), Some(Request::Status));
        assert_eq!(parse_line("# note").unwrap(), None);
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_errors() {
        assert!(parse_line("set volume").is_err());
        assert!(parse_line("set loudness 3").is_err());
        assert!(parse_line("set volume loud").is_err());
        assert!(parse_line("noise green").is_err());
        assert!(parse_line("key ctrl+x").is_err());
        assert!(parse_line("dance").is_err());
    }
}
