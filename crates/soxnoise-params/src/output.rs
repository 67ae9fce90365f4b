//! Output target selection and its SoX token encoding.
//!
//! A selector is either one of the device-class keywords (`pulse`, `alsa`,
//! `wav`, `sox`, `default`), optionally followed by a comma and a
//! device-specific suffix (`alsa,hw:0,1`), or a file path.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A fixed class of SoX output devices/formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// PulseAudio sink.
    Pulse,
    /// ALSA device.
    Alsa,
    /// WAV stream on stdout.
    Wav,
    /// Native SoX stream on stdout.
    Sox,
    /// SoX's default audio device.
    #[default]
    Default,
}

impl DeviceClass {
    /// All classes.
    pub const ALL: [DeviceClass; 5] = [
        DeviceClass::Pulse,
        DeviceClass::Alsa,
        DeviceClass::Wav,
        DeviceClass::Sox,
        DeviceClass::Default,
    ];

    /// Selector keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            DeviceClass::Pulse => "pulse",
            DeviceClass::Alsa => "alsa",
            DeviceClass::Wav => "wav",
            DeviceClass::Sox => "sox",
            DeviceClass::Default => "default",
        }
    }

    /// SoX output tokens for this class without a device suffix.
    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            DeviceClass::Pulse => &["-tpulseaudio"],
            DeviceClass::Alsa => &["-talsa"],
            DeviceClass::Wav => &["-twav", "-"],
            DeviceClass::Sox => &["-tsox", "-"],
            DeviceClass::Default => &["-d"],
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        DeviceClass::ALL
            .into_iter()
            .find(|class| class.keyword() == keyword)
    }
}

/// Where the synthesis process sends its audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum OutputTarget {
    /// A device class, optionally with an explicit device string.
    Device {
        class: DeviceClass,
        device: Option<String>,
    },
    /// An audio file; SoX picks the format from the extension.
    File(PathBuf),
    /// The null sink, used when only the effects chain output matters.
    Null,
}

impl Default for OutputTarget {
    fn default() -> Self {
        OutputTarget::device(DeviceClass::Default)
    }
}

impl OutputTarget {
    /// A device class without a device suffix.
    pub fn device(class: DeviceClass) -> Self {
        OutputTarget::Device {
            class,
            device: None,
        }
    }

    /// A file target.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        OutputTarget::File(path.into())
    }

    /// Parses a selector. Never fails: anything that is not a keyword is a path.
    pub fn parse(selector: &str) -> Self {
        let selector = selector.trim();
        if selector.is_empty() {
            return OutputTarget::default();
        }
        let (keyword, suffix) = match selector.split_once(',') {
            Some((keyword, suffix)) => (keyword, Some(suffix)),
            None => (selector, None),
        };
        match DeviceClass::from_keyword(keyword) {
            Some(class) => OutputTarget::Device {
                class,
                device: suffix.map(str::to_string),
            },
            None => OutputTarget::File(PathBuf::from(selector)),
        }
    }

    /// SoX output tokens. A device suffix replaces whatever follows the type token.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            OutputTarget::Device { class, device } => {
                let tokens = class.tokens();
                match device {
                    Some(device) => vec![tokens[0].to_string(), device.clone()],
                    None => tokens.iter().map(|t| t.to_string()).collect(),
                }
            }
            OutputTarget::File(path) => vec![path.to_string_lossy().into_owned()],
            OutputTarget::Null => vec!["--null".to_string()],
        }
    }

    /// Returns the file path for file targets.
    pub fn as_file(&self) -> Option<&Path> {
        match self {
            OutputTarget::File(path) => Some(path),
            _ => None,
        }
    }

    /// Returns true for file targets.
    pub fn is_file(&self) -> bool {
        matches!(self, OutputTarget::File(_))
    }

    /// Returns true when the audio stream is written to stdout.
    pub fn writes_to_stdout(&self) -> bool {
        self.tokens().last().map(String::as_str) == Some("-")
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Device {
                class,
                device: Some(device),
            } => write!(f, "{},{}", class.keyword(), device),
            OutputTarget::Device { class, device: None } => f.write_str(class.keyword()),
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Null => f.write_str("--null"),
        }
    }
}

impl FromStr for OutputTarget {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(OutputTarget::parse(s))
    }
}

impl From<String> for OutputTarget {
    fn from(value: String) -> Self {
        OutputTarget::parse(&value)
    }
}

impl From<OutputTarget> for String {
    fn from(value: OutputTarget) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keyword_tokens() {
        assert_eq!(OutputTarget::parse("pulse").tokens(), vec!["-tpulseaudio"]);
        assert_eq!(OutputTarget::parse("wav").tokens(), vec!["-twav", "-"]);
        assert_eq!(OutputTarget::parse("default").tokens(), vec!["-d"]);
        assert_eq!(OutputTarget::default().tokens(), vec!["-d"]);
    }

    #[test]
    fn test_device_suffix_replaces_tail() {
        let target = OutputTarget::parse("alsa,hw:0,1");
        assert_eq!(
            target,
            OutputTarget::Device {
                class: DeviceClass::Alsa,
                device: Some("hw:0,1".to_string()),
            }
        );
        assert_eq!(target.tokens(), vec!["-talsa", "hw:0,1"]);
        assert_eq!(target.to_string(), "alsa,hw:0,1");

        let target = OutputTarget::parse("wav,out.wav");
        assert_eq!(target.tokens(), vec!["-twav", "out.wav"]);
        assert!(!target.writes_to_stdout());
    }

    #[test]
    fn test_non_keyword_is_file() {
        let target = OutputTarget::parse("sounds/rain.ogg");
        assert!(target.is_file());
        assert_eq!(target.tokens(), vec!["sounds/rain.ogg"]);
        assert_eq!(target.to_string(), "sounds/rain.ogg");
    }

    #[test]
    fn test_writes_to_stdout() {
        assert!(OutputTarget::parse("wav").writes_to_stdout());
        assert!(OutputTarget::parse("sox").writes_to_stdout());
        assert!(!OutputTarget::parse("pulse").writes_to_stdout());
        assert!(!OutputTarget::Null.writes_to_stdout());
    }
}
