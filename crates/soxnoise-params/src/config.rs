//! Settings document codec.
//!
//! The document is a single-section INI file:
//!
//! ```text
//! [sox-noise]
//! noise = pink
//! reverb = 40
//! extras = highpass 80
//! ```
//!
//! Saving is sparse: only values that differ from the defaults are written.
//! Loading never touches a [`ParameterSet`]; it yields a
//! [`SettingsOverrides`] to be merged over whatever base the caller holds.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult, ParamError};
use crate::field::{format_number, parse_number, NumericField};
use crate::noise::NoiseColor;
use crate::output::OutputTarget;
use crate::overrides::SettingsOverrides;
use crate::params::{ParameterSet, SessionFlags};

/// Section name written by [`ConfigDocument::render`].
pub const SECTION: &str = "sox-noise";

/// File extension for settings documents.
pub const EXTENSION: &str = "sxn";

/// Parsed key-value pairs of the first section of a settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    section: String,
    entries: Vec<(String, String)>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDocument {
    /// An empty document with the standard section.
    pub fn new() -> Self {
        Self {
            section: SECTION.to_string(),
            entries: Vec::new(),
        }
    }

    /// Section name.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Entries in document order. Keys are normalized (lowercase, `_`).
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Looks up a value by key; `-` and `_` are interchangeable.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = normalize_key(key);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Inserts or replaces a value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = normalize_key(key);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Parses document text. Only the first section is kept.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut section: Option<String> = None;
        let mut entries = Vec::new();
        let mut in_first = false;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                in_first = section.is_none();
                if in_first {
                    section = Some(name.trim().to_string());
                }
                continue;
            }
            let Some((key, value)) = line.split_once(['=', ':']) else {
                return Err(ConfigError::Syntax {
                    line: index + 1,
                    content: raw.to_string(),
                });
            };
            if section.is_none() {
                return Err(ConfigError::MissingSection);
            }
            if in_first {
                let key = normalize_key(key);
                let value = value.trim().to_string();
                match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = value,
                    None => entries.push((key, value)),
                }
            }
        }

        let section = section.ok_or(ConfigError::MissingSection)?;
        Ok(Self { section, entries })
    }

    /// Renders the document in INI form.
    pub fn render(&self) -> String {
        let mut out = format!("[{}]\n", self.section);
        for (key, value) in &self.entries {
            out.push_str(&format!("{} = {}\n", key, value));
        }
        out
    }

    /// Projects a parameter set and session flags onto a sparse document,
    /// keeping only values that differ from `defaults`.
    pub fn from_settings(
        params: &ParameterSet,
        flags: &SessionFlags,
        defaults: &ParameterSet,
    ) -> Self {
        let default_flags = SessionFlags::default();
        let mut doc = Self::new();

        if params.playing() != defaults.playing() {
            doc.set("play", format_bool(params.playing()));
        }
        if params.noise() != defaults.noise() {
            doc.set("noise", params.noise().as_str());
        }
        for field in [
            NumericField::Volume,
            NumericField::BandCenter,
            NumericField::BandWidth,
            NumericField::Reverb,
            NumericField::TremoloSpeed,
            NumericField::TremoloDepth,
        ] {
            write_numeric(&mut doc, params, defaults, field);
        }
        if flags.effects_expanded != default_flags.effects_expanded {
            doc.set("effects", format_bool(flags.effects_expanded));
        }
        if params.show_visualization() != defaults.show_visualization() {
            doc.set("spectrogram", format_bool(params.show_visualization()));
        }
        if params.output() != defaults.output() {
            doc.set("output", params.output().to_string());
        }
        write_numeric(&mut doc, params, defaults, NumericField::Duration);
        write_numeric(&mut doc, params, defaults, NumericField::Fade);
        if flags.tray != default_flags.tray {
            doc.set("tray", format_bool(flags.tray));
        }
        if flags.hidden_on_start != default_flags.hidden_on_start {
            doc.set("hide", format_bool(flags.hidden_on_start));
        }
        if params.extras() != defaults.extras() && !params.extras().is_empty() {
            doc.set("extras", params.extras().join(" "));
        }
        doc
    }

    /// Interprets the document as an overlay.
    ///
    /// Unknown keys are skipped with a warning; malformed values for known
    /// keys fail the whole document.
    pub fn to_overrides(&self) -> ConfigResult<SettingsOverrides> {
        let mut overrides = SettingsOverrides::default();

        for (key, value) in &self.entries {
            let invalid = |source: ParamError| ConfigError::InvalidValue {
                key: key.clone(),
                source,
            };
            match key.as_str() {
                "noise" => overrides.noise = Some(value.parse::<NoiseColor>().map_err(invalid)?),
                "extras" => {
                    overrides.extras =
                        Some(value.split_whitespace().map(str::to_string).collect())
                }
                "output" => overrides.output = Some(OutputTarget::parse(value)),
                "play" => overrides.play = Some(parse_bool(value).map_err(invalid)?),
                "spectrogram" => overrides.spectrogram = Some(parse_bool(value).map_err(invalid)?),
                "effects" => overrides.effects = Some(parse_bool(value).map_err(invalid)?),
                "tray" => overrides.tray = Some(parse_bool(value).map_err(invalid)?),
                "hide" => overrides.hide = Some(parse_bool(value).map_err(invalid)?),
                other => match other.parse::<NumericField>() {
                    Ok(field) => {
                        let number = parse_number(value).map_err(invalid)?;
                        overrides.set_numeric(field, number);
                    }
                    Err(_) => warn!(key = other, "ignoring unknown settings key"),
                },
            }
        }
        Ok(overrides)
    }
}

fn write_numeric(
    doc: &mut ConfigDocument,
    params: &ParameterSet,
    defaults: &ParameterSet,
    field: NumericField,
) {
    let value = params.get(field);
    if value != defaults.get(field) {
        doc.set(field.key(), format_number(value));
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Parses the boolean spellings accepted in settings documents.
pub fn parse_bool(value: &str) -> Result<bool, ParamError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ParamError::InvalidBool {
            value: value.to_string(),
        }),
    }
}

/// Writes the sparse projection of `params` and `flags` to `path`.
pub fn save(params: &ParameterSet, flags: &SessionFlags, path: &Path) -> ConfigResult<()> {
    let doc = ConfigDocument::from_settings(params, flags, &ParameterSet::default());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, doc.render()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), keys = doc.entries().len(), "saved settings");
    Ok(())
}

/// Reads `path` and returns its overlay.
pub fn load(path: &Path) -> ConfigResult<SettingsOverrides> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ConfigDocument::parse(&text)?.to_overrides()
}

/// Writes a document holding only the section header, if `path` is missing.
///
/// Returns true when a file was created.
pub fn ensure_exists(path: &Path) -> ConfigResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, ConfigDocument::new().render()).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
