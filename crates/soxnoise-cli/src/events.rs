//! The abstract event stream consumed from the front end.
//!
//! Gesture mapping:
//!
//! | gesture | event |
//! |---------|-------|
//! | slider drag motion, scroll step, spin-button typing | [`Event::FieldChanged`] |
//! | drag end, scroll end, key release on a slider | [`Event::Commit`] |
//! | noise color button, play button, spectrogram button | [`Event::Discrete`] |
//! | keyboard shortcuts, menu items | [`Event::Command`] |
//! | file chooser accepted | [`Event::FileChosen`] |
//!
//! Value changes never restart anything on their own; a commit applies
//! whatever accumulated since the previous one. Discrete actions apply
//! immediately.

use std::path::PathBuf;

use soxnoise_params::{NoiseColor, NumericField};

/// A front-end event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A continuous control moved.
    FieldChanged(NumericField, f64),
    /// The current gesture ended; apply pending changes.
    Commit,
    /// A button press that applies at once.
    Discrete(DiscreteAction),
    /// A window-level command.
    Command(Command),
    /// The user picked a file for an earlier [`FileRequest`].
    FileChosen { purpose: FilePurpose, path: PathBuf },
}

/// Buttons that update and apply in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscreteAction {
    SetNoise(NoiseColor),
    TogglePlay,
    ToggleSpectrogram,
}

/// Window-level commands, usually bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    TogglePlay,
    ToggleEffects,
    ToggleSpectrogram,
    LoadSettings,
    SaveSettings,
    SaveSound,
    Reset,
    Quit,
}

/// What a chosen file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilePurpose {
    LoadSettings,
    SaveSettings,
    SaveSound,
}

impl FilePurpose {
    /// Dialog title.
    pub fn title(&self) -> &'static str {
        match self {
            FilePurpose::LoadSettings => "Load Settings",
            FilePurpose::SaveSettings => "Save Settings",
            FilePurpose::SaveSound => "Save Sound",
        }
    }

    /// Whether the chooser is in save mode.
    pub fn is_save(&self) -> bool {
        !matches!(self, FilePurpose::LoadSettings)
    }

    /// File filter offered by the chooser.
    pub fn filter(&self) -> FileFilter {
        match self {
            FilePurpose::LoadSettings | FilePurpose::SaveSettings => FileFilter::Settings,
            FilePurpose::SaveSound => FileFilter::Audio,
        }
    }
}

/// Filter context for file choosers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    /// `*.sxn` settings documents.
    Settings,
    /// `audio/*` files.
    Audio,
}

impl FileFilter {
    /// Filter display name.
    pub fn name(&self) -> &'static str {
        match self {
            FileFilter::Settings => "Config files",
            FileFilter::Audio => "Audio files",
        }
    }

    /// Glob pattern or mime type.
    pub fn pattern(&self) -> &'static str {
        match self {
            FileFilter::Settings => "*.sxn",
            FileFilter::Audio => "audio/*",
        }
    }
}

/// A request for the front end to show a file chooser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub purpose: FilePurpose,
    /// Pre-filled path.
    pub suggested: PathBuf,
    pub filter: FileFilter,
}
