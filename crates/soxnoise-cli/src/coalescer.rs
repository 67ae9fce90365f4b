//! Turns the event stream into process directives.
//!
//! [`UpdateCoalescer`] owns the live [`ParameterSet`] and a set of dirty
//! flags. Field changes only update the set; a commit turns everything
//! pending into at most one synthesis replacement, one spectrogram refresh
//! and one render. The coalescer never touches processes itself, which
//! keeps it testable without SoX.

use std::path::PathBuf;

use soxnoise_params::{
    CommandBuilder, NoiseColor, NumericField, ParameterSet, SessionFlags, SpectrogramDest,
    SpectrogramOptions,
};

use crate::events::{Command, DiscreteAction, Event, FilePurpose};

/// An effect the controller must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Stop the running synthesis (if any) and start this one.
    ReplaceSynthesis(Vec<String>),
    StopSynthesis,
    /// Stop any pending spectrogram and start this one.
    RefreshSpectrogram(Vec<String>),
    HideSpectrogram,
    /// Render the sound into `path` and wait for it.
    Render { path: PathBuf, argv: Vec<String> },
    EffectsPanel(bool),
    /// Ask the front end for a file.
    ChooseFile(FilePurpose),
    SaveSettings(PathBuf),
    LoadSettings(PathBuf),
    Warn(String),
    Quit,
}

/// Work accumulated since the last commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    pub synthesis: bool,
    pub spectrum: bool,
    pub render: bool,
}

impl Dirty {
    fn any(&self) -> bool {
        self.synthesis || self.spectrum || self.render
    }
}

/// Coalesces parameter edits into process directives.
#[derive(Debug, Clone)]
pub struct UpdateCoalescer {
    params: ParameterSet,
    flags: SessionFlags,
    builder: CommandBuilder,
    spectrogram: SpectrogramOptions,
    spectrogram_dest: SpectrogramDest,
    render_path: Option<PathBuf>,
    dirty: Dirty,
}

impl UpdateCoalescer {
    pub fn new(params: ParameterSet, flags: SessionFlags, builder: CommandBuilder) -> Self {
        Self {
            params,
            flags,
            builder,
            spectrogram: SpectrogramOptions::default(),
            spectrogram_dest: SpectrogramDest::Pipe,
            render_path: None,
            dirty: Dirty::default(),
        }
    }

    /// Sets the spectrogram geometry and destination.
    pub fn with_spectrogram(mut self, options: SpectrogramOptions, dest: SpectrogramDest) -> Self {
        self.spectrogram = options;
        self.spectrogram_dest = dest;
        self
    }

    /// Re-renders the sound into `path` on every commit.
    pub fn with_render_path(mut self, path: Option<PathBuf>) -> Self {
        self.render_path = path;
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn flags(&self) -> &SessionFlags {
        &self.flags
    }

    pub fn builder(&self) -> &CommandBuilder {
        &self.builder
    }

    pub fn dirty(&self) -> Dirty {
        self.dirty
    }

    pub fn render_path(&self) -> Option<&PathBuf> {
        self.render_path.as_ref()
    }

    /// Records that playback stopped without a directive (spawn failure or
    /// the process ending on its own). Returns whether the flag changed.
    pub fn playback_stopped(&mut self) -> bool {
        let was = self.params.playing();
        self.params.set_playing(false);
        was
    }

    /// Directives that bring the processes in line with the initial state.
    pub fn startup(&mut self) -> Vec<Directive> {
        let mut out = Vec::new();
        if self.flags.effects_expanded {
            out.push(Directive::EffectsPanel(true));
        }
        out.extend(self.apply_now());
        out
    }

    /// Handles one event.
    pub fn dispatch(&mut self, event: Event) -> Vec<Directive> {
        match event {
            Event::FieldChanged(field, value) => self.change_field(field, value),
            Event::Commit => self.commit(),
            Event::Discrete(DiscreteAction::SetNoise(noise)) => self.set_noise(noise),
            Event::Discrete(DiscreteAction::TogglePlay) | Event::Command(Command::TogglePlay) => {
                self.toggle_play()
            }
            Event::Discrete(DiscreteAction::ToggleSpectrogram)
            | Event::Command(Command::ToggleSpectrogram) => self.toggle_spectrogram(),
            Event::Command(Command::ToggleEffects) => {
                self.flags.effects_expanded = !self.flags.effects_expanded;
                vec![Directive::EffectsPanel(self.flags.effects_expanded)]
            }
            Event::Command(Command::LoadSettings) => {
                vec![Directive::ChooseFile(FilePurpose::LoadSettings)]
            }
            Event::Command(Command::SaveSettings) => {
                vec![Directive::ChooseFile(FilePurpose::SaveSettings)]
            }
            Event::Command(Command::SaveSound) => vec![Directive::ChooseFile(FilePurpose::SaveSound)],
            Event::Command(Command::Reset) => self.replace_sound(&ParameterSet::default()),
            Event::Command(Command::Quit) => vec![Directive::Quit],
            Event::FileChosen { purpose, path } => match purpose {
                FilePurpose::LoadSettings => vec![Directive::LoadSettings(path)],
                FilePurpose::SaveSettings => vec![Directive::SaveSettings(path)],
                FilePurpose::SaveSound => {
                    let argv = self.builder.render(&self.params, &path);
                    vec![Directive::Render { path, argv }]
                }
            },
        }
    }

    /// Takes over the sound fields of `sound` and applies them at once.
    /// Playback state, spectrogram visibility and the output stay as they are.
    pub fn replace_sound(&mut self, sound: &ParameterSet) -> Vec<Directive> {
        self.params.adopt_sound(sound);
        self.apply_now()
    }

    fn change_field(&mut self, field: NumericField, value: f64) -> Vec<Directive> {
        let before = self.params.get(field);
        let warning = self.params.set(field, value);
        if self.params.get(field) != before {
            self.dirty.synthesis = true;
            self.dirty.render = true;
            self.dirty.spectrum |= field.affects_spectrum();
        }
        warning
            .map(|w| Directive::Warn(w.to_string()))
            .into_iter()
            .collect()
    }

    fn commit(&mut self) -> Vec<Directive> {
        if !self.dirty.any() {
            return Vec::new();
        }
        let mut out = Vec::new();
        if self.dirty.synthesis && self.params.playing() {
            out.push(Directive::ReplaceSynthesis(self.builder.playback(&self.params)));
            self.dirty.synthesis = false;
        }
        if self.dirty.spectrum {
            if self.params.show_visualization() {
                out.push(self.spectrogram_directive());
            }
            self.dirty.spectrum = false;
        }
        if self.dirty.render {
            out.extend(self.render_directive());
            self.dirty.render = false;
        }
        out
    }

    fn set_noise(&mut self, noise: NoiseColor) -> Vec<Directive> {
        if self.params.noise() == noise {
            return Vec::new();
        }
        self.params.set_noise(noise);
        self.apply_now()
    }

    fn toggle_play(&mut self) -> Vec<Directive> {
        let playing = !self.params.playing();
        self.params.set_playing(playing);
        if playing {
            self.dirty.synthesis = false;
            vec![Directive::ReplaceSynthesis(self.builder.playback(&self.params))]
        } else {
            vec![Directive::StopSynthesis]
        }
    }

    fn toggle_spectrogram(&mut self) -> Vec<Directive> {
        let show = !self.params.show_visualization();
        self.params.set_show_visualization(show);
        if show {
            self.dirty.spectrum = false;
            vec![self.spectrogram_directive()]
        } else {
            vec![Directive::HideSpectrogram]
        }
    }

    /// Applies the whole current state, clearing every dirty flag.
    fn apply_now(&mut self) -> Vec<Directive> {
        let mut out = Vec::new();
        if self.params.playing() {
            out.push(Directive::ReplaceSynthesis(self.builder.playback(&self.params)));
        }
        if self.params.show_visualization() {
            out.push(self.spectrogram_directive());
        }
        out.extend(self.render_directive());
        self.dirty = Dirty::default();
        out
    }

    fn spectrogram_directive(&self) -> Directive {
        Directive::RefreshSpectrogram(self.builder.spectrogram(
            &self.params,
            &self.spectrogram,
            &self.spectrogram_dest,
        ))
    }

    fn render_directive(&self) -> Option<Directive> {
        self.render_path.as_ref().map(|path| Directive::Render {
            path: path.clone(),
            argv: self.builder.render(&self.params, path),
        })
    }
}
