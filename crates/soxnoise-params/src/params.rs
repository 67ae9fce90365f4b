//! The typed, bounded parameter set.

use serde::{Deserialize, Serialize};

use crate::error::{OutOfRange, ParamError, ParamResult};
use crate::field::NumericField;
use crate::noise::NoiseColor;
use crate::output::OutputTarget;

/// Default loop length in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 60;

/// Default fade at each loop edge in seconds.
pub const DEFAULT_FADE_SECS: f64 = 0.005;

/// Every tunable value of a noise session.
///
/// Numeric fields are private so that they always stay within
/// [`NumericField::range`]; mutation goes through [`ParameterSet::set`]
/// (clamping) or [`ParameterSet::try_set`] (rejecting).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSet {
    noise: NoiseColor,
    band_center: f64,
    band_width: f64,
    tremolo_speed: f64,
    tremolo_depth: f64,
    reverb: f64,
    volume: f64,
    duration: u32,
    fade: f64,
    extras: Vec<String>,
    output: OutputTarget,
    playing: bool,
    show_visualization: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            noise: NoiseColor::Brown,
            band_center: 500.0,
            band_width: 500.0,
            tremolo_speed: 2.0,
            tremolo_depth: 30.0,
            reverb: 20.0,
            volume: 80.0,
            duration: DEFAULT_DURATION_SECS,
            fade: DEFAULT_FADE_SECS,
            extras: Vec::new(),
            output: OutputTarget::default(),
            playing: false,
            show_visualization: false,
        }
    }
}

impl ParameterSet {
    /// Reads a numeric field.
    pub fn get(&self, field: NumericField) -> f64 {
        match field {
            NumericField::BandCenter => self.band_center,
            NumericField::BandWidth => self.band_width,
            NumericField::TremoloSpeed => self.tremolo_speed,
            NumericField::TremoloDepth => self.tremolo_depth,
            NumericField::Reverb => self.reverb,
            NumericField::Volume => self.volume,
            NumericField::Duration => f64::from(self.duration),
            NumericField::Fade => self.fade,
        }
    }

    fn store(&mut self, field: NumericField, value: f64) {
        match field {
            NumericField::BandCenter => self.band_center = value,
            NumericField::BandWidth => self.band_width = value,
            NumericField::TremoloSpeed => self.tremolo_speed = value,
            NumericField::TremoloDepth => self.tremolo_depth = value,
            NumericField::Reverb => self.reverb = value,
            NumericField::Volume => self.volume = value,
            // Already rounded and clamped to [1, 86400].
            NumericField::Duration => self.duration = value as u32,
            NumericField::Fade => self.fade = value,
        }
    }

    /// Sets a numeric field, clamping into range.
    ///
    /// Returns the clamp as a warning when the requested value was outside
    /// the range. Non-finite values leave the field unchanged.
    pub fn set(&mut self, field: NumericField, value: f64) -> Option<OutOfRange> {
        match field.clamp(value) {
            Some(applied) => {
                self.store(field, applied);
                let adjusted = applied != value && !(field.is_integer() && field.contains(value));
                adjusted.then_some(OutOfRange {
                    field,
                    requested: value,
                    applied,
                })
            }
            None => Some(OutOfRange {
                field,
                requested: value,
                applied: self.get(field),
            }),
        }
    }

    /// Sets a numeric field, rejecting anything outside the range.
    pub fn try_set(&mut self, field: NumericField, value: f64) -> ParamResult<()> {
        if !value.is_finite() {
            return Err(ParamError::NotFinite {
                field: field.key(),
                value,
            });
        }
        if !field.contains(value) {
            return Err(OutOfRange {
                field,
                requested: value,
                applied: self.get(field),
            }
            .into());
        }
        let value = if field.is_integer() { value.round() } else { value };
        self.store(field, value);
        Ok(())
    }

    /// Builder-style [`ParameterSet::set`] that discards the warning.
    pub fn with(mut self, field: NumericField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn noise(&self) -> NoiseColor {
        self.noise
    }

    pub fn set_noise(&mut self, noise: NoiseColor) {
        self.noise = noise;
    }

    pub fn band_center(&self) -> f64 {
        self.band_center
    }

    pub fn band_width(&self) -> f64 {
        self.band_width
    }

    pub fn tremolo_speed(&self) -> f64 {
        self.tremolo_speed
    }

    pub fn tremolo_depth(&self) -> f64 {
        self.tremolo_depth
    }

    pub fn reverb(&self) -> f64 {
        self.reverb
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Loop length in seconds; never zero.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn fade(&self) -> f64 {
        self.fade
    }

    /// Tremolo rate handed to SoX: cycles per loop divided by loop length.
    pub fn tremolo_rate(&self) -> f64 {
        self.tremolo_speed / f64::from(self.duration)
    }

    /// Raw tokens appended to every command line.
    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn set_extras(&mut self, extras: Vec<String>) {
        self.extras = extras;
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    pub fn set_output(&mut self, output: OutputTarget) {
        self.output = output;
    }

    /// Whether the synthesis process should be running.
    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Whether the spectrogram should be generated.
    pub fn show_visualization(&self) -> bool {
        self.show_visualization
    }

    pub fn set_show_visualization(&mut self, show: bool) {
        self.show_visualization = show;
    }

    /// Copies the sound-shaping fields of `other`, keeping the live session
    /// state (playing, visualization, output target).
    pub fn adopt_sound(&mut self, other: &ParameterSet) {
        let session = (self.playing, self.show_visualization, self.output.clone());
        *self = other.clone();
        (self.playing, self.show_visualization, self.output) = session;
    }
}

/// Front-end session flags persisted alongside the parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFlags {
    /// The effects panel is expanded.
    pub effects_expanded: bool,
    /// A tray icon was requested.
    pub tray: bool,
    /// The window starts hidden (and playback starts immediately).
    pub hidden_on_start: bool,
}
