//! Sparse overlays merged over a base parameter set.
//!
//! Both the settings document and explicit command-line flags produce a
//! [`SettingsOverrides`]; resolution applies them in order over the defaults.

use crate::error::OutOfRange;
use crate::field::NumericField;
use crate::noise::NoiseColor;
use crate::output::OutputTarget;
use crate::params::{ParameterSet, SessionFlags};

/// A partial set of parameter and session-flag values.
///
/// `None` means "not specified here, keep whatever is underneath".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub noise: Option<NoiseColor>,
    /// Numeric values keyed by field, in the order they were specified.
    pub numeric: Vec<(NumericField, f64)>,
    pub extras: Option<Vec<String>>,
    pub output: Option<OutputTarget>,
    pub play: Option<bool>,
    pub spectrogram: Option<bool>,
    pub effects: Option<bool>,
    pub tray: Option<bool>,
    pub hide: Option<bool>,
}

impl SettingsOverrides {
    /// Returns true when nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self == &SettingsOverrides::default()
    }

    /// Sets (or replaces) a numeric override.
    pub fn set_numeric(&mut self, field: NumericField, value: f64) {
        self.numeric.retain(|(existing, _)| *existing != field);
        self.numeric.push((field, value));
    }

    /// Returns the numeric override for `field`, if any.
    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        self.numeric
            .iter()
            .find(|(existing, _)| *existing == field)
            .map(|(_, value)| *value)
    }

    /// Layers `other` on top of `self`; values in `other` win.
    pub fn merge(&mut self, other: &SettingsOverrides) {
        for (field, value) in &other.numeric {
            self.set_numeric(*field, *value);
        }
        if other.noise.is_some() {
            self.noise = other.noise;
        }
        if other.extras.is_some() {
            self.extras = other.extras.clone();
        }
        if other.output.is_some() {
            self.output = other.output.clone();
        }
        self.play = other.play.or(self.play);
        self.spectrogram = other.spectrogram.or(self.spectrogram);
        self.effects = other.effects.or(self.effects);
        self.tray = other.tray.or(self.tray);
        self.hide = other.hide.or(self.hide);
    }

    /// Applies the overlay to a parameter set and session flags.
    ///
    /// Out-of-range numbers are clamped; the clamps are returned so the
    /// caller can surface them as warnings.
    pub fn apply(&self, params: &mut ParameterSet, flags: &mut SessionFlags) -> Vec<OutOfRange> {
        if let Some(noise) = self.noise {
            params.set_noise(noise);
        }
        let warnings = self
            .numeric
            .iter()
            .filter_map(|(field, value)| params.set(*field, *value))
            .collect();
        if let Some(extras) = &self.extras {
            params.set_extras(extras.clone());
        }
        if let Some(output) = &self.output {
            params.set_output(output.clone());
        }
        if let Some(play) = self.play {
            params.set_playing(play);
        }
        if let Some(spectrogram) = self.spectrogram {
            params.set_show_visualization(spectrogram);
        }
        if let Some(effects) = self.effects {
            flags.effects_expanded = effects;
        }
        if let Some(tray) = self.tray {
            flags.tray = tray;
        }
        if let Some(hide) = self.hide {
            flags.hidden_on_start = hide;
        }
        warnings
    }

    /// Applies the overlay over fresh defaults.
    pub fn resolve(&self) -> (ParameterSet, SessionFlags, Vec<OutOfRange>) {
        let mut params = ParameterSet::default();
        let mut flags = SessionFlags::default();
        let warnings = self.apply(&mut params, &mut flags);
        (params, flags, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_overlay_is_identity() {
        let (params, flags, warnings) = SettingsOverrides::default().resolve();
        assert_eq!(params, ParameterSet::default());
        assert_eq!(flags, SessionFlags::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_later_overlay_wins() {
        let mut config = SettingsOverrides::default();
        config.set_numeric(NumericField::Reverb, 40.0);
        config.set_numeric(NumericField::Volume, 90.0);
        config.noise = Some(NoiseColor::Pink);

        let mut cli = SettingsOverrides::default();
        cli.set_numeric(NumericField::Volume, 60.0);
        cli.play = Some(true);

        config.merge(&cli);
        let (params, _, _) = config.resolve();
        assert_eq!(params.reverb(), 40.0);
        assert_eq!(params.volume(), 60.0);
        assert_eq!(params.noise(), NoiseColor::Pink);
        assert!(params.playing());
    }

    #[test]
    fn test_apply_reports_clamps() {
        let mut overlay = SettingsOverrides::default();
        overlay.set_numeric(NumericField::BandCenter, 5000.0);
        let (params, _, warnings) = overlay.resolve();
        assert_eq!(params.band_center(), 2000.0);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, NumericField::BandCenter);
    }

    #[test]
    fn test_flags() {
        let overlay = SettingsOverrides {
            effects: Some(true),
            hide: Some(true),
            ..Default::default()
        };
        let (_, flags, _) = overlay.resolve();
        assert!(flags.effects_expanded);
        assert!(flags.hidden_on_start);
        assert!(!flags.tray);
    }
}
