//! Catalogue of the numeric, range-bounded parameters.

use std::fmt;
use std::str::FromStr;

use crate::error::ParamError;

/// A numeric field of the parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    /// Band-pass filter center frequency in Hz.
    BandCenter,
    /// Band-pass filter width in Hz.
    BandWidth,
    /// Tremolo cycles per loop duration.
    TremoloSpeed,
    /// Tremolo depth in percent.
    TremoloDepth,
    /// Reverberance in percent.
    Reverb,
    /// Volume; linear up to 100, gain boost above.
    Volume,
    /// Loop length in whole seconds.
    Duration,
    /// Fade length at each loop edge in seconds.
    Fade,
}

impl NumericField {
    /// All numeric fields, in settings document order.
    pub const ALL: [NumericField; 8] = [
        NumericField::Volume,
        NumericField::BandCenter,
        NumericField::BandWidth,
        NumericField::Reverb,
        NumericField::TremoloSpeed,
        NumericField::TremoloDepth,
        NumericField::Duration,
        NumericField::Fade,
    ];

    /// Settings document key (also the long option name with `_` for `-`).
    pub fn key(&self) -> &'static str {
        match self {
            NumericField::BandCenter => "band_center",
            NumericField::BandWidth => "band_width",
            NumericField::TremoloSpeed => "tremolo_speed",
            NumericField::TremoloDepth => "tremolo_depth",
            NumericField::Reverb => "reverb",
            NumericField::Volume => "volume",
            NumericField::Duration => "duration",
            NumericField::Fade => "fade",
        }
    }

    /// Inclusive `(min, max)` bounds.
    pub fn range(&self) -> (f64, f64) {
        match self {
            NumericField::BandCenter => (1.0, 2000.0),
            NumericField::BandWidth => (1.0, 1000.0),
            NumericField::TremoloSpeed => (0.0, 10.0),
            NumericField::TremoloDepth => (0.0, 100.0),
            NumericField::Reverb => (0.0, 100.0),
            NumericField::Volume => (1.0, 120.0),
            NumericField::Duration => (1.0, 86_400.0),
            NumericField::Fade => (0.0, 3600.0),
        }
    }

    /// Whether the field only holds whole numbers.
    pub fn is_integer(&self) -> bool {
        matches!(self, NumericField::Duration)
    }

    /// Whether a change to this field alters the spectrogram.
    pub fn affects_spectrum(&self) -> bool {
        matches!(
            self,
            NumericField::BandCenter
                | NumericField::BandWidth
                | NumericField::TremoloSpeed
                | NumericField::TremoloDepth
                | NumericField::Reverb
        )
    }

    /// Returns `value` forced into range, or `None` when it is not finite.
    pub fn clamp(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let (min, max) = self.range();
        let value = if self.is_integer() { value.round() } else { value };
        Some(value.clamp(min, max))
    }

    /// Returns true if `value` is finite and inside the declared range.
    pub fn contains(&self, value: f64) -> bool {
        let (min, max) = self.range();
        value.is_finite() && (min..=max).contains(&value)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for NumericField {
    type Err = ParamError;

    /// Accepts `band-center`, `band_center` and `bandcenter` in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        NumericField::ALL
            .into_iter()
            .find(|field| field.key().replace('_', "") == normalized)
            .ok_or_else(|| ParamError::UnknownField {
                name: s.to_string(),
            })
    }
}

/// Renders a number in its shortest round-trip form (`40`, `0.005`).
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Parses a number written by [`format_number`] or by hand.
pub fn parse_number(value: &str) -> Result<f64, ParamError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ParamError::InvalidNumber {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_from_str_normalizes_separators() {
        assert_eq!("band-center".parse::<NumericField>().unwrap(), NumericField::BandCenter);
        assert_eq!("band_center".parse::<NumericField>().unwrap(), NumericField::BandCenter);
        assert_eq!("Tremolo-Speed".parse::<NumericField>().unwrap(), NumericField::TremoloSpeed);
        assert!("bandwidthx".parse::<NumericField>().is_err());
    }

    #[test]
    fn test_clamp() {
        assert_eq!(NumericField::Volume.clamp(150.0), Some(120.0));
        assert_eq!(NumericField::Volume.clamp(0.0), Some(1.0));
        assert_eq!(NumericField::Duration.clamp(59.6), Some(60.0));
        assert_eq!(NumericField::Reverb.clamp(f64::NAN), None);
    }

    #[test]
    fn test_spectral_fields() {
        assert!(NumericField::BandCenter.affects_spectrum());
        assert!(NumericField::Reverb.affects_spectrum());
        assert!(!NumericField::Volume.affects_spectrum());
        assert!(!NumericField::Fade.affects_spectrum());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(0.005), "0.005");
        assert_eq!(format_number(0.8), "0.8");
        assert_eq!(parse_number(" 12.5 ").unwrap(), 12.5);
        assert!(parse_number("loud").is_err());
    }
}
