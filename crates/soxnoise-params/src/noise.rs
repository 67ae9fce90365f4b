//! Noise colors understood by the SoX `synth` effect.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParamError;

/// The "color" of generated noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseColor {
    /// Brownian noise, steep low-frequency tilt.
    #[default]
    Brown,
    /// Pink noise, equal energy per octave.
    Pink,
    /// White noise, flat spectrum.
    White,
    /// Triangular probability density noise.
    Tpdf,
}

impl NoiseColor {
    /// All colors, in button order.
    pub const ALL: [NoiseColor; 4] = [
        NoiseColor::Brown,
        NoiseColor::Pink,
        NoiseColor::White,
        NoiseColor::Tpdf,
    ];

    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseColor::Brown => "brown",
            NoiseColor::Pink => "pink",
            NoiseColor::White => "white",
            NoiseColor::Tpdf => "tpdf",
        }
    }

    /// Returns the SoX synth type token, e.g. `brownnoise`.
    pub fn synth_token(&self) -> String {
        format!("{}noise", self.as_str())
    }
}

impl fmt::Display for NoiseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseColor {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        NoiseColor::ALL
            .into_iter()
            .find(|color| color.as_str() == lowered)
            .ok_or_else(|| ParamError::UnknownNoiseColor {
                name: s.to_string(),
            })
    }
}
