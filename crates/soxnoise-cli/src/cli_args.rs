//! Command-line argument definitions.
//!
//! Only flags that were actually given become overrides, so a settings file
//! value survives unless the command line names the same key.

use std::path::PathBuf;

use clap::Parser;
use soxnoise_params::{NoiseColor, NumericField, OutputTarget, SettingsOverrides};

/// Environment variable naming the SoX executable.
pub const SOX_ENV: &str = "SOX_NOISE_SOX";

/// sox-noise - play colored noise through SoX
#[derive(Parser, Debug)]
#[command(name = "sox-noise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Noise color: brown, pink, white or tpdf
    pub noise: Option<NoiseColor>,

    /// Settings file (default: <config dir>/sox-noise/default.sxn)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start playing immediately
    #[arg(short, long)]
    pub play: bool,

    /// Volume, 1-120; above 100 applies gain in dB
    #[arg(long)]
    pub volume: Option<f64>,

    /// Band-pass center frequency in Hz
    #[arg(long)]
    pub band_center: Option<f64>,

    /// Band-pass width in Hz
    #[arg(long)]
    pub band_width: Option<f64>,

    /// Show the effects panel
    #[arg(long)]
    pub effects: bool,

    /// Reverberance, 0-100
    #[arg(long)]
    pub reverb: Option<f64>,

    /// Tremolo cycles per noise duration
    #[arg(long)]
    pub tremolo_speed: Option<f64>,

    /// Tremolo depth, 0-100
    #[arg(long)]
    pub tremolo_depth: Option<f64>,

    /// Length of one noise segment in seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Fade in/out length in seconds
    #[arg(long)]
    pub fade: Option<f64>,

    /// Request a tray icon
    #[arg(long)]
    pub tray: bool,

    /// Start hidden and play until interrupted
    #[arg(long)]
    pub hide: bool,

    /// Render the sound to this file, again after every change
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Output: pulse, alsa, wav, sox, default, <type>,<device> or a file path
    #[arg(short, long, value_name = "SELECTOR")]
    pub output: Option<String>,

    /// Show the spectrogram
    #[arg(short, long)]
    pub spectrogram: bool,

    /// Write each spectrogram image to this file
    #[arg(long, value_name = "PATH")]
    pub spectrogram_out: Option<PathBuf>,

    /// Have SoX write spectrograms to a scratch file instead of a pipe
    #[arg(long)]
    pub spectrogram_file: bool,

    /// Extra SoX effect arguments appended to the chain
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_name = "ARGS")]
    pub extras: Option<Vec<String>>,

    /// SoX executable
    #[arg(long, env = SOX_ENV, default_value = soxnoise_params::command::DEFAULT_PROGRAM)]
    pub sox: String,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The settings given explicitly on the command line.
    pub fn overrides(&self) -> SettingsOverrides {
        let mut overrides = SettingsOverrides {
            noise: self.noise,
            extras: self.extras.clone(),
            output: self.output.as_deref().map(OutputTarget::parse),
            play: self.play.then_some(true),
            spectrogram: self.spectrogram.then_some(true),
            effects: self.effects.then_some(true),
            tray: self.tray.then_some(true),
            hide: self.hide.then_some(true),
            ..SettingsOverrides::default()
        };
        let numeric = [
            (NumericField::Volume, self.volume),
            (NumericField::BandCenter, self.band_center),
            (NumericField::BandWidth, self.band_width),
            (NumericField::Reverb, self.reverb),
            (NumericField::TremoloSpeed, self.tremolo_speed),
            (NumericField::TremoloDepth, self.tremolo_depth),
            (NumericField::Duration, self.duration),
            (NumericField::Fade, self.fade),
        ];
        for (field, value) in numeric {
            if let Some(value) = value {
                overrides.set_numeric(field, value);
            }
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use soxnoise_params::DeviceClass;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "sox-noise",
            "pink",
            "--play",
            "--volume",
            "110",
            "--band-center",
            "800",
            "--output",
            "alsa,hw:0,1",
            "--extras",
            "highpass",
            "-1",
            "100",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.noise, Some(NoiseColor::Pink));
        assert_eq!(overrides.play, Some(true));
        assert_eq!(overrides.numeric(NumericField::Volume), Some(110.0));
        assert_eq!(overrides.numeric(NumericField::BandCenter), Some(800.0));
        assert_eq!(overrides.numeric(NumericField::Reverb), None);
        assert_eq!(
            overrides.output,
            Some(OutputTarget::Device {
                class: DeviceClass::Alsa,
                device: Some("hw:0,1".to_string()),
            })
        );
        assert_eq!(
            overrides.extras,
            Some(vec!["highpass".to_string(), "-1".to_string(), "100".to_string()])
        );
    }

    #[test]
    fn test_absent_flags_do_not_override() {
        let cli = Cli::try_parse_from(["sox-noise"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.is_empty());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_rejects_unknown_noise() {
        assert!(Cli::try_parse_from(["sox-noise", "green"]).is_err());
    }
}
