//! Maps a [`ParameterSet`] to a SoX argument vector.
//!
//! The effects chain is always emitted in the same order:
//!
//! ```text
//! sox -c<N> --null <output...> synth 0:<secs> <color>noise
//!     band -n <center> <width>
//!     tremolo <rate> <depth>          (full/render)
//!     reverb <amount>                 (full/render)
//!     vol <v/100> | gain <v-100>      (full/render)
//!     fade q <fade> 0:<secs> <fade>   (full/render)
//!     <extras...>
//!     repeat -                        (full, non-file output only)
//! ```
//!
//! Building is pure: the same inputs always produce the same vector.

use std::path::PathBuf;

use crate::field::format_number;
use crate::output::OutputTarget;
use crate::params::ParameterSet;

/// Default SoX executable name.
pub const DEFAULT_PROGRAM: &str = "sox";

/// Volume values above this become a gain boost in dB.
pub const VOLUME_GAIN_THRESHOLD: f64 = 100.0;

/// What the command line is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    /// Looping stereo playback with the complete effects chain.
    Full,
    /// One mono second of the filtered noise, for the spectrogram.
    Preview,
    /// Same chain as [`BuildMode::Full`] written once to a file.
    Render,
}

impl BuildMode {
    /// Returns the string identifier for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Full => "full",
            BuildMode::Preview => "preview",
            BuildMode::Render => "render",
        }
    }

    fn full_chain(&self) -> bool {
        !matches!(self, BuildMode::Preview)
    }

    /// Whether the infinite `repeat` instruction is appended for `target`.
    pub fn repeats(&self, target: &OutputTarget) -> bool {
        matches!(self, BuildMode::Full) && !target.is_file()
    }
}

/// Where the spectrogram image goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpectrogramDest {
    /// PNG bytes on stdout.
    Pipe,
    /// PNG written to a file.
    File(PathBuf),
}

/// Spectrogram image geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrogramOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels; SoX is fastest with one more than a power of two.
    pub height: u32,
    /// Omit axes, legend and title.
    pub raw: bool,
}

impl Default for SpectrogramOptions {
    fn default() -> Self {
        Self {
            width: 200,
            height: 129,
            raw: true,
        }
    }
}

/// Builds SoX argument vectors. The first element is the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    program: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl CommandBuilder {
    /// Creates a builder invoking `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The executable placed at `argv[0]`.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Builds the argument vector for `mode` writing to `target`.
    pub fn build(&self, params: &ParameterSet, mode: BuildMode, target: &OutputTarget) -> Vec<String> {
        let full = mode.full_chain();
        let seconds = if full { params.duration() } else { 1 };

        let mut argv = vec![
            self.program.clone(),
            format!("-c{}", if full { 2 } else { 1 }),
            "--null".to_string(),
        ];
        argv.extend(target.tokens());
        argv.extend([
            "synth".to_string(),
            format!("0:{}", seconds),
            params.noise().synth_token(),
            "band".to_string(),
            "-n".to_string(),
            format_number(params.band_center()),
            format_number(params.band_width()),
        ]);

        if full {
            argv.extend([
                "tremolo".to_string(),
                format_number(params.tremolo_rate()),
                format_number(params.tremolo_depth()),
                "reverb".to_string(),
                format_number(params.reverb()),
            ]);
            argv.extend(volume_stage(params.volume()));
            let fade = format_number(params.fade());
            argv.extend([
                "fade".to_string(),
                "q".to_string(),
                fade.clone(),
                format!("0:{}", params.duration()),
                fade,
            ]);
        }

        argv.extend(params.extras().iter().cloned());

        if mode.repeats(target) {
            argv.extend(["repeat".to_string(), "-".to_string()]);
        }
        argv
    }

    /// Builds the looping playback command for the parameter set's own output.
    pub fn playback(&self, params: &ParameterSet) -> Vec<String> {
        self.build(params, BuildMode::Full, params.output())
    }

    /// Builds a one-shot render into `path`.
    pub fn render(&self, params: &ParameterSet, path: impl Into<PathBuf>) -> Vec<String> {
        self.build(params, BuildMode::Render, &OutputTarget::File(path.into()))
    }

    /// Builds the spectrogram command: the preview chain into the null sink
    /// followed by SoX's `spectrogram` effect.
    pub fn spectrogram(
        &self,
        params: &ParameterSet,
        options: &SpectrogramOptions,
        dest: &SpectrogramDest,
    ) -> Vec<String> {
        let mut argv = self.build(params, BuildMode::Preview, &OutputTarget::Null);
        argv.push("spectrogram".to_string());
        match dest {
            SpectrogramDest::Pipe => argv.push("-o-".to_string()),
            SpectrogramDest::File(path) => {
                argv.push("-o".to_string());
                argv.push(path.to_string_lossy().into_owned());
            }
        }
        argv.push(format!("-x{}", options.width));
        argv.push(format!("-y{}", options.height));
        if options.raw {
            argv.push("-r".to_string());
        }
        argv
    }
}

/// The loudness stage: linear `vol` up to the threshold, `gain` in dB above it.
///
/// The linear factor always carries a decimal point (`vol 1.0`).
pub fn volume_stage(volume: f64) -> [String; 2] {
    if volume <= VOLUME_GAIN_THRESHOLD {
        let factor = volume / 100.0;
        let amount = if factor.fract() == 0.0 {
            format!("{:.1}", factor)
        } else {
            format_number(factor)
        };
        ["vol".to_string(), amount]
    } else {
        ["gain".to_string(), format_number(volume - VOLUME_GAIN_THRESHOLD)]
    }
}
