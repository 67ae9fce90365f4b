//! sox-noise parameter model
//!
//! This crate holds everything about a noise session that is pure data:
//! the bounded [`ParameterSet`], the [`CommandBuilder`] that turns it into a
//! SoX command line, and the settings document codec in [`config`].
//!
//! # Example
//!
//! ```
//! use soxnoise_params::{CommandBuilder, NumericField, ParameterSet};
//!
//! let params = ParameterSet::default().with(NumericField::Volume, 110.0);
//! let argv = CommandBuilder::default().playback(&params);
//!
//! assert!(argv.windows(2).any(|w| w == ["gain", "10"]));
//! assert_eq!(&argv[argv.len() - 2..], ["repeat", "-"]);
//! ```
//!
//! # Modules
//!
//! - [`params`]: the parameter set and session flags
//! - [`field`]: numeric field catalogue and ranges
//! - [`noise`]: noise colors
//! - [`output`]: output target selectors
//! - [`command`]: SoX argument vectors
//! - [`overrides`]: sparse overlays
//! - [`config`]: settings document load/save
//! - [`error`]: error types

pub mod command;
pub mod config;
pub mod error;
pub mod field;
pub mod noise;
pub mod output;
pub mod overrides;
pub mod params;

pub use command::{
    volume_stage, BuildMode, CommandBuilder, SpectrogramDest, SpectrogramOptions,
    DEFAULT_PROGRAM, VOLUME_GAIN_THRESHOLD,
};
pub use config::ConfigDocument;
pub use error::{ConfigError, ConfigResult, OutOfRange, ParamError, ParamResult};
pub use field::NumericField;
pub use noise::NoiseColor;
pub use output::{DeviceClass, OutputTarget};
pub use overrides::SettingsOverrides;
pub use params::{ParameterSet, SessionFlags, DEFAULT_DURATION_SECS, DEFAULT_FADE_SECS};
