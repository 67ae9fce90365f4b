//! Error types for parameter validation and the settings document codec.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::field::NumericField;

/// Result type for parameter operations.
pub type ParamResult<T> = Result<T, ParamError>;

/// Result type for settings document operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A value that fell outside the declared range of a numeric field.
///
/// Returned as a warning by the clamping setters and wrapped in
/// [`ParamError::OutOfRange`] by the strict ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutOfRange {
    /// The field that was being set.
    pub field: NumericField,
    /// The value that was requested.
    pub requested: f64,
    /// The value that was stored instead (equal to the previous value
    /// when the request was rejected).
    pub applied: f64,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = self.field.range();
        write!(
            f,
            "{} must be in [{}, {}], got {} (using {})",
            self.field.key(),
            min,
            max,
            self.requested,
            self.applied
        )
    }
}

/// Errors raised while validating or parsing parameter values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// A numeric value is outside the field's declared range.
    #[error("{0}")]
    OutOfRange(OutOfRange),

    /// A numeric value is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    /// A field name that is not part of the parameter set.
    #[error("unknown parameter '{name}'")]
    UnknownField { name: String },

    /// A noise color that SoX does not know.
    #[error("unknown noise color '{name}' (expected one of: brown, pink, white, tpdf)")]
    UnknownNoiseColor { name: String },

    /// A value that should have been a number.
    #[error("'{value}' is not a number")]
    InvalidNumber { value: String },

    /// A value that should have been a boolean.
    #[error("'{value}' is not a boolean")]
    InvalidBool { value: String },
}

impl ParamError {
    /// Stable identifier for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ParamError::OutOfRange(_) => "PARAM_001",
            ParamError::NotFinite { .. } => "PARAM_002",
            ParamError::UnknownField { .. } => "PARAM_003",
            ParamError::UnknownNoiseColor { .. } => "PARAM_004",
            ParamError::InvalidNumber { .. } => "PARAM_005",
            ParamError::InvalidBool { .. } => "PARAM_006",
        }
    }
}

impl From<OutOfRange> for ParamError {
    fn from(value: OutOfRange) -> Self {
        ParamError::OutOfRange(value)
    }
}

/// Errors raised while reading or writing a settings document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be written.
    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document has no `[section]` header at all.
    #[error("settings document has no section header")]
    MissingSection,

    /// A line that is neither a header, a comment nor a `key = value` pair.
    #[error("line {line}: cannot parse '{content}'")]
    Syntax { line: usize, content: String },

    /// A known key whose value cannot be interpreted.
    #[error("invalid value for '{key}': {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: ParamError,
    },
}

impl ConfigError {
    /// Stable identifier for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CONFIG_001",
            ConfigError::Write { .. } => "CONFIG_002",
            ConfigError::MissingSection => "CONFIG_003",
            ConfigError::Syntax { .. } => "CONFIG_004",
            ConfigError::InvalidValue { .. } => "CONFIG_005",
        }
    }
}
