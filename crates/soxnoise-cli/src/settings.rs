//! Startup settings: defaults, then the settings file, then the command line.

use std::path::{Path, PathBuf};

use soxnoise_params::{config, ParameterSet, SessionFlags, SettingsOverrides};
use tracing::{debug, info};

/// Name of the default settings file inside the config directory.
pub const DEFAULT_FILE_NAME: &str = "default.sxn";

/// The resolved initial state.
#[derive(Debug, Clone)]
pub struct StartupSettings {
    pub params: ParameterSet,
    pub flags: SessionFlags,
    /// The settings file that was consulted.
    pub config_path: PathBuf,
    /// Problems worth showing to the user.
    pub warnings: Vec<String>,
}

/// `$XDG_CONFIG_HOME/sox-noise` or the platform equivalent.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("sox-noise")
}

/// Resolves the startup state.
///
/// An explicit settings file that does not exist is reported and ignored.
/// The default file is created (with only its section header) when missing.
/// A settings file that fails to parse is reported and defaults are used.
pub fn resolve(
    explicit: Option<&Path>,
    cli: &SettingsOverrides,
    config_dir: &Path,
) -> StartupSettings {
    let mut warnings = Vec::new();
    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir.join(DEFAULT_FILE_NAME));

    let mut overlay = SettingsOverrides::default();
    if config_path.is_file() {
        match config::load(&config_path) {
            Ok(loaded) => {
                info!("Config: {}", config_path.display());
                overlay = loaded;
            }
            Err(e) => warnings.push(format!("{} [{}]; using defaults", e, e.code())),
        }
    } else if explicit.is_some() {
        warnings.push(format!("Config file not found: {}", config_path.display()));
    } else {
        match config::ensure_exists(&config_path) {
            Ok(true) => info!("Created {}", config_path.display()),
            Ok(false) => debug!("{} already exists", config_path.display()),
            Err(e) => warnings.push(format!("{} [{}]", e, e.code())),
        }
    }

    overlay.merge(cli);
    let (mut params, flags, clamped) = overlay.resolve();
    warnings.extend(clamped.iter().map(ToString::to_string));
    if flags.hidden_on_start {
        params.set_playing(true);
    }

    StartupSettings {
        params,
        flags,
        config_path,
        warnings,
    }
}
