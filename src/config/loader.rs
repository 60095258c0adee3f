use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::args::{DEFAULT_CONFIG_JSON, DEFAULT_CONFIG_TOML};
use crate::error::{AppError, AppResult, ConfigError};

use super::presets::builtin_config;
use super::types::ConfigFile;

/// Where the scenario document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    BuiltinPreset,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::BuiltinPreset => f.write_str("built-in preset"),
        }
    }
}

/// Loads the scenario document from `path`, or from `vuload.toml` /
/// `vuload.json` in the working directory, falling back to the built-in
/// preset. A document without `requests` inherits the preset sequence.
///
/// # Errors
///
/// Returns an error when a config file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> AppResult<(ConfigFile, ConfigSource)> {
    let candidate = match path {
        Some(path) => Some(path.to_path_buf()),
        None => [DEFAULT_CONFIG_TOML, DEFAULT_CONFIG_JSON]
            .into_iter()
            .map(PathBuf::from)
            .find(|path| path.exists()),
    };

    let Some(path) = candidate else {
        debug!("No scenario document found, using the built-in preset.");
        return Ok((builtin_config()?, ConfigSource::BuiltinPreset));
    };

    let mut config = load_config_file(&path)?;
    if config.requests.is_none() {
        debug!("'{}' defines no requests, using the preset sequence.", path.display());
        config.requests = builtin_config()?.requests;
    }
    Ok((config, ConfigSource::File(path)))
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
