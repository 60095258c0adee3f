use crate::error::ConfigError;

use super::types::ConfigFile;

/// Scenario document used when no config file is present: the smoke,
/// baseline, load, stress, soak, endurance and spike scenarios against the
/// four-call `/objects` sequence.
pub const BUILTIN_PRESET: &str = include_str!("preset.toml");

pub(crate) fn builtin_config() -> Result<ConfigFile, ConfigError> {
    toml::from_str(BUILTIN_PRESET).map_err(|err| ConfigError::ParsePreset { source: err })
}
