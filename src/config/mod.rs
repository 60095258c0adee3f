//! Scenario document loading and validation.
mod apply;
mod loader;
mod parse;
mod presets;
pub mod types;

#[cfg(test)]
mod tests;

pub use apply::{RunPlan, all_scenarios, build_plan};
pub use loader::{ConfigSource, load_config};
pub use presets::BUILTIN_PRESET;

#[cfg(test)]
pub(crate) use loader::load_config_file;
pub(crate) use parse::{parse_duration_allow_zero, parse_duration_value};
#[cfg(test)]
pub(crate) use presets::builtin_config;
