//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod parsers;

#[cfg(test)]
mod tests;

pub use cli::{OutputFormat, VuloadArgs};

pub(crate) use defaults::{DEFAULT_CONFIG_JSON, DEFAULT_CONFIG_TOML, DEFAULT_USER_AGENT};
pub(crate) use parsers::parse_header;
