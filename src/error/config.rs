use std::path::PathBuf;
use thiserror::Error;

use super::{HttpError, ProfileError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to parse built-in preset: {source}")]
    ParsePreset {
        #[source]
        source: toml::de::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Missing target base URL. Set VULOAD_BASE_URL or pass --base-url.")]
    MissingBaseUrl,
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Base URL '{url}' must use http or https.")]
    UnsupportedBaseUrlScheme { url: String },
    #[error("Unknown scenario '{name}'.")]
    UnknownScenario { name: String },
    #[error("Config defines no scenarios.")]
    NoScenarios,
    #[error("Request sequence must include at least one request.")]
    NoRequests,
    #[error("Request {index} must define url or path.")]
    RequestMissingUrlOrPath { index: usize },
    #[error("Request '{label}' is a GET and cannot carry a payload.")]
    PayloadOnGet { label: String },
    #[error("Request '{label}' has an unusable URL: {source}")]
    InvalidRequestUrl {
        label: String,
        #[source]
        source: HttpError,
    },
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Scenario '{name}' is invalid: {source}")]
    InvalidProfile {
        name: String,
        #[source]
        source: ProfileError,
    },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
}
