use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::driver::SaturationPolicy;
use crate::error::ConfigError;
use crate::http::HttpMethod;

/// Scenario document as written on disk (`vuload.toml` / `vuload.json`).
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfigFile {
    /// Used only when neither `--base-url` nor `VULOAD_BASE_URL` is set.
    pub base_url: Option<String>,
    #[serde(alias = "timeout")]
    pub request_timeout: Option<DurationValue>,
    pub think_time: Option<DurationValue>,
    #[serde(alias = "status")]
    pub expected_status: Option<u16>,
    pub max_latency: Option<DurationValue>,
    pub tick: Option<DurationValue>,
    pub saturation: Option<SaturationPolicy>,
    /// `Key: Value` headers sent with every request.
    pub headers: Option<Vec<String>>,
    pub scenarios: Option<BTreeMap<String, ScenarioConfig>>,
    pub requests: Option<Vec<RequestConfig>>,
}

/// One named scenario, tagged by its executor kind.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "executor", rename_all = "kebab-case")]
pub enum ScenarioConfig {
    ConstantVus {
        #[serde(default = "default_workers")]
        vus: u64,
        duration: DurationValue,
    },
    RampingVus {
        #[serde(rename = "startVUs", alias = "start_vus", default = "default_workers")]
        start_vus: u64,
        stages: Vec<StageConfig>,
    },
    RampingArrivalRate {
        #[serde(rename = "startRate", alias = "start_rate", default)]
        start_rate: u64,
        #[serde(rename = "timeUnit", alias = "time_unit")]
        time_unit: Option<DurationValue>,
        #[serde(rename = "preAllocatedVUs", alias = "pre_allocated_vus")]
        pre_allocated_vus: Option<usize>,
        #[serde(rename = "maxVUs", alias = "max_vus")]
        max_vus: Option<usize>,
        stages: Vec<StageConfig>,
    },
}

const fn default_workers() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub duration: DurationValue,
    pub target: u64,
}

/// One entry of the request sequence.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RequestConfig {
    #[serde(alias = "name")]
    pub label: Option<String>,
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(alias = "body")]
    pub payload: Option<serde_json::Value>,
    pub think_time: Option<DurationValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    /// Converts to a strictly positive duration.
    pub(crate) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ConfigError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }

    /// Like [`DurationValue::to_duration`] but accepts `0`.
    pub(crate) fn to_duration_or_zero(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_allow_zero(text),
        }
    }
}
