use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::args::parse_header;
use crate::driver::DriverSettings;
use crate::error::ConfigError;
use crate::http::{HttpMethod, RequestSpec};
use crate::metrics::CheckPolicy;
use crate::profile::{ProfileKind, ScenarioProfile, Stage};

use super::types::{ConfigFile, RequestConfig, ScenarioConfig, StageConfig};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Validated, ready-to-run form of a scenario document.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub checks: CheckPolicy,
    pub driver: DriverSettings,
    pub requests: Arc<[RequestSpec]>,
    /// Selected scenarios: sorted by name, or in `--scenario` order.
    pub scenarios: Vec<ScenarioProfile>,
}

/// Turns the raw document into a [`RunPlan`]. `base_url` is the CLI/env
/// value and wins over the document's `base_url`; `selected` narrows the
/// scenarios (empty means all).
///
/// # Errors
///
/// Returns an error when the base URL is missing or unusable, a scenario is
/// unknown or invalid, or a request entry is malformed. Nothing is started
/// in that case.
pub fn build_plan(
    config: &ConfigFile,
    base_url: Option<&str>,
    selected: &[String],
) -> Result<RunPlan, ConfigError> {
    let base_url = resolve_base_url(base_url.or(config.base_url.as_deref()))?;
    let scenarios = select_scenarios(config, selected)?;
    let requests = build_requests(config, &base_url)?;

    let request_timeout = config
        .request_timeout
        .as_ref()
        .map_or(Ok(DEFAULT_REQUEST_TIMEOUT), |value| value.to_duration())?;

    let mut checks = CheckPolicy::default();
    if let Some(status) = config.expected_status {
        checks.expected_status = status;
    }
    if let Some(max_latency) = config.max_latency.as_ref() {
        checks.max_latency = max_latency.to_duration()?;
    }

    let mut driver = DriverSettings::default();
    if let Some(think_time) = config.think_time.as_ref() {
        driver.think_time = think_time.to_duration_or_zero()?;
    }
    if let Some(tick) = config.tick.as_ref() {
        driver.tick = tick.to_duration()?;
    }
    if let Some(saturation) = config.saturation {
        driver.saturation = saturation;
    }

    Ok(RunPlan {
        base_url,
        request_timeout,
        checks,
        driver,
        requests,
        scenarios,
    })
}

/// Every scenario of the document, validated, for listing.
///
/// # Errors
///
/// Returns an error when the document has no scenarios or one is invalid.
pub fn all_scenarios(config: &ConfigFile) -> Result<Vec<ScenarioProfile>, ConfigError> {
    select_scenarios(config, &[])
}

fn resolve_base_url(value: Option<&str>) -> Result<Url, ConfigError> {
    let raw = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingBaseUrl)?;
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl {
        url: raw.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedBaseUrlScheme {
            url: raw.to_owned(),
        }),
    }
}

fn select_scenarios(
    config: &ConfigFile,
    selected: &[String],
) -> Result<Vec<ScenarioProfile>, ConfigError> {
    let scenarios = config
        .scenarios
        .as_ref()
        .filter(|scenarios| !scenarios.is_empty())
        .ok_or(ConfigError::NoScenarios)?;

    if selected.is_empty() {
        return scenarios
            .iter()
            .map(|(name, scenario)| scenario_profile(name, scenario))
            .collect();
    }

    let mut profiles = Vec::with_capacity(selected.len());
    for name in selected {
        let scenario = scenarios
            .get(name)
            .ok_or_else(|| ConfigError::UnknownScenario { name: name.clone() })?;
        if profiles
            .iter()
            .any(|profile: &ScenarioProfile| profile.name() == name)
        {
            continue;
        }
        profiles.push(scenario_profile(name, scenario)?);
    }
    Ok(profiles)
}

fn scenario_profile(name: &str, scenario: &ScenarioConfig) -> Result<ScenarioProfile, ConfigError> {
    let kind = match scenario {
        ScenarioConfig::ConstantVus { vus, duration } => ProfileKind::ConstantConcurrency {
            workers: *vus,
            duration: duration.to_duration()?,
        },
        ScenarioConfig::RampingVus { start_vus, stages } => ProfileKind::RampingConcurrency {
            start_workers: *start_vus,
            stages: build_stages(stages)?,
        },
        ScenarioConfig::RampingArrivalRate {
            start_rate,
            time_unit,
            pre_allocated_vus,
            max_vus,
            stages,
        } => {
            let pre_allocated_workers = pre_allocated_vus.unwrap_or(1);
            ProfileKind::RampingArrivalRate {
                start_rate: *start_rate,
                time_unit: time_unit
                    .as_ref()
                    .map_or(Ok(DEFAULT_TIME_UNIT), |value| value.to_duration())?,
                pre_allocated_workers,
                max_workers: max_vus.unwrap_or(pre_allocated_workers),
                stages: build_stages(stages)?,
            }
        }
    };
    ScenarioProfile::new(name, kind).map_err(|err| ConfigError::InvalidProfile {
        name: name.to_owned(),
        source: err,
    })
}

fn build_stages(stages: &[StageConfig]) -> Result<Vec<Stage>, ConfigError> {
    stages
        .iter()
        .map(|stage| {
            Ok(Stage::new(
                stage.duration.to_duration()?,
                stage.target,
            ))
        })
        .collect()
}

fn build_requests(config: &ConfigFile, base_url: &Url) -> Result<Arc<[RequestSpec]>, ConfigError> {
    let entries = config
        .requests
        .as_deref()
        .filter(|entries| !entries.is_empty())
        .ok_or(ConfigError::NoRequests)?;

    let mut shared_headers = Vec::new();
    for header in config.headers.iter().flatten() {
        shared_headers.push(parse_header(header)?);
    }

    let mut requests = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let spec = build_request(index.saturating_add(1), entry, &shared_headers)?;
        spec.resolve_url(base_url)
            .map_err(|err| ConfigError::InvalidRequestUrl {
                label: spec.label.clone(),
                source: err,
            })?;
        requests.push(spec);
    }
    Ok(Arc::from(requests))
}

fn build_request(
    index: usize,
    entry: &RequestConfig,
    shared_headers: &[(String, String)],
) -> Result<RequestSpec, ConfigError> {
    let url_template = entry
        .url
        .clone()
        .or_else(|| entry.path.clone())
        .ok_or(ConfigError::RequestMissingUrlOrPath { index })?;
    let label = entry
        .label
        .clone()
        .unwrap_or_else(|| format!("Request {}", index));
    let method = entry.method.unwrap_or(HttpMethod::Get);
    if method == HttpMethod::Get && entry.payload.is_some() {
        return Err(ConfigError::PayloadOnGet { label });
    }

    let mut headers = shared_headers.to_vec();
    for (key, value) in entry.headers.iter().flatten() {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(key));
        headers.push((key.clone(), value.clone()));
    }

    Ok(RequestSpec {
        label,
        method,
        url_template,
        headers,
        payload: entry.payload.clone(),
        think_time: entry
            .think_time
            .as_ref()
            .map(|value| value.to_duration_or_zero())
            .transpose()?,
    })
}
