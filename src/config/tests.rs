use std::time::Duration;

use tempfile::tempdir;

use super::{
    all_scenarios, build_plan, builtin_config, load_config, load_config_file,
    parse_duration_allow_zero, parse_duration_value,
    types::{ConfigFile, DurationValue, ScenarioConfig},
    ConfigSource,
};
use crate::driver::SaturationPolicy;
use crate::error::{AppError, ConfigError};
use crate::http::HttpMethod;
use crate::profile::ProfileKind;

const BASE_URL: &str = "http://localhost:3000/objects";

fn write_config(name: &str, content: &str) -> Result<(tempfile::TempDir, std::path::PathBuf), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join(name);
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;
    Ok((dir, path))
}

fn config_from_toml(content: &str) -> Result<ConfigFile, String> {
    toml::from_str(content).map_err(|err| format!("toml parse failed: {}", err))
}

#[test]
fn parse_toml_scenarios_with_camel_case_fields() -> Result<(), String> {
    let (_dir, path) = write_config(
        "vuload.toml",
        r#"
base_url = "http://localhost:3000/objects"
timeout = "5s"
think_time = 0
saturation = "queue"

[scenarios.ramp]
executor = "ramping-vus"
startVUs = 2
stages = [{ duration = "30s", target = 5 }]

[scenarios.spike]
executor = "ramping-arrival-rate"
startRate = 10
timeUnit = "1m"
preAllocatedVUs = 2
maxVUs = 4
stages = [{ duration = "2m", target = 10 }]

[[requests]]
name = "Ping"
path = "/ping"
"#,
    )?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.request_timeout != Some(DurationValue::Text("5s".to_owned())) {
        return Err(format!("Unexpected timeout: {:?}", config.request_timeout));
    }
    if config.think_time != Some(DurationValue::Seconds(0)) {
        return Err(format!("Unexpected think time: {:?}", config.think_time));
    }
    if config.saturation != Some(SaturationPolicy::Queue) {
        return Err(format!("Unexpected saturation: {:?}", config.saturation));
    }
    let scenarios = config.scenarios.as_ref().ok_or("Expected scenarios")?;
    match scenarios.get("ramp") {
        Some(ScenarioConfig::RampingVus { start_vus: 2, stages }) if stages.len() == 1 => {}
        other => return Err(format!("Unexpected ramp scenario: {:?}", other)),
    }
    match scenarios.get("spike") {
        Some(ScenarioConfig::RampingArrivalRate {
            start_rate: 10,
            pre_allocated_vus: Some(2),
            max_vus: Some(4),
            ..
        }) => {}
        other => return Err(format!("Unexpected spike scenario: {:?}", other)),
    }
    let requests = config.requests.as_ref().ok_or("Expected requests")?;
    let first = requests.first().ok_or("Missing request")?;
    if first.label.as_deref() != Some("Ping") || first.path.as_deref() != Some("/ping") {
        return Err(format!("Unexpected request: {:?}", first));
    }
    Ok(())
}

#[test]
fn parse_json_with_snake_case_aliases() -> Result<(), String> {
    let (_dir, path) = write_config(
        "vuload.json",
        r#"{
  "base_url": "http://localhost:3000/objects",
  "scenarios": {
    "spike": {
      "executor": "ramping-arrival-rate",
      "start_rate": 5,
      "pre_allocated_vus": 1,
      "max_vus": 3,
      "stages": [{ "duration": "10s", "target": 5 }]
    }
  },
  "requests": [
    { "label": "Create", "method": "post", "url": "{{base_url}}", "body": { "name": "x" } }
  ]
}"#,
    )?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let plan = build_plan(&config, None, &[]).map_err(|err| err.to_string())?;
    let profile = plan.scenarios.first().ok_or("Missing scenario")?;
    match profile.kind() {
        ProfileKind::RampingArrivalRate {
            start_rate: 5,
            time_unit,
            pre_allocated_workers: 1,
            max_workers: 3,
            ..
        } if *time_unit == Duration::from_secs(1) => {}
        other => return Err(format!("Unexpected profile: {:?}", other)),
    }
    let request = plan.requests.first().ok_or("Missing request")?;
    if request.method != HttpMethod::Post || request.payload.is_none() {
        return Err(format!("Unexpected request: {:?}", request));
    }
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), String> {
    let (_dir, path) = write_config("vuload.yaml", "base_url: x")?;
    match load_config_file(&path) {
        Err(AppError::Config(ConfigError::UnsupportedExtension { ext })) if ext == "yaml" => Ok(()),
        other => Err(format!("Expected UnsupportedExtension, got {:?}", other)),
    }
}

#[test]
fn file_without_requests_inherits_preset_sequence() -> Result<(), String> {
    let (_dir, path) = write_config(
        "short.toml",
        r#"
[scenarios.quick]
executor = "constant-vus"
vus = 1
duration = "2s"
"#,
    )?;

    let (config, source) = load_config(Some(path.as_path())).map_err(|err| err.to_string())?;
    if source != ConfigSource::File(path.clone()) {
        return Err(format!("Unexpected source: {}", source));
    }
    let requests = config.requests.as_ref().ok_or("Expected inherited requests")?;
    if requests.len() != 4 {
        return Err(format!("Expected 4 requests, got {}", requests.len()));
    }
    Ok(())
}

#[test]
fn builtin_preset_defines_seven_scenarios() -> Result<(), String> {
    let config = builtin_config().map_err(|err| err.to_string())?;
    let profiles = all_scenarios(&config).map_err(|err| err.to_string())?;
    let names: Vec<&str> = profiles.iter().map(|profile| profile.name()).collect();
    let expected = [
        "baseline",
        "endurance",
        "load",
        "smoke",
        "soak",
        "spike",
        "stress",
    ];
    if names != expected {
        return Err(format!("Unexpected scenarios: {:?}", names));
    }

    let plan = build_plan(&config, Some(BASE_URL), &["smoke".to_owned()])
        .map_err(|err| err.to_string())?;
    let labels: Vec<&str> = plan
        .requests
        .iter()
        .map(|request| request.label.as_str())
        .collect();
    if labels
        != [
            "List Of All Objects",
            "List Objects By ID",
            "Add Object",
            "Get Single Object",
        ]
    {
        return Err(format!("Unexpected request labels: {:?}", labels));
    }
    if plan.checks.expected_status != 200 || plan.checks.max_latency != Duration::from_millis(500) {
        return Err(format!("Unexpected checks: {:?}", plan.checks));
    }
    if plan.driver.think_time != Duration::from_secs(1) {
        return Err(format!("Unexpected think time: {:?}", plan.driver.think_time));
    }
    Ok(())
}

#[test]
fn cli_base_url_wins_over_document() -> Result<(), String> {
    let config = config_from_toml(
        r#"
base_url = "http://document.invalid/objects"

[scenarios.quick]
executor = "constant-vus"
duration = "2s"

[[requests]]
url = "{{base_url}}"
"#,
    )?;
    let plan = build_plan(&config, Some(BASE_URL), &[]).map_err(|err| err.to_string())?;
    if plan.base_url.as_str() != BASE_URL {
        return Err(format!("Unexpected base url: {}", plan.base_url));
    }
    let request = plan.requests.first().ok_or("Missing request")?;
    if request.label != "Request 1" {
        return Err(format!("Unexpected default label: {}", request.label));
    }
    Ok(())
}

#[test]
fn missing_base_url_is_fatal() -> Result<(), String> {
    let config = builtin_config().map_err(|err| err.to_string())?;
    match build_plan(&config, None, &[]) {
        Err(ConfigError::MissingBaseUrl) => {}
        other => return Err(format!("Expected MissingBaseUrl, got {:?}", other)),
    }
    match build_plan(&config, Some("   "), &[]) {
        Err(ConfigError::MissingBaseUrl) => {}
        other => return Err(format!("Expected MissingBaseUrl for blank, got {:?}", other)),
    }
    match build_plan(&config, Some("ftp://localhost/objects"), &[]) {
        Err(ConfigError::UnsupportedBaseUrlScheme { .. }) => Ok(()),
        other => Err(format!("Expected UnsupportedBaseUrlScheme, got {:?}", other)),
    }
}

#[test]
fn unknown_scenario_is_rejected() -> Result<(), String> {
    let config = builtin_config().map_err(|err| err.to_string())?;
    match build_plan(&config, Some(BASE_URL), &["smoke".to_owned(), "nope".to_owned()]) {
        Err(ConfigError::UnknownScenario { name }) if name == "nope" => Ok(()),
        other => Err(format!("Expected UnknownScenario, got {:?}", other)),
    }
}

#[test]
fn selected_scenarios_keep_cli_order_without_duplicates() -> Result<(), String> {
    let config = builtin_config().map_err(|err| err.to_string())?;
    let selected = ["spike", "smoke", "spike"].map(str::to_owned);
    let plan = build_plan(&config, Some(BASE_URL), &selected).map_err(|err| err.to_string())?;
    let names: Vec<&str> = plan.scenarios.iter().map(|profile| profile.name()).collect();
    if names != ["spike", "smoke"] {
        return Err(format!("Unexpected selection: {:?}", names));
    }
    Ok(())
}

#[test]
fn payload_on_get_is_rejected() -> Result<(), String> {
    let config = config_from_toml(
        r#"
[scenarios.quick]
executor = "constant-vus"
duration = "2s"

[[requests]]
label = "Bad"
method = "get"
path = "/x"
payload = { a = 1 }
"#,
    )?;
    match build_plan(&config, Some(BASE_URL), &[]) {
        Err(ConfigError::PayloadOnGet { label }) if label == "Bad" => Ok(()),
        other => Err(format!("Expected PayloadOnGet, got {:?}", other)),
    }
}

#[test]
fn pre_allocated_above_max_is_rejected() -> Result<(), String> {
    let config = config_from_toml(
        r#"
[scenarios.spike]
executor = "ramping-arrival-rate"
preAllocatedVUs = 5
maxVUs = 2
stages = [{ duration = "10s", target = 1 }]

[[requests]]
url = "{{base_url}}"
"#,
    )?;
    match build_plan(&config, Some(BASE_URL), &[]) {
        Err(ConfigError::InvalidProfile { name, .. }) if name == "spike" => Ok(()),
        other => Err(format!("Expected InvalidProfile, got {:?}", other)),
    }
}

#[test]
fn request_headers_override_shared_headers() -> Result<(), String> {
    let config = config_from_toml(
        r#"
headers = ["Accept: text/plain", "X-Run: 1"]

[scenarios.quick]
executor = "constant-vus"
duration = "2s"

[[requests]]
path = "/x"
headers = { accept = "application/json" }
"#,
    )?;
    let plan = build_plan(&config, Some(BASE_URL), &[]).map_err(|err| err.to_string())?;
    let request = plan.requests.first().ok_or("Missing request")?;
    let expected = vec![
        ("X-Run".to_owned(), "1".to_owned()),
        ("accept".to_owned(), "application/json".to_owned()),
    ];
    if request.headers != expected {
        return Err(format!("Unexpected headers: {:?}", request.headers));
    }
    Ok(())
}

#[test]
fn parse_duration_units() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("10", Duration::from_secs(10)),
        ("10s", Duration::from_secs(10)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3_600)),
        ("1d", Duration::from_secs(86_400)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_value(input).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("{} parsed to {:?}", input, parsed));
        }
    }
    Ok(())
}

#[test]
fn parse_duration_rejects_bad_input() -> Result<(), String> {
    match parse_duration_value("0s") {
        Err(ConfigError::DurationZero) => {}
        other => return Err(format!("Expected DurationZero, got {:?}", other)),
    }
    match parse_duration_value("5w") {
        Err(ConfigError::InvalidDurationUnit { unit }) if unit == "w" => {}
        other => return Err(format!("Expected InvalidDurationUnit, got {:?}", other)),
    }
    match parse_duration_value("fast") {
        Err(ConfigError::InvalidDurationFormat { .. }) => {}
        other => return Err(format!("Expected InvalidDurationFormat, got {:?}", other)),
    }
    if parse_duration_allow_zero("0").map_err(|err| err.to_string())? != Duration::ZERO {
        return Err("Zero should be allowed for think time".to_owned());
    }
    Ok(())
}
