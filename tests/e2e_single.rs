mod support_single;

use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

use support_single::{run_vuload, spawn_http_server};

const SHORT_SCENARIO: &str = r#"
think_time = "50ms"
tick = "100ms"
request_timeout = "5s"

[scenarios.quick]
executor = "constant-vus"
vus = 2
duration = "2s"
"#;

fn write_config(dir: &tempfile::TempDir) -> Result<PathBuf, String> {
    let path = dir.path().join("quick.toml");
    fs::write(&path, SHORT_SCENARIO).map_err(|err| format!("write config failed: {}", err))?;
    Ok(path)
}

fn describe(output: &std::process::Output) -> String {
    format!(
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn e2e_single_json_report_and_request_log() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = write_config(&dir)?;
    let request_log = dir.path().join("requests.jsonl");

    let output = run_vuload(
        [
            OsStr::new("--config"),
            config.as_os_str(),
            OsStr::new("--base-url"),
            OsStr::new(&format!("{}/objects", url)),
            OsStr::new("--output-format"),
            OsStr::new("json"),
            OsStr::new("--request-log"),
            request_log.as_os_str(),
        ],
        dir.path(),
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|err| format!("report is not JSON ({}): {}", err, describe(&output)))?;
    let scenario = report
        .get("scenarios")
        .and_then(|scenarios| scenarios.get(0))
        .ok_or_else(|| format!("missing scenario in {}", report))?;
    if scenario.get("name").and_then(serde_json::Value::as_str) != Some("quick") {
        return Err(format!("unexpected scenario: {}", scenario));
    }
    let requests = scenario
        .get("requestCount")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);
    let failures = scenario
        .get("failureCount")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(u64::MAX);
    if requests < 4 || failures != 0 {
        return Err(format!("unexpected counts: {}", scenario));
    }

    let log = fs::read_to_string(&request_log)
        .map_err(|err| format!("read request log failed: {}", err))?;
    let lines: Vec<&str> = log.lines().collect();
    if u64::try_from(lines.len()).unwrap_or(0) != requests {
        return Err(format!(
            "expected {} log lines, got {}",
            requests,
            lines.len()
        ));
    }
    let first: serde_json::Value = serde_json::from_str(lines.first().copied().unwrap_or(""))
        .map_err(|err| format!("log line is not JSON: {}", err))?;
    if first.get("eventType").and_then(serde_json::Value::as_str) != Some("VuloadApiTest") {
        return Err(format!("unexpected record: {}", first));
    }
    if first.get("statusCode").and_then(serde_json::Value::as_u64) != Some(200) {
        return Err(format!("unexpected status: {}", first));
    }
    Ok(())
}

#[test]
fn e2e_single_text_report_on_stdout() -> Result<(), String> {
    let (url, _server) = spawn_http_server()?;
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = write_config(&dir)?;

    let output = run_vuload(
        [
            OsStr::new("--config"),
            config.as_os_str(),
            OsStr::new("--base-url"),
            OsStr::new(&format!("{}/objects", url)),
        ],
        dir.path(),
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    for expected in ["== quick (constant-vus) ==", "Total Requests:", "Latency p50/p90/p95/p99:"] {
        if !stdout.contains(expected) {
            return Err(format!("missing '{}' in report: {}", expected, stdout));
        }
    }
    Ok(())
}

#[test]
fn e2e_single_missing_base_url_fails() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = write_config(&dir)?;

    let output = run_vuload([OsStr::new("--config"), config.as_os_str()], dir.path())?;
    if output.status.success() {
        return Err(format!("expected failure: {}", describe(&output)));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mentions = stderr.matches("Missing target base URL").count();
    if mentions != 1 {
        return Err(format!(
            "expected the missing base URL message exactly once, got {}: {}",
            mentions,
            describe(&output)
        ));
    }
    Ok(())
}

#[test]
fn e2e_single_list_uses_builtin_preset() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;

    let output = run_vuload(["--list"], dir.path())?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["smoke", "baseline", "load", "stress", "soak", "endurance", "spike"] {
        if !stdout.contains(name) {
            return Err(format!("missing scenario '{}' in listing: {}", name, stdout));
        }
    }
    if !stdout.contains("built-in preset") {
        return Err(format!("expected preset source: {}", stdout));
    }
    Ok(())
}
