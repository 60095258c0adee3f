use std::time::Duration;

use serde::Serialize;

use vuload::args::OutputFormat;
use vuload::config::ConfigSource;
use vuload::error::AppResult;
use vuload::metrics::AggregateStats;
use vuload::profile::ScenarioProfile;

use super::runner::{RunReport, ScenarioReport};

/// Sampling step used to find the peak target of a listed scenario.
const LISTING_GRANULARITY: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct ReportJson<'report> {
    scenarios: Vec<ScenarioJson<'report>>,
    total: StatsJson,
}

#[derive(Debug, Serialize)]
struct ScenarioJson<'report> {
    name: &'report str,
    executor: &'static str,
    #[serde(flatten)]
    stats: StatsJson,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsJson {
    elapsed_ms: f64,
    request_count: u64,
    success_count: u64,
    failure_count: u64,
    failure_rate: f64,
    timeout_count: u64,
    transport_error_count: u64,
    unexpected_status_count: u64,
    dropped_iterations: u64,
    checks_passed: u64,
    checks_failed: u64,
    min_latency_ms: f64,
    mean_latency_ms: f64,
    max_latency_ms: f64,
    p50_ms: f64,
    p90_ms: f64,
    p95_ms: f64,
    p99_ms: f64,
    mean_throughput_rps: f64,
}

impl From<&AggregateStats> for StatsJson {
    fn from(stats: &AggregateStats) -> Self {
        Self {
            elapsed_ms: millis(stats.elapsed),
            request_count: stats.request_count,
            success_count: stats.success_count(),
            failure_count: stats.failure_count,
            failure_rate: stats.failure_rate,
            timeout_count: stats.timeout_count,
            transport_error_count: stats.transport_error_count,
            unexpected_status_count: stats.unexpected_status_count,
            dropped_iterations: stats.dropped_iterations,
            checks_passed: stats.checks_passed,
            checks_failed: stats.checks_failed,
            min_latency_ms: millis(stats.min_latency),
            mean_latency_ms: millis(stats.mean_latency),
            max_latency_ms: millis(stats.max_latency),
            p50_ms: millis(stats.percentiles.p50),
            p90_ms: millis(stats.percentiles.p90),
            p95_ms: millis(stats.percentiles.p95),
            p99_ms: millis(stats.percentiles.p99),
            mean_throughput_rps: stats.mean_throughput_rps,
        }
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "JSON report exposes fractional milliseconds"
)]
fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

/// Prints the final report to stdout.
///
/// # Errors
///
/// Returns an error if the JSON report cannot be encoded.
pub(crate) fn print_report(report: &RunReport, format: OutputFormat) -> AppResult<()> {
    match format {
        OutputFormat::Json => {
            let json = ReportJson {
                scenarios: report
                    .scenarios
                    .iter()
                    .map(|scenario| ScenarioJson {
                        name: &scenario.name,
                        executor: scenario.executor,
                        stats: StatsJson::from(&scenario.stats),
                    })
                    .collect(),
                total: StatsJson::from(&report.total),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            for scenario in &report.scenarios {
                print_scenario(scenario);
                println!();
            }
            if report.scenarios.len() > 1 {
                println!("== total ==");
                print_stats(&report.total);
            }
        }
    }
    Ok(())
}

fn print_scenario(scenario: &ScenarioReport) {
    println!("== {} ({}) ==", scenario.name, scenario.executor);
    print_stats(&scenario.stats);
}

fn print_stats(stats: &AggregateStats) {
    let rates = SummaryRates::from_stats(stats);
    println!("Duration: {}", format_duration(stats.elapsed));
    println!("Total Requests: {}", stats.request_count);
    println!("Successful: {}", stats.success_count());
    println!(
        "Failed: {} ({}.{:02}%)",
        stats.failure_count,
        rates.failure_rate_x100 / 100,
        rates.failure_rate_x100 % 100
    );
    println!("Timeouts: {}", stats.timeout_count);
    println!("Transport Errors: {}", stats.transport_error_count);
    println!("Unexpected Status: {}", stats.unexpected_status_count);
    println!("Dropped Iterations: {}", stats.dropped_iterations);
    println!(
        "Checks: {} passed / {} failed",
        stats.checks_passed, stats.checks_failed
    );
    println!(
        "Latency min/mean/max: {} / {} / {}",
        format_duration(stats.min_latency),
        format_duration(stats.mean_latency),
        format_duration(stats.max_latency)
    );
    println!(
        "Latency p50/p90/p95/p99: {} / {} / {} / {}",
        format_duration(stats.percentiles.p50),
        format_duration(stats.percentiles.p90),
        format_duration(stats.percentiles.p95),
        format_duration(stats.percentiles.p99)
    );
    println!(
        "Throughput: {}.{:02} req/s",
        rates.rps_x100 / 100,
        rates.rps_x100 % 100
    );
}

struct SummaryRates {
    failure_rate_x100: u64,
    rps_x100: u64,
}

impl SummaryRates {
    fn from_stats(stats: &AggregateStats) -> Self {
        let total = u128::from(stats.request_count);
        let failure_rate_x100 = u128::from(stats.failure_count)
            .saturating_mul(10_000)
            .checked_div(total)
            .unwrap_or(0);
        let rps_x100 = total
            .saturating_mul(100_000)
            .checked_div(stats.elapsed.as_millis())
            .unwrap_or(0);
        Self {
            failure_rate_x100: u64::try_from(failure_rate_x100).unwrap_or(u64::MAX),
            rps_x100: u64::try_from(rps_x100).unwrap_or(u64::MAX),
        }
    }
}

/// `1.234s` above one second, `12.345ms` below.
fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros / 1_000) % 1_000)
    } else {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    }
}

/// Prints the scenarios of the loaded document, one per line.
pub(crate) fn print_listing(profiles: &[ScenarioProfile], source: &ConfigSource) {
    println!("Scenarios from {}:", source);
    for profile in profiles {
        let peak = profile
            .samples(LISTING_GRANULARITY)
            .map(|(_, target)| target)
            .max()
            .unwrap_or(0);
        let unit = if profile.is_arrival_rate() {
            "iterations/unit"
        } else {
            "workers"
        };
        println!(
            "  {:<12} {:<22} {:>10}  peak {} {}",
            profile.name(),
            profile.kind().executor_name(),
            format_duration(profile.total_duration()),
            peak,
            unit
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_switches_units() -> Result<(), String> {
        let cases = [
            (Duration::from_micros(1_500), "1.500ms"),
            (Duration::from_millis(250), "250.000ms"),
            (Duration::from_millis(61_250), "61.250s"),
        ];
        for (input, expected) in cases {
            let formatted = format_duration(input);
            if formatted != expected {
                return Err(format!("{:?} formatted as {}", input, formatted));
            }
        }
        Ok(())
    }

    #[test]
    fn summary_rates_use_counts_and_elapsed() -> Result<(), String> {
        let mut stats = AggregateStats::empty(Duration::from_secs(4));
        stats.request_count = 10;
        stats.failure_count = 1;
        let rates = SummaryRates::from_stats(&stats);
        if rates.failure_rate_x100 != 1_000 || rates.rps_x100 != 250 {
            return Err(format!(
                "Unexpected rates: failure {} rps {}",
                rates.failure_rate_x100, rates.rps_x100
            ));
        }
        let empty = SummaryRates::from_stats(&AggregateStats::empty(Duration::ZERO));
        if empty.failure_rate_x100 != 0 || empty.rps_x100 != 0 {
            return Err("Empty stats should report zero rates".to_owned());
        }
        Ok(())
    }

    #[test]
    fn json_report_uses_camel_case_keys() -> Result<(), String> {
        let stats = AggregateStats::empty(Duration::from_secs(1));
        let json = serde_json::to_value(ScenarioJson {
            name: "smoke",
            executor: "constant-vus",
            stats: StatsJson::from(&stats),
        })
        .map_err(|err| format!("encode failed: {}", err))?;
        for key in ["name", "executor", "requestCount", "failureRate", "p95Ms", "droppedIterations"] {
            if json.get(key).is_none() {
                return Err(format!("Missing key {} in {}", key, json));
            }
        }
        Ok(())
    }
}
