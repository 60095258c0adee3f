use clap::Parser;

use super::*;
use crate::error::ConfigError;

fn parse(args: &[&str]) -> Result<VuloadArgs, String> {
    VuloadArgs::try_parse_from(args).map_err(|err| format!("parse failed: {}", err))
}

#[test]
fn defaults_apply_without_flags() -> Result<(), String> {
    let args = parse(&["vuload"])?;
    if args.config.is_some() || !args.scenarios.is_empty() || args.request_log.is_some() {
        return Err(format!("Unexpected defaults: {:?}", args));
    }
    if args.output_format != OutputFormat::Text || args.list || args.verbose || args.no_color {
        return Err(format!("Unexpected flag defaults: {:?}", args));
    }
    Ok(())
}

#[test]
fn scenario_flag_repeats() -> Result<(), String> {
    let args = parse(&[
        "vuload",
        "--scenario",
        "smoke",
        "-s",
        "spike",
        "--base-url",
        "http://localhost:3000/objects",
        "--output-format",
        "json",
    ])?;
    if args.scenarios != ["smoke", "spike"] {
        return Err(format!("Unexpected scenarios: {:?}", args.scenarios));
    }
    if args.base_url.as_deref() != Some("http://localhost:3000/objects") {
        return Err("Unexpected base url".to_owned());
    }
    if args.output_format != OutputFormat::Json {
        return Err("Expected JSON output".to_owned());
    }
    Ok(())
}

#[test]
fn unknown_output_format_is_rejected() -> Result<(), String> {
    if VuloadArgs::try_parse_from(["vuload", "--output-format", "csv"]).is_ok() {
        return Err("csv should not be accepted".to_owned());
    }
    Ok(())
}

#[test]
fn parse_header_trims_key_and_value() -> Result<(), String> {
    let (key, value) =
        parse_header(" Content-Type :  application/json ").map_err(|err| err.to_string())?;
    if key != "Content-Type" || value != "application/json" {
        return Err(format!("Unexpected header: {}={}", key, value));
    }
    let (_, with_colon) =
        parse_header("X-Trace: a:b").map_err(|err| err.to_string())?;
    if with_colon != "a:b" {
        return Err(format!("Value should keep later colons: {}", with_colon));
    }
    Ok(())
}

#[test]
fn parse_header_requires_separator() -> Result<(), String> {
    for value in ["no-separator", ": empty-key"] {
        match parse_header(value) {
            Err(ConfigError::InvalidHeaderFormat { .. }) => {}
            other => return Err(format!("Expected InvalidHeaderFormat for {}, got {:?}", value, other)),
        }
    }
    Ok(())
}
