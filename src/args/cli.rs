use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Async HTTP load-test driver - runs constant, ramping and arrival-rate scenarios against an API and reports latency percentiles, throughput and failure rates."
)]
pub struct VuloadArgs {
    /// Scenario document (.toml or .json). Defaults to vuload.toml or
    /// vuload.json in the working directory, then the built-in preset
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Scenario to run; repeat to run several concurrently (default: all)
    #[arg(long = "scenario", short = 's')]
    pub scenarios: Vec<String>,

    /// Base URL of the API under test
    #[arg(long = "base-url", short = 'u', env = "VULOAD_BASE_URL")]
    pub base_url: Option<String>,

    /// Write one JSON line per request to this file instead of the log
    #[arg(long = "request-log")]
    pub request_log: Option<PathBuf>,

    /// Final report format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Print the scenarios of the document and exit
    #[arg(long = "list")]
    pub list: bool,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
