//! Core library for the `vuload` CLI.
//!
//! `vuload` replays an ordered sequence of HTTP requests under declarative
//! load profiles (constant workers, ramping workers, ramping arrival rate)
//! and aggregates latency percentiles, throughput and failure rates. The
//! binary wires these modules together; library APIs may evolve with it.
pub mod args;
pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod metrics;
pub mod profile;
pub mod shutdown;
