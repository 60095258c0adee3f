//! Request results, aggregate statistics, and the request telemetry log.
mod collector;
mod histogram;
mod logging;
mod types;


pub use collector::{CheckPolicy, MetricsCollector};
pub use histogram::{LatencyHistogram, Percentiles};
pub use logging::{
    RequestLog, RequestLogHandle, TELEMETRY_EVENT_TYPE, TelemetryRecord, setup_request_log,
};
pub use types::{AggregateStats, FailureKind, RequestResult, STATUS_NO_RESPONSE};
