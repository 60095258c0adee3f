mod app;
mod config;
mod http;
mod metrics;
mod profile;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use metrics::MetricsError;
pub use profile::ProfileError;
