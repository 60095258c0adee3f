use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Scenario name must not be empty.")]
    EmptyName,
    #[error("Duration must be > 0.")]
    ZeroDuration,
    #[error("Ramping profile requires at least one stage.")]
    MissingStages,
    #[error("Stage {index} duration must be > 0.")]
    ZeroStageDuration { index: usize },
    #[error("timeUnit must be > 0 (got {time_unit:?}).")]
    ZeroTimeUnit { time_unit: Duration },
    #[error("maxVUs must be >= 1.")]
    ZeroMaxWorkers,
    #[error("preAllocatedVUs ({pre_allocated}) cannot exceed maxVUs ({max}).")]
    PreAllocatedExceedsMax { pre_allocated: usize, max: usize },
}
