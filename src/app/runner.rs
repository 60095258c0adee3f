use std::path::Path;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use vuload::config::RunPlan;
use vuload::driver::{DriverContext, LoadDriver};
use vuload::error::AppResult;
use vuload::http::{HttpExecutor, RequestExecutor};
use vuload::metrics::{AggregateStats, MetricsCollector, RequestLog, setup_request_log};
use vuload::shutdown::ShutdownSender;

/// Final statistics of one scenario.
#[derive(Debug)]
pub(crate) struct ScenarioReport {
    pub(crate) name: String,
    pub(crate) executor: &'static str,
    pub(crate) stats: AggregateStats,
}

#[derive(Debug)]
pub(crate) struct RunReport {
    pub(crate) scenarios: Vec<ScenarioReport>,
    pub(crate) total: AggregateStats,
}

/// Runs every scenario of `plan` concurrently, each with its own collector,
/// and waits for all of them to drain.
pub(crate) async fn run_plan(
    plan: RunPlan,
    request_log_path: Option<&Path>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<RunReport> {
    let executor: Arc<dyn RequestExecutor> = Arc::new(HttpExecutor::new(plan.request_timeout)?);
    let (request_log, log_handle) = match request_log_path {
        Some(path) => {
            let (log, handle) = setup_request_log(path)?;
            info!("Writing request records to '{}'.", path.display());
            (log, Some(handle))
        }
        None => (RequestLog::Tracing, None),
    };

    let mut collectors = Vec::with_capacity(plan.scenarios.len());
    let mut runs = Vec::with_capacity(plan.scenarios.len());
    for profile in plan.scenarios {
        let collector = Arc::new(MetricsCollector::new(plan.checks)?);
        collectors.push(Arc::clone(&collector));
        let context = DriverContext {
            base_url: plan.base_url.clone(),
            executor: Arc::clone(&executor),
            collector,
            request_log: request_log.clone(),
        };
        let name = profile.name().to_owned();
        let executor_name = profile.kind().executor_name();
        let driver = LoadDriver::new(profile, Arc::clone(&plan.requests), context, plan.driver);
        let shutdown_rx = shutdown_tx.subscribe();
        runs.push(async move {
            ScenarioReport {
                name,
                executor: executor_name,
                stats: driver.run(shutdown_rx).await,
            }
        });
    }

    let scenarios = join_all(runs).await;
    drop(request_log);
    if let Some(handle) = log_handle {
        let dropped = handle.dropped();
        let written = handle.finish().await?;
        info!("Request log complete: {} records.", written);
        if dropped > 0 {
            warn!(
                "Request log writer fell behind, {} records were not written.",
                dropped
            );
        }
    }

    let total = MetricsCollector::combined(&collectors)?;
    Ok(RunReport { scenarios, total })
}
