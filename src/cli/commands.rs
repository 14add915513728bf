//! Command implementations behind the CLI dispatch.

use tracing::{info, warn};

use crate::checker::{run_retry_check, RetryCheckOptions};
use crate::config::Settings;
use crate::error::DigestError;
use crate::exit_codes::ExitCode;
use crate::lkg_cache::LkgCache;
use crate::lock::RunLock;
use crate::logging;
use crate::orchestrator::Orchestrator;
use crate::paths;
use crate::providers;
use crate::publish::{LocalPublisher, Publisher};
use crate::report::{DeliveryStats, OverallStatus, RunReport, StatusHistory};
use crate::run_context::{RunContext, RunType};
use crate::timing::TimingRegistry;

/// Execute one full digest run: lock, fan out, publish, report.
///
/// Every exit path that got past the lock leaves a report in the status
/// history, including degraded ones; only refusing to start (lock held,
/// bad config) skips the record.
pub fn run_digest(
    run_type: RunType,
    force: bool,
    tag: Option<&str>,
) -> Result<ExitCode, DigestError> {
    let settings = Settings::load()?;
    let ctx = RunContext::new(run_type);
    let span = logging::run_span(&ctx);
    let _guard = span.enter();
    if let Some(tag) = tag {
        info!(tag, "run tagged");
    }

    let Some(lock) = RunLock::acquire()? else {
        warn!("another run is in progress, exiting");
        return Ok(ExitCode::LOCK_HELD);
    };

    let cache = LkgCache::open_default()?;
    let registry = TimingRegistry::new();
    let modules = providers::all_modules(&settings);
    let orchestrator = Orchestrator::new(&cache, &registry);

    if force {
        orchestrator.clear_primary_cache(&modules)?;
    }
    let snapshot = orchestrator.assemble(&modules);

    let mut report = RunReport::from_run(&ctx, registry.results(), &settings.environment);

    let publisher = LocalPublisher::new();
    match publisher.publish(&snapshot) {
        Ok(receipt) => {
            if let Some(count) = receipt.subscriber_count {
                report.set_subscriber_count(count);
            }
            report.finalize_delivery(receipt.delivery);
            if let Err(e) = publisher.verify(&snapshot) {
                report.push_error(format!("canary verification failed: {e}"));
            }
        }
        Err(e) => {
            warn!(error = %e, "publish failed");
            report.push_error(format!("publish failed: {e}"));
            report.finalize_delivery(DeliveryStats { sent: 0, failed: 1 });
        }
    }

    let overall = report.overall_status;
    info!(
        status = overall.as_str(),
        duration_seconds = report.duration_seconds,
        "run complete"
    );
    StatusHistory::record(&paths::status_history_path(), report)?;
    lock.release()?;

    Ok(if overall == OverallStatus::Failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Hourly retry check.
pub fn retry_check(dry_run: bool, tag: Option<String>) -> Result<ExitCode, DigestError> {
    let ctx = RunContext::new(RunType::RetryCheck);
    let span = logging::run_span(&ctx);
    let _guard = span.enter();
    run_retry_check(&RetryCheckOptions { dry_run, tag })
}

/// Print the rolling status history as JSON.
pub fn status() -> Result<ExitCode, DigestError> {
    let history = StatusHistory::load_default();
    let json = serde_json::to_string_pretty(&history)
        .map_err(crate::error::HistoryError::Serialize)?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}
