//! Background timers.
//!
//! A repeated job drives the processing cycle and a cron job prunes old
//! job results.

use std::sync::Arc;
use std::time::Duration;

use compintel_core::AppConfig;
use compintel_pipeline::{JobProcessor, MonitoringScheduler};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process.
/// Call [`JobScheduler::shutdown`] to stop future ticks; a cycle already in
/// progress runs to completion.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    processor: Arc<JobProcessor>,
    monitoring: MonitoringScheduler,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_processing_job(&scheduler, processor, config.process_interval_secs).await?;
    register_cleanup_job(
        &scheduler,
        monitoring,
        &config.cleanup_cron,
        config.result_retention_days,
    )
    .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Runs one processing cycle every `interval_secs`.
///
/// Overlapping ticks are turned into no-ops by the processor itself.
async fn register_processing_job(
    scheduler: &JobScheduler,
    processor: Arc<JobProcessor>,
    interval_secs: u64,
) -> Result<(), JobSchedulerError> {
    let interval = Duration::from_secs(interval_secs.max(1));

    let job = Job::new_repeated_async(interval, move |_uuid, _lock| {
        let processor = Arc::clone(&processor);

        Box::pin(async move {
            if let Some(summary) = processor.process_cycle().await {
                tracing::info!(
                    due = summary.jobs.due,
                    succeeded = summary.jobs.succeeded,
                    failed = summary.jobs.failed,
                    alerts = summary.analysis.alerts,
                    "scheduler: processing cycle complete"
                );
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(interval_secs, "scheduler: processing job registered");
    Ok(())
}

/// Deletes job results older than `retention_days` on the `cron` schedule.
async fn register_cleanup_job(
    scheduler: &JobScheduler,
    monitoring: MonitoringScheduler,
    cron: &str,
    retention_days: u32,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let monitoring = monitoring.clone();

        Box::pin(async move {
            match monitoring.cleanup_old_results(retention_days).await {
                Ok(deleted) => {
                    tracing::info!(deleted, retention_days, "scheduler: old job results removed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: job result cleanup failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: cleanup job registered");
    Ok(())
}
