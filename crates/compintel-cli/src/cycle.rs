//! One-shot processing cycle.

use std::sync::Arc;

use compintel_core::AppConfig;
use compintel_monitor::{MonitorConfig, MonitorRegistry};
use compintel_pipeline::{JobProcessor, PgStore, PipelineStores, ProcessorConfig};

use crate::monitoring::build_triggers;

/// Runs due jobs and the analysis pass once, then prints the summary.
///
/// # Errors
///
/// Returns an error if the monitors or the gamification client cannot be
/// built, or if the cycle was skipped because another one holds the guard.
pub(crate) async fn run_cycle(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let monitors = MonitorRegistry::with_default_monitors(
        &MonitorConfig::from_app_config(config),
        &config.platform_keys,
    )?;
    let processor = JobProcessor::new(
        PipelineStores::shared(Arc::new(PgStore::new(pool.clone()))),
        monitors,
        build_triggers(pool, config)?,
        ProcessorConfig::from_app_config(config),
    );

    let Some(summary) = processor.process_cycle().await else {
        anyhow::bail!("processing cycle skipped: a cycle is already running");
    };

    println!(
        "jobs: {} due, {} succeeded, {} failed, {} skipped",
        summary.jobs.due, summary.jobs.succeeded, summary.jobs.failed, summary.jobs.skipped
    );
    println!(
        "analysis: {} of {} competitors analyzed, {} unchanged, {} alerts, {} failures",
        summary.analysis.analyzed,
        summary.analysis.competitors,
        summary.analysis.unchanged,
        summary.analysis.alerts,
        summary.analysis.failures
    );
    Ok(())
}
