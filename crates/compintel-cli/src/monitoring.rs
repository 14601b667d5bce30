//! Job management command handlers for the CLI.

use std::sync::Arc;

use clap::Subcommand;
use compintel_core::AppConfig;
use compintel_gamification::{GamificationTriggers, PgStatsStore, RemoteGamificationClient};
use compintel_pipeline::{MonitoringRequest, MonitoringScheduler, PgStore, PipelineStores};
use uuid::Uuid;

/// Job state commands for one competitor.
#[derive(Debug, Subcommand)]
pub enum MonitoringCommands {
    /// Pause every job of a competitor
    Pause {
        #[arg(long)]
        competitor: Uuid,
        #[arg(long)]
        user: Uuid,
    },
    /// Make paused and failed jobs runnable again
    Resume {
        #[arg(long)]
        competitor: Uuid,
        #[arg(long)]
        user: Uuid,
    },
    /// List a competitor's jobs and their schedule
    Status {
        #[arg(long)]
        competitor: Uuid,
        #[arg(long)]
        user: Uuid,
    },
}

/// Triggers with the remote endpoint when one is configured.
///
/// # Errors
///
/// Returns an error if the configured endpoint URL is invalid.
pub(crate) fn build_triggers(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<GamificationTriggers> {
    let remote = config
        .gamification_url
        .as_deref()
        .map(|url| {
            RemoteGamificationClient::new(
                url,
                config.gamification_token.clone(),
                config.monitor_request_timeout_secs,
            )
        })
        .transpose()?;
    Ok(GamificationTriggers::new(
        remote,
        Arc::new(PgStatsStore::new(pool.clone())),
    ))
}

fn build_scheduler(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<MonitoringScheduler> {
    let stores = PipelineStores::shared(Arc::new(PgStore::new(pool.clone())));
    Ok(
        MonitoringScheduler::new(stores.jobs, stores.directory, config.max_retries)
            .with_triggers(build_triggers(pool, config)?),
    )
}

pub(crate) async fn run_schedule(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    competitor_id: Uuid,
    user_id: Uuid,
    request: &MonitoringRequest,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(pool, config)?;
    let created = scheduler
        .schedule_monitoring(competitor_id, user_id, request)
        .await?;

    if created.is_empty() {
        println!("no new jobs: every requested platform is already monitored or has no handle");
    } else {
        println!("created {} job(s):", created.len());
        for id in created {
            println!("  {id}");
        }
    }
    Ok(())
}

pub(crate) async fn run_monitoring_command(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: MonitoringCommands,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(pool, config)?;
    match command {
        MonitoringCommands::Pause { competitor, user } => {
            let paused = scheduler.pause_monitoring(competitor, user).await?;
            println!("paused {paused} job(s)");
        }
        MonitoringCommands::Resume { competitor, user } => {
            let resumed = scheduler.resume_monitoring(competitor, user).await?;
            println!("resumed {resumed} job(s)");
        }
        MonitoringCommands::Status { competitor, user } => {
            let jobs = scheduler.monitoring_status(competitor, user).await?;
            if jobs.is_empty() {
                println!("no jobs for competitor {competitor}");
            }
            for job in jobs {
                println!(
                    "{}  {:<10} {:<8} {:<7} retries {}/{}  next {}",
                    job.id,
                    job.platform().map_or("-", compintel_core::Platform::as_str),
                    job.status.as_str(),
                    job.frequency.as_str(),
                    job.retry_count,
                    job.max_retries,
                    job.next_run_at.format("%Y-%m-%d %H:%M UTC"),
                );
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_cleanup(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    days: u32,
) -> anyhow::Result<()> {
    let scheduler = build_scheduler(pool, config)?;
    let deleted = scheduler.cleanup_old_results(days).await?;
    println!("deleted {deleted} job result(s) older than {days} day(s)");
    Ok(())
}
