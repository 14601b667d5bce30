//! Runs due monitoring jobs and the periodic analysis pass.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use compintel_analysis::{analyze_competitor, generate_alerts, AlertTarget, AnalysisOptions};
use compintel_core::{Competitor, JobConfig, JobResult, JobStatus, MonitoringJob, Platform};
use compintel_gamification::GamificationTriggers;
use compintel_monitor::MonitorRegistry;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::scheduler::calculate_next_run;
use crate::store::{
    AlertStore, CompetitorDirectory, DueJobs, JobPatch, JobStore, PostStore, StoreError,
};

/// Per-attempt budget when none is configured.
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(60);

/// Why one attempt failed. The message is recorded in the job result.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job type {0} is not handled by this processor")]
    UnsupportedJobType(&'static str),
    #[error("no monitor registered for platform {0}")]
    UnsupportedPlatform(Platform),
    #[error("source fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("job {0} is already being processed")]
    AlreadyInFlight(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The four stores a processor reads and writes.
#[derive(Clone)]
pub struct PipelineStores {
    pub jobs: Arc<dyn JobStore>,
    pub directory: Arc<dyn CompetitorDirectory>,
    pub posts: Arc<dyn PostStore>,
    pub alerts: Arc<dyn AlertStore>,
}

impl PipelineStores {
    /// One shared value behind every store seam.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: JobStore + CompetitorDirectory + PostStore + AlertStore + 'static,
    {
        Self {
            jobs: Arc::clone(&store) as Arc<dyn JobStore>,
            directory: Arc::clone(&store) as Arc<dyn CompetitorDirectory>,
            posts: Arc::clone(&store) as Arc<dyn PostStore>,
            alerts: store as Arc<dyn AlertStore>,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    pub job_timeout: Duration,
    /// Count view counts as engagement during analysis.
    pub include_views: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            job_timeout: DEFAULT_JOB_TIMEOUT,
            include_views: false,
        }
    }
}

impl ProcessorConfig {
    #[must_use]
    pub fn from_app_config(config: &compintel_core::AppConfig) -> Self {
        Self {
            job_timeout: Duration::from_secs(config.job_timeout_secs.max(1)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub due: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub competitors: usize,
    pub analyzed: usize,
    pub alerts: usize,
    pub failures: usize,
    /// Competitors with no posts collected since their last analysis.
    pub unchanged: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub jobs: ProcessSummary,
    pub analysis: AnalysisSummary,
}

/// Successful attempt details, before they are written to the result row.
struct Collected {
    platform: Platform,
    handle: String,
    posts_collected: usize,
    new_posts: u64,
}

pub struct JobProcessor {
    stores: PipelineStores,
    monitors: MonitorRegistry,
    triggers: GamificationTriggers,
    config: ProcessorConfig,
    in_flight: Mutex<HashSet<Uuid>>,
    cycle_running: AtomicBool,
}

impl JobProcessor {
    #[must_use]
    pub fn new(
        stores: PipelineStores,
        monitors: MonitorRegistry,
        triggers: GamificationTriggers,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            stores,
            monitors,
            triggers,
            config,
            in_flight: Mutex::new(HashSet::new()),
            cycle_running: AtomicBool::new(false),
        }
    }

    /// Runs due jobs, then the analysis pass.
    ///
    /// Returns `None` without doing anything when the previous cycle is
    /// still running on this processor.
    pub async fn process_cycle(&self) -> Option<CycleSummary> {
        let Some(_guard) = CycleGuard::acquire(&self.cycle_running) else {
            tracing::warn!("processor: previous cycle still running, tick skipped");
            return None;
        };

        let started = Instant::now();
        let jobs = match self.process_pending_jobs().await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "processor: could not load due jobs");
                ProcessSummary::default()
            }
        };
        let analysis = match self.run_analysis_cycle(Utc::now()).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!(error = %e, "analysis: could not load active competitors");
                AnalysisSummary::default()
            }
        };

        tracing::info!(
            due = jobs.due,
            succeeded = jobs.succeeded,
            failed = jobs.failed,
            analyzed = analysis.analyzed,
            unchanged = analysis.unchanged,
            alerts = analysis.alerts,
            elapsed_ms = started.elapsed().as_millis(),
            "processor: cycle complete"
        );
        Some(CycleSummary { jobs, analysis })
    }

    /// Processes every due social-media job, one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the due jobs cannot be loaded. Failures of
    /// individual jobs are recorded on the job and counted, not returned.
    pub async fn process_pending_jobs(&self) -> Result<ProcessSummary, StoreError> {
        let due = self
            .stores
            .jobs
            .select_due_jobs(DueJobs::social_at(Utc::now()))
            .await?;

        let mut summary = ProcessSummary {
            due: due.len(),
            ..ProcessSummary::default()
        };
        for job in &due {
            match self.process_job(job).await {
                Ok(result) if result.success => summary.succeeded += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    summary.skipped += 1;
                    tracing::warn!(job_id = %job.id, error = %e, "processor: job skipped");
                }
            }
        }

        Ok(summary)
    }

    /// One attempt of `job`, timed from now.
    ///
    /// # Errors
    ///
    /// See [`JobProcessor::process_job_at`].
    pub async fn process_job(&self, job: &MonitoringJob) -> Result<JobResult, JobError> {
        self.process_job_at(job, Utc::now()).await
    }

    /// One attempt of `job`, scheduling follow-ups relative to `now`.
    ///
    /// The job is marked `running` first and always leaves `running` again:
    /// back to `pending` with its next slot, or to `failed` once the retry
    /// budget is spent. Every attempt appends exactly one result.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::AlreadyInFlight`] if the job is being processed
    /// elsewhere in this process, or [`JobError::Store`] if it cannot be
    /// marked `running`. Neither case counts as an attempt.
    pub async fn process_job_at(
        &self,
        job: &MonitoringJob,
        now: DateTime<Utc>,
    ) -> Result<JobResult, JobError> {
        let Some(_claim) = InFlightClaim::acquire(&self.in_flight, job.id) else {
            return Err(JobError::AlreadyInFlight(job.id));
        };

        self.stores
            .jobs
            .update_job(job.id, &JobPatch::status(JobStatus::Running))
            .await?;

        let started = Instant::now();
        let outcome = self.execute(job).await;
        let execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (patch, result) = match &outcome {
            Ok(collected) => (
                JobPatch {
                    status: Some(JobStatus::Pending),
                    retry_count: Some(0),
                    last_run_at: Some(now),
                    next_run_at: Some(calculate_next_run(job.frequency, now)),
                    ..JobPatch::default()
                },
                JobResult {
                    id: Uuid::new_v4(),
                    job_id: job.id,
                    success: true,
                    payload: json!({
                        "platform": collected.platform,
                        "handle": collected.handle,
                        "posts_collected": collected.posts_collected,
                        "new_posts": collected.new_posts,
                    }),
                    error_message: None,
                    execution_time_ms,
                    changes_detected: collected.new_posts > 0,
                    retry_count: job.retry_count,
                    completed_at: Utc::now(),
                },
            ),
            Err(e) => (
                failure_patch(job, now),
                JobResult {
                    id: Uuid::new_v4(),
                    job_id: job.id,
                    success: false,
                    payload: json!({ "platform": job.platform(), "handle": job.target }),
                    error_message: Some(e.to_string()),
                    execution_time_ms,
                    changes_detected: false,
                    retry_count: job.retry_count,
                    completed_at: Utc::now(),
                },
            ),
        };

        // A pause or resume that landed mid-attempt keeps its status.
        let patch = JobPatch {
            status_if: Some(JobStatus::Running),
            ..patch
        };
        if let Err(e) = self.stores.jobs.update_job(job.id, &patch).await {
            tracing::error!(
                job_id = %job.id,
                error = %e,
                "processor: could not record job state after attempt"
            );
        }
        if let Err(e) = self.stores.jobs.insert_result(&result).await {
            tracing::error!(job_id = %job.id, error = %e, "processor: could not append job result");
        }

        match &outcome {
            Ok(collected) => {
                tracing::info!(
                    job_id = %job.id,
                    platform = %collected.platform,
                    posts = collected.posts_collected,
                    new_posts = collected.new_posts,
                    elapsed_ms = execution_time_ms,
                    "processor: job succeeded"
                );
                if collected.posts_collected > 0 {
                    self.triggers
                        .on_intelligence_gathered(job.user_id, as_count(collected.posts_collected))
                        .await;
                }
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    attempt = job.retry_count + 1,
                    max_retries = job.max_retries,
                    status = %patch.status.unwrap_or(JobStatus::Failed),
                    error = %e,
                    "processor: job failed"
                );
            }
        }

        Ok(result)
    }

    async fn execute(&self, job: &MonitoringJob) -> Result<Collected, JobError> {
        let JobConfig::SocialMedia {
            platform, handle, ..
        } = &job.config
        else {
            return Err(JobError::UnsupportedJobType(job.job_type.as_str()));
        };
        let platform = *platform;
        let monitor = self
            .monitors
            .get(platform)
            .ok_or(JobError::UnsupportedPlatform(platform))?;

        let api_key = match self
            .stores
            .directory
            .user_api_key(job.user_id, platform)
            .await
        {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    user_id = %job.user_id,
                    platform = %platform,
                    error = %e,
                    "processor: could not read user api key, using default"
                );
                None
            }
        };

        let posts = tokio::time::timeout(
            self.config.job_timeout,
            monitor.fetch(handle, api_key.as_deref()),
        )
        .await
        .map_err(|_| JobError::Timeout(self.config.job_timeout))?;

        let new_posts = self
            .stores
            .posts
            .save_posts(job.competitor_id, &posts)
            .await?;

        Ok(Collected {
            platform,
            handle: handle.clone(),
            posts_collected: posts.len(),
            new_posts,
        })
    }

    /// Analyzes every active competitor's recent posts and files alerts.
    ///
    /// A competitor already analyzed since its newest post was collected is
    /// counted as unchanged and files nothing. A failing competitor is logged
    /// and counted; the rest still run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only if the active competitors cannot be listed.
    pub async fn run_analysis_cycle(
        &self,
        now: DateTime<Utc>,
    ) -> Result<AnalysisSummary, StoreError> {
        let competitors = self.stores.directory.active_competitors().await?;
        let mut summary = AnalysisSummary {
            competitors: competitors.len(),
            ..AnalysisSummary::default()
        };

        for competitor in &competitors {
            match self.analyze(competitor, now).await {
                Ok(None) => summary.unchanged += 1,
                Ok(Some(alerts)) => {
                    summary.analyzed += 1;
                    summary.alerts += alerts;
                }
                Err(e) => {
                    summary.failures += 1;
                    tracing::warn!(
                        competitor_id = %competitor.id,
                        error = %e,
                        "analysis: competitor skipped"
                    );
                }
            }
        }

        Ok(summary)
    }

    /// `None` when nothing was collected since the last analysis.
    async fn analyze(
        &self,
        competitor: &Competitor,
        now: DateTime<Utc>,
    ) -> Result<Option<usize>, StoreError> {
        if let Some(analyzed_at) = competitor.last_analyzed {
            let collected_at = self.stores.posts.last_collected_at(competitor.id).await?;
            if collected_at.is_none_or(|at| at <= analyzed_at) {
                tracing::debug!(
                    competitor_id = %competitor.id,
                    last_analyzed = %analyzed_at,
                    "analysis: no new posts since last analysis"
                );
                return Ok(None);
            }
        }

        let options = AnalysisOptions {
            now,
            include_views: self.config.include_views,
        };
        let posts = self
            .stores
            .posts
            .posts_since(competitor.id, options.trend_window_start())
            .await?;

        let analysis = analyze_competitor(&posts, options);
        let alerts = generate_alerts(
            AlertTarget {
                competitor_id: competitor.id,
                user_id: competitor.user_id,
                competitor_name: &competitor.name,
            },
            &analysis.insights(),
        );

        for alert in &alerts {
            self.stores.alerts.insert_alert(alert).await?;
        }
        self.stores.directory.mark_analyzed(competitor.id, now).await?;

        let opportunities = alerts
            .iter()
            .filter(|a| a.alert_type.is_opportunity())
            .count();
        if opportunities > 0 {
            self.triggers
                .on_opportunity_identified(competitor.user_id, as_count(opportunities))
                .await;
        }

        tracing::debug!(
            competitor_id = %competitor.id,
            posts = posts.len(),
            platforms = analysis.platforms.len(),
            alerts = alerts.len(),
            "analysis: competitor analyzed"
        );
        Ok(Some(alerts.len()))
    }
}

/// Next state after a failed attempt: exponential backoff in minutes, or
/// `failed` once `max_retries` attempts have failed.
fn failure_patch(job: &MonitoringJob, now: DateTime<Utc>) -> JobPatch {
    let retry_count = job.retry_count.saturating_add(1);
    if retry_count >= job.max_retries {
        return JobPatch {
            status: Some(JobStatus::Failed),
            retry_count: Some(retry_count),
            ..JobPatch::default()
        };
    }

    JobPatch {
        status: Some(JobStatus::Pending),
        retry_count: Some(retry_count),
        next_run_at: Some(now + backoff(retry_count)),
        ..JobPatch::default()
    }
}

fn as_count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// `2^retry_count` minutes.
fn backoff(retry_count: u32) -> chrono::Duration {
    chrono::Duration::minutes(1_i64 << retry_count.min(20))
}

/// Holds the re-entrancy flag for one cycle.
struct CycleGuard<'a>(&'a AtomicBool);

impl<'a> CycleGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct InFlightClaim<'a> {
    set: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl<'a> InFlightClaim<'a> {
    fn acquire(set: &'a Mutex<HashSet<Uuid>>, id: Uuid) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        inserted.then_some(Self { set, id })
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[cfg(test)]
#[path = "processor_test.rs"]
mod tests;
