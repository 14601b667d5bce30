//! Creates and manages monitoring jobs for a competitor.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use compintel_core::{
    Frequency, JobConfig, JobStatus, JobType, MonitoringJob, MonitoringSettings, Platform,
    Priority,
};
use compintel_gamification::GamificationTriggers;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{CompetitorDirectory, JobPatch, JobStore, StoreError};

/// Retention applied when a caller does not choose one.
pub const DEFAULT_RESULT_RETENTION_DAYS: u32 = 30;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("competitor {0} not found")]
    CompetitorNotFound(Uuid),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Options for [`MonitoringScheduler::schedule_monitoring`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringRequest {
    /// Platforms to watch; `None` means [`Platform::DEFAULTS`].
    pub platforms: Option<Vec<Platform>>,
    pub frequency: Frequency,
    pub priority: Priority,
    pub monitoring: MonitoringSettings,
}

impl MonitoringRequest {
    fn platforms(&self) -> Vec<Platform> {
        self.platforms
            .clone()
            .unwrap_or_else(|| Platform::DEFAULTS.to_vec())
    }
}

/// Changes for [`MonitoringScheduler::update_monitoring_config`]. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringUpdate {
    pub platforms: Option<Vec<Platform>>,
    pub frequency: Option<Frequency>,
    pub priority: Option<Priority>,
    /// `true` pauses every job, `false` makes them runnable again.
    pub paused: Option<bool>,
    pub track_engagement: Option<bool>,
    pub keywords: Option<Vec<String>>,
}

/// What an update did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub updated: usize,
    pub created: Vec<Uuid>,
    pub paused: usize,
}

/// `from` plus one schedule interval.
#[must_use]
pub fn calculate_next_run(frequency: Frequency, from: DateTime<Utc>) -> DateTime<Utc> {
    from + frequency.interval()
}

#[derive(Clone)]
pub struct MonitoringScheduler {
    jobs: Arc<dyn JobStore>,
    directory: Arc<dyn CompetitorDirectory>,
    triggers: Option<GamificationTriggers>,
    max_retries: u32,
}

impl MonitoringScheduler {
    #[must_use]
    pub fn new(
        jobs: Arc<dyn JobStore>,
        directory: Arc<dyn CompetitorDirectory>,
        max_retries: u32,
    ) -> Self {
        Self {
            jobs,
            directory,
            triggers: None,
            max_retries: max_retries.max(1),
        }
    }

    /// Fires `competitor_added` the first time a competitor gets jobs.
    #[must_use]
    pub fn with_triggers(mut self, triggers: GamificationTriggers) -> Self {
        self.triggers = Some(triggers);
        self
    }

    /// Creates one job per requested platform the competitor has a handle for.
    ///
    /// Platforms that already have a job are skipped, as are platforms
    /// without a handle. A failed insert is logged and skipped so the
    /// remaining platforms still get scheduled. Returns the new job ids.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::CompetitorNotFound`] if the competitor does
    /// not exist for this user, or [`SchedulerError::Store`] if existing jobs
    /// cannot be read.
    pub async fn schedule_monitoring(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
        request: &MonitoringRequest,
    ) -> Result<Vec<Uuid>, SchedulerError> {
        let existing = self
            .jobs
            .select_by_competitor(competitor_id, user_id, JobType::SocialMedia)
            .await?;

        let created = self
            .create_jobs(
                competitor_id,
                user_id,
                &request.platforms(),
                &existing,
                JobTemplate {
                    frequency: request.frequency,
                    priority: request.priority,
                    monitoring: &request.monitoring,
                },
            )
            .await?;

        if existing.is_empty() && !created.is_empty() {
            if let Some(triggers) = &self.triggers {
                triggers.on_competitor_added(user_id).await;
            }
        }

        tracing::info!(
            competitor_id = %competitor_id,
            user_id = %user_id,
            created = created.len(),
            "scheduler: monitoring scheduled"
        );
        Ok(created)
    }

    /// Pauses every job of the competitor that is not already paused.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] on the first failed read or write.
    pub async fn pause_monitoring(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
    ) -> Result<usize, SchedulerError> {
        let jobs = self.monitoring_status(competitor_id, user_id).await?;
        let mut paused = 0;
        for job in jobs.iter().filter(|j| j.status != JobStatus::Paused) {
            self.jobs
                .update_job(job.id, &JobPatch::status(JobStatus::Paused))
                .await?;
            paused += 1;
        }

        tracing::info!(
            competitor_id = %competitor_id,
            user_id = %user_id,
            paused,
            "scheduler: monitoring paused"
        );
        Ok(paused)
    }

    /// Makes paused and failed jobs runnable immediately.
    ///
    /// Jobs coming out of `failed` start with a fresh retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] on the first failed read or write.
    pub async fn resume_monitoring(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
    ) -> Result<usize, SchedulerError> {
        let now = Utc::now();
        let jobs = self.monitoring_status(competitor_id, user_id).await?;
        let mut resumed = 0;
        for job in &jobs {
            let patch = match job.status {
                JobStatus::Paused => JobPatch {
                    status: Some(JobStatus::Pending),
                    next_run_at: Some(now),
                    ..JobPatch::default()
                },
                JobStatus::Failed => JobPatch {
                    status: Some(JobStatus::Pending),
                    next_run_at: Some(now),
                    retry_count: Some(0),
                    ..JobPatch::default()
                },
                JobStatus::Pending | JobStatus::Running => continue,
            };
            self.jobs.update_job(job.id, &patch).await?;
            resumed += 1;
        }

        tracing::info!(
            competitor_id = %competitor_id,
            user_id = %user_id,
            resumed,
            "scheduler: monitoring resumed"
        );
        Ok(resumed)
    }

    /// Merges `update` into the competitor's jobs.
    ///
    /// Settings and schedule changes apply to every existing job. When
    /// `platforms` is given, jobs are created for newly listed platforms,
    /// jobs for platforms no longer listed are paused, and paused jobs whose
    /// platform is listed again resume. Nothing is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] if a read or an update of an
    /// existing job fails.
    pub async fn update_monitoring_config(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
        update: &MonitoringUpdate,
    ) -> Result<UpdateSummary, SchedulerError> {
        let now = Utc::now();
        let existing = self.monitoring_status(competitor_id, user_id).await?;
        let wanted: Option<BTreeSet<Platform>> = update
            .platforms
            .as_ref()
            .map(|p| p.iter().copied().collect());

        let mut summary = UpdateSummary::default();
        for job in &existing {
            let listing = match (&wanted, job.platform()) {
                (Some(wanted), Some(platform)) if wanted.contains(&platform) => Listing::Listed,
                (Some(_), Some(_)) => Listing::Dropped,
                _ => Listing::Unchanged,
            };
            let patch = patch_for(job, update, listing, now);
            if patch == JobPatch::default() {
                continue;
            }
            self.jobs.update_job(job.id, &patch).await?;
            if listing == Listing::Dropped {
                summary.paused += 1;
            } else {
                summary.updated += 1;
            }
        }

        if let Some(platforms) = &update.platforms {
            let template_job = existing.first();
            let monitoring = merged_settings(template_job, update);
            let template = JobTemplate {
                frequency: update
                    .frequency
                    .or(template_job.map(|j| j.frequency))
                    .unwrap_or_default(),
                priority: update
                    .priority
                    .or(template_job.map(|j| j.priority))
                    .unwrap_or_default(),
                monitoring: &monitoring,
            };
            summary.created = self
                .create_jobs(competitor_id, user_id, platforms, &existing, template)
                .await?;
        }

        tracing::info!(
            competitor_id = %competitor_id,
            user_id = %user_id,
            updated = summary.updated,
            created = summary.created.len(),
            paused = summary.paused,
            "scheduler: monitoring config updated"
        );
        Ok(summary)
    }

    /// Deletes results older than `days_to_keep` days. Jobs are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] if the delete fails.
    pub async fn cleanup_old_results(&self, days_to_keep: u32) -> Result<u64, SchedulerError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_to_keep));
        let deleted = self.jobs.delete_results_older_than(cutoff).await?;
        tracing::info!(
            days_to_keep,
            deleted,
            cutoff = %cutoff,
            "scheduler: old job results removed"
        );
        Ok(deleted)
    }

    /// The competitor's social-media jobs, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Store`] if the read fails.
    pub async fn monitoring_status(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MonitoringJob>, SchedulerError> {
        Ok(self
            .jobs
            .select_by_competitor(competitor_id, user_id, JobType::SocialMedia)
            .await?)
    }

    async fn create_jobs(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
        platforms: &[Platform],
        existing: &[MonitoringJob],
        template: JobTemplate<'_>,
    ) -> Result<Vec<Uuid>, SchedulerError> {
        let competitor = self
            .directory
            .competitor(competitor_id, user_id)
            .await?
            .ok_or(SchedulerError::CompetitorNotFound(competitor_id))?;

        let mut covered: BTreeSet<Platform> =
            existing.iter().filter_map(MonitoringJob::platform).collect();
        let now = Utc::now();
        let mut created = Vec::new();

        for &platform in platforms {
            if !covered.insert(platform) {
                continue;
            }
            let Some(handle) = competitor.handle_for(platform) else {
                tracing::debug!(
                    competitor_id = %competitor_id,
                    platform = %platform,
                    "scheduler: no handle, platform skipped"
                );
                continue;
            };

            let mut job = MonitoringJob::new(
                competitor_id,
                user_id,
                JobConfig::SocialMedia {
                    platform,
                    handle: handle.to_string(),
                    monitoring: template.monitoring.clone(),
                },
                template.priority,
                template.frequency,
                calculate_next_run(template.frequency, now),
            );
            job.max_retries = self.max_retries;

            match self.jobs.insert_job(&job).await {
                Ok(()) => created.push(job.id),
                Err(e) => {
                    tracing::warn!(
                        competitor_id = %competitor_id,
                        platform = %platform,
                        error = %e,
                        "scheduler: could not create job"
                    );
                }
            }
        }

        Ok(created)
    }
}

#[derive(Clone, Copy)]
struct JobTemplate<'a> {
    frequency: Frequency,
    priority: Priority,
    monitoring: &'a MonitoringSettings,
}

fn merged_settings(job: Option<&MonitoringJob>, update: &MonitoringUpdate) -> MonitoringSettings {
    let mut settings = match job.map(|j| &j.config) {
        Some(JobConfig::SocialMedia { monitoring, .. }) => monitoring.clone(),
        _ => MonitoringSettings::default(),
    };
    if let Some(track) = update.track_engagement {
        settings.track_engagement = track;
    }
    if let Some(keywords) = &update.keywords {
        settings.keywords.clone_from(keywords);
    }
    settings
}

/// Where a job's platform stands against the update's platform list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    /// No platform list was given.
    Unchanged,
    Listed,
    Dropped,
}

fn patch_for(
    job: &MonitoringJob,
    update: &MonitoringUpdate,
    listing: Listing,
    now: DateTime<Utc>,
) -> JobPatch {
    if listing == Listing::Dropped {
        return if job.status == JobStatus::Paused {
            JobPatch::default()
        } else {
            JobPatch::status(JobStatus::Paused)
        };
    }

    let mut patch = JobPatch::default();

    if update.track_engagement.is_some() || update.keywords.is_some() {
        if let JobConfig::SocialMedia {
            platform, handle, ..
        } = &job.config
        {
            let config = JobConfig::SocialMedia {
                platform: *platform,
                handle: handle.clone(),
                monitoring: merged_settings(Some(job), update),
            };
            if config != job.config {
                patch.config = Some(config);
            }
        }
    }

    if let Some(priority) = update.priority.filter(|p| *p != job.priority) {
        patch.priority = Some(priority);
    }

    if let Some(frequency) = update.frequency.filter(|f| *f != job.frequency) {
        patch.frequency = Some(frequency);
        patch.next_run_at = Some(calculate_next_run(frequency, now));
    }

    match update.paused {
        Some(true) if job.status != JobStatus::Paused => {
            patch.status = Some(JobStatus::Paused);
        }
        Some(false) if matches!(job.status, JobStatus::Paused | JobStatus::Failed) => {
            patch.status = Some(JobStatus::Pending);
            patch.next_run_at = Some(now);
            if job.status == JobStatus::Failed {
                patch.retry_count = Some(0);
            }
        }
        Some(true) => {}
        _ if listing == Listing::Listed && job.status == JobStatus::Paused => {
            patch.status = Some(JobStatus::Pending);
            patch.next_run_at = Some(now);
        }
        _ => {}
    }

    patch
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
