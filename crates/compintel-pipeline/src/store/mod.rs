//! Persistence seams used by the scheduler and processor.
//!
//! The traits speak domain types; [`PgStore`] adapts them to `compintel-db`.

mod pg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compintel_core::{
    Competitor, Frequency, JobConfig, JobResult, JobStatus, JobType, MonitoringJob, NewAlert,
    Platform, Post, Priority,
};
use compintel_db::DbError;
use thiserror::Error;
use uuid::Uuid;

pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("stored {entity} {id} is malformed: {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },
    #[error("could not encode {entity}: {source}")]
    Encode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            other => Self::Db(other),
        }
    }
}

/// Column changes for one job. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    /// When set, `status` is only written if the job is still in this state.
    pub status_if: Option<JobStatus>,
    pub retry_count: Option<u32>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub frequency: Option<Frequency>,
    pub config: Option<JobConfig>,
}

impl JobPatch {
    #[must_use]
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether `status` would be written to a job currently in `current`.
    #[must_use]
    pub fn writes_status(&self, current: JobStatus) -> bool {
        self.status.is_some() && self.status_if.is_none_or(|expected| expected == current)
    }

    /// Applies the patch to an in-memory copy of the job.
    pub fn apply(&self, job: &mut MonitoringJob) {
        if let Some(status) = self.status.filter(|_| self.writes_status(job.status)) {
            job.status = status;
        }
        if let Some(retry_count) = self.retry_count {
            job.retry_count = retry_count;
        }
        if let Some(next_run_at) = self.next_run_at {
            job.next_run_at = next_run_at;
        }
        if let Some(last_run_at) = self.last_run_at {
            job.last_run_at = Some(last_run_at);
        }
        if let Some(priority) = self.priority {
            job.priority = priority;
        }
        if let Some(frequency) = self.frequency {
            job.frequency = frequency;
        }
        if let Some(config) = &self.config {
            job.config = config.clone();
        }
    }
}

/// Which jobs a processing pass picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueJobs {
    pub job_type: JobType,
    pub status: JobStatus,
    pub due_at: DateTime<Utc>,
}

impl DueJobs {
    /// Pending social-media jobs due at or before `now`.
    #[must_use]
    pub fn social_at(now: DateTime<Utc>) -> Self {
        Self {
            job_type: JobType::SocialMedia,
            status: JobStatus::Pending,
            due_at: now,
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &MonitoringJob) -> Result<(), StoreError>;

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<(), StoreError>;

    /// Due jobs, highest priority first.
    async fn select_due_jobs(&self, due: DueJobs) -> Result<Vec<MonitoringJob>, StoreError>;

    async fn select_by_competitor(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
        job_type: JobType,
    ) -> Result<Vec<MonitoringJob>, StoreError>;

    async fn insert_result(&self, result: &JobResult) -> Result<(), StoreError>;

    /// Removes results completed before `cutoff` and returns how many went.
    async fn delete_results_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CompetitorDirectory: Send + Sync {
    /// `None` when absent or owned by another user.
    async fn competitor(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Competitor>, StoreError>;

    async fn active_competitors(&self) -> Result<Vec<Competitor>, StoreError>;

    async fn mark_analyzed(&self, competitor_id: Uuid, at: DateTime<Utc>)
        -> Result<(), StoreError>;

    async fn user_api_key(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<String>, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Stores posts not seen before and returns how many were new.
    async fn save_posts(&self, competitor_id: Uuid, posts: &[Post]) -> Result<u64, StoreError>;

    async fn posts_since(
        &self,
        competitor_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError>;

    /// When the newest stored post for the competitor was collected.
    async fn last_collected_at(&self, competitor_id: Uuid)
        -> Result<Option<DateTime<Utc>>, StoreError>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn insert_alert(&self, alert: &NewAlert) -> Result<Uuid, StoreError>;
}
