use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compintel_core::{
    Competitor, ContentType, Frequency, JobConfig, JobResult, JobStatus, JobType, MonitoringJob,
    MonitoringStatus, NewAlert, Platform, Post, Priority, ScheduleKind,
};
use compintel_db::{
    CompetitorPostRow, CompetitorRow, JobResultRow, JobUpdate, MonitoringJobRow, NewAlertRow,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AlertStore, CompetitorDirectory, DueJobs, JobPatch, JobStore, PostStore, StoreError};

/// Every store trait over one Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &MonitoringJob) -> Result<(), StoreError> {
        let row = job_to_row(job)?;
        compintel_db::insert_monitoring_job(&self.pool, &row).await?;
        Ok(())
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<(), StoreError> {
        let config = patch
            .config
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|source| StoreError::Encode {
                entity: "job config",
                source,
            })?;
        let update = JobUpdate {
            status: patch.status.map(JobStatus::as_str),
            status_if: patch.status_if.map(JobStatus::as_str),
            retry_count: patch.retry_count.map(to_i32),
            next_run_at: patch.next_run_at,
            last_run_at: patch.last_run_at,
            priority: patch.priority.map(Priority::as_str),
            schedule_value: patch.frequency.map(Frequency::as_str),
            config: config.as_ref(),
        };
        compintel_db::update_monitoring_job(&self.pool, job_id, &update).await?;
        Ok(())
    }

    async fn select_due_jobs(&self, due: DueJobs) -> Result<Vec<MonitoringJob>, StoreError> {
        let rows = compintel_db::list_due_jobs(
            &self.pool,
            due.job_type.as_str(),
            due.status.as_str(),
            due.due_at,
        )
        .await?;
        Ok(jobs_from_rows(rows))
    }

    async fn select_by_competitor(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
        job_type: JobType,
    ) -> Result<Vec<MonitoringJob>, StoreError> {
        let rows = compintel_db::list_jobs_for_competitor(
            &self.pool,
            competitor_id,
            user_id,
            job_type.as_str(),
        )
        .await?;
        Ok(jobs_from_rows(rows))
    }

    async fn insert_result(&self, result: &JobResult) -> Result<(), StoreError> {
        compintel_db::insert_job_result(&self.pool, &result_to_row(result)).await?;
        Ok(())
    }

    async fn delete_results_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(compintel_db::delete_job_results_before(&self.pool, cutoff).await?)
    }
}

#[async_trait]
impl CompetitorDirectory for PgStore {
    async fn competitor(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Competitor>, StoreError> {
        compintel_db::get_competitor(&self.pool, competitor_id, user_id)
            .await?
            .map(competitor_from_row)
            .transpose()
    }

    async fn active_competitors(&self) -> Result<Vec<Competitor>, StoreError> {
        let rows = compintel_db::list_active_competitors(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                competitor_from_row(row)
                    .map_err(|e| tracing::warn!(error = %e, "analysis: skipping competitor row"))
                    .ok()
            })
            .collect())
    }

    async fn mark_analyzed(
        &self,
        competitor_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        compintel_db::set_last_analyzed(&self.pool, competitor_id, at).await?;
        Ok(())
    }

    async fn user_api_key(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<String>, StoreError> {
        Ok(compintel_db::get_user_api_key(&self.pool, user_id, platform.as_str()).await?)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn save_posts(&self, competitor_id: Uuid, posts: &[Post]) -> Result<u64, StoreError> {
        let rows: Vec<CompetitorPostRow> = posts
            .iter()
            .map(|post| post_to_row(competitor_id, post))
            .collect();
        Ok(compintel_db::insert_competitor_posts(&self.pool, &rows).await?)
    }

    async fn posts_since(
        &self,
        competitor_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        let rows = compintel_db::list_competitor_posts_since(&self.pool, competitor_id, since).await?;
        rows.into_iter().map(post_from_row).collect()
    }

    async fn last_collected_at(
        &self,
        competitor_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(compintel_db::latest_post_collected_at(&self.pool, competitor_id).await?)
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn insert_alert(&self, alert: &NewAlert) -> Result<Uuid, StoreError> {
        let row = alert_to_row(alert)?;
        Ok(compintel_db::insert_alert(&self.pool, &row).await?)
    }
}

fn jobs_from_rows(rows: Vec<MonitoringJobRow>) -> Vec<MonitoringJob> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            job_from_row(row)
                .map_err(|e| tracing::warn!(job_id = %id, error = %e, "processor: skipping job row"))
                .ok()
        })
        .collect()
}

fn corrupt(entity: &'static str, id: impl ToString, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        entity,
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_i64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub(crate) fn job_to_row(job: &MonitoringJob) -> Result<MonitoringJobRow, StoreError> {
    let config = serde_json::to_value(&job.config).map_err(|source| StoreError::Encode {
        entity: "job config",
        source,
    })?;
    Ok(MonitoringJobRow {
        id: job.id,
        competitor_id: job.competitor_id,
        user_id: job.user_id,
        job_type: job.job_type.as_str().to_string(),
        target: job.target.clone(),
        priority: job.priority.as_str().to_string(),
        schedule_kind: job.schedule_kind.as_str().to_string(),
        schedule_value: job.frequency.as_str().to_string(),
        status: job.status.as_str().to_string(),
        retry_count: to_i32(job.retry_count),
        max_retries: to_i32(job.max_retries),
        next_run_at: job.next_run_at,
        last_run_at: job.last_run_at,
        config,
        created_at: job.created_at,
    })
}

pub(crate) fn job_from_row(row: MonitoringJobRow) -> Result<MonitoringJob, StoreError> {
    let bad = |reason: String| corrupt("job", row.id, reason);

    let job_type = JobType::from_str(&row.job_type).map_err(|e| bad(e.to_string()))?;
    let status = JobStatus::from_str(&row.status).map_err(|e| bad(e.to_string()))?;
    let priority = Priority::from_str(&row.priority).map_err(|e| bad(e.to_string()))?;
    let config: JobConfig =
        serde_json::from_value(row.config.clone()).map_err(|e| bad(e.to_string()))?;
    if config.job_type() != job_type {
        return Err(bad(format!(
            "config is for {} but job_type is {}",
            config.job_type().as_str(),
            job_type.as_str()
        )));
    }

    Ok(MonitoringJob {
        id: row.id,
        competitor_id: row.competitor_id,
        user_id: row.user_id,
        job_type,
        target: row.target,
        priority,
        schedule_kind: ScheduleKind::Interval,
        frequency: Frequency::parse_lossy(&row.schedule_value),
        status,
        retry_count: u32::try_from(row.retry_count).unwrap_or(0),
        max_retries: u32::try_from(row.max_retries).unwrap_or(1).max(1),
        next_run_at: row.next_run_at,
        last_run_at: row.last_run_at,
        config,
        created_at: row.created_at,
    })
}

pub(crate) fn result_to_row(result: &JobResult) -> JobResultRow {
    JobResultRow {
        id: result.id,
        job_id: result.job_id,
        success: result.success,
        result_data: result.payload.clone(),
        error_message: result.error_message.clone(),
        execution_time_ms: to_i64(result.execution_time_ms),
        changes_detected: result.changes_detected,
        retry_count: to_i32(result.retry_count),
        completed_at: result.completed_at,
    }
}

/// Unknown platform keys and non-string handles are ignored.
pub(crate) fn competitor_from_row(row: CompetitorRow) -> Result<Competitor, StoreError> {
    let monitoring_status = MonitoringStatus::from_str(&row.monitoring_status)
        .map_err(|e| corrupt("competitor", row.id, e))?;

    let social_media_handles: BTreeMap<Platform, String> = match &row.social_media_handles {
        serde_json::Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| {
                let platform = Platform::from_str(key).ok()?;
                let handle = value.as_str()?;
                Some((platform, handle.to_string()))
            })
            .collect(),
        serde_json::Value::Null => BTreeMap::new(),
        other => {
            return Err(corrupt(
                "competitor",
                row.id,
                format!("social_media_handles is not an object: {other}"),
            ))
        }
    };

    Ok(Competitor {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        social_media_handles,
        monitoring_status,
        last_analyzed: row.last_analyzed,
    })
}

pub(crate) fn post_to_row(competitor_id: Uuid, post: &Post) -> CompetitorPostRow {
    CompetitorPostRow {
        competitor_id,
        platform: post.platform.as_str().to_string(),
        external_id: post.external_id.clone(),
        content_type: post.content_type.as_str().to_string(),
        text: post.text.clone(),
        url: post.url.clone(),
        posted_at: post.posted_at,
        likes: to_i64(post.likes),
        shares: to_i64(post.shares),
        comments: to_i64(post.comments),
        views: post.views.map(to_i64),
    }
}

pub(crate) fn post_from_row(row: CompetitorPostRow) -> Result<Post, StoreError> {
    let platform =
        Platform::from_str(&row.platform).map_err(|e| corrupt("post", &row.external_id, e))?;
    let content_type = ContentType::from_str(&row.content_type).unwrap_or(ContentType::Text);

    Ok(Post {
        platform,
        external_id: row.external_id,
        content_type,
        text: row.text,
        url: row.url,
        posted_at: row.posted_at,
        likes: from_i64(row.likes),
        shares: from_i64(row.shares),
        comments: from_i64(row.comments),
        views: row.views.map(from_i64),
    })
}

pub(crate) fn alert_to_row(alert: &NewAlert) -> Result<NewAlertRow, StoreError> {
    let encode = |source| StoreError::Encode {
        entity: "alert",
        source,
    };
    Ok(NewAlertRow {
        competitor_id: alert.competitor_id,
        user_id: alert.user_id,
        alert_type: alert.alert_type.as_str().to_string(),
        severity: alert.severity.as_str().to_string(),
        title: alert.title.clone(),
        description: alert.description.clone(),
        source_data: alert.source_data.clone(),
        action_items: serde_json::to_value(&alert.action_items).map_err(encode)?,
        recommended_actions: serde_json::to_value(&alert.recommended_actions).map_err(encode)?,
    })
}

#[cfg(test)]
#[path = "pg_test.rs"]
mod tests;
