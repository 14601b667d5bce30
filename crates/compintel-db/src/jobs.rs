//! Database operations for `monitoring_jobs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const JOB_COLUMNS: &str = "id, competitor_id, user_id, job_type, target, priority, \
     schedule_kind, schedule_value, status, retry_count, max_retries, \
     next_run_at, last_run_at, config, created_at";

/// A row from the `monitoring_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonitoringJobRow {
    pub id: Uuid,
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub job_type: String,
    pub target: String,
    pub priority: String,
    pub schedule_kind: String,
    pub schedule_value: String,
    pub status: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Column changes for [`update_monitoring_job`]. `None` leaves a column as is.
///
/// `last_run_at` cannot be cleared through this type; it only ever moves forward.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate<'a> {
    pub status: Option<&'a str>,
    /// When set, `status` is only written if the stored status equals this.
    /// The other columns are written either way.
    pub status_if: Option<&'a str>,
    pub retry_count: Option<i32>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub priority: Option<&'a str>,
    pub schedule_value: Option<&'a str>,
    pub config: Option<&'a serde_json::Value>,
}

/// Inserts a job row exactly as given.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when the
/// competitor already has a social job for the same platform.
pub async fn insert_monitoring_job(pool: &PgPool, job: &MonitoringJobRow) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO monitoring_jobs \
             (id, competitor_id, user_id, job_type, target, priority, schedule_kind, \
              schedule_value, status, retry_count, max_retries, next_run_at, last_run_at, \
              config, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(job.id)
    .bind(job.competitor_id)
    .bind(job.user_id)
    .bind(&job.job_type)
    .bind(&job.target)
    .bind(&job.priority)
    .bind(&job.schedule_kind)
    .bind(&job.schedule_value)
    .bind(&job.status)
    .bind(job.retry_count)
    .bind(job.max_retries)
    .bind(job.next_run_at)
    .bind(job.last_run_at)
    .bind(&job.config)
    .bind(job.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Applies a single-row partial update.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no job has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_monitoring_job(
    pool: &PgPool,
    id: Uuid,
    update: &JobUpdate<'_>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE monitoring_jobs SET \
             status         = CASE WHEN $9::text IS NULL OR status = $9 \
                                   THEN COALESCE($2, status) ELSE status END, \
             retry_count    = COALESCE($3, retry_count), \
             next_run_at    = COALESCE($4, next_run_at), \
             last_run_at    = COALESCE($5, last_run_at), \
             priority       = COALESCE($6, priority), \
             schedule_value = COALESCE($7, schedule_value), \
             config         = COALESCE($8, config), \
             updated_at     = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(update.status)
    .bind(update.retry_count)
    .bind(update.next_run_at)
    .bind(update.last_run_at)
    .bind(update.priority)
    .bind(update.schedule_value)
    .bind(update.config)
    .bind(update.status_if)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fetches a single job by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, or [`DbError::Sqlx`] on query failure.
pub async fn get_monitoring_job(pool: &PgPool, id: Uuid) -> Result<MonitoringJobRow, DbError> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM monitoring_jobs WHERE id = $1");
    sqlx::query_as::<_, MonitoringJobRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns jobs of `job_type` in `status` whose `next_run_at` is at or before `due_at`.
///
/// High-priority jobs come first, then the longest-overdue.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_due_jobs(
    pool: &PgPool,
    job_type: &str,
    status: &str,
    due_at: DateTime<Utc>,
) -> Result<Vec<MonitoringJobRow>, DbError> {
    let sql = format!(
        "SELECT {JOB_COLUMNS} FROM monitoring_jobs \
         WHERE job_type = $1 AND status = $2 AND next_run_at <= $3 \
         ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, \
                  next_run_at ASC"
    );
    let rows = sqlx::query_as::<_, MonitoringJobRow>(&sql)
        .bind(job_type)
        .bind(status)
        .bind(due_at)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns every job of `job_type` owned by the competitor/user pair.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_jobs_for_competitor(
    pool: &PgPool,
    competitor_id: Uuid,
    user_id: Uuid,
    job_type: &str,
) -> Result<Vec<MonitoringJobRow>, DbError> {
    let sql = format!(
        "SELECT {JOB_COLUMNS} FROM monitoring_jobs \
         WHERE competitor_id = $1 AND user_id = $2 AND job_type = $3 \
         ORDER BY created_at ASC"
    );
    let rows = sqlx::query_as::<_, MonitoringJobRow>(&sql)
        .bind(competitor_id)
        .bind(user_id)
        .bind(job_type)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
