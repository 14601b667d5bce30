//! Database operations for the append-only `job_results` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `job_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobResultRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub success: bool,
    pub result_data: serde_json::Value,
    pub error_message: Option<String>,
    pub execution_time_ms: i64,
    pub changes_detected: bool,
    pub retry_count: i32,
    pub completed_at: DateTime<Utc>,
}

/// Appends one attempt record.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_job_result(pool: &PgPool, row: &JobResultRow) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO job_results \
             (id, job_id, success, result_data, error_message, execution_time_ms, \
              changes_detected, retry_count, completed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(row.id)
    .bind(row.job_id)
    .bind(row.success)
    .bind(&row.result_data)
    .bind(row.error_message.as_deref())
    .bind(row.execution_time_ms)
    .bind(row.changes_detected)
    .bind(row.retry_count)
    .bind(row.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deletes results completed strictly before `cutoff`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_job_results_before(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM job_results WHERE completed_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Most recent results for a job, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_job_results(
    pool: &PgPool,
    job_id: Uuid,
    limit: i64,
) -> Result<Vec<JobResultRow>, DbError> {
    let rows = sqlx::query_as::<_, JobResultRow>(
        "SELECT id, job_id, success, result_data, error_message, execution_time_ms, \
                changes_detected, retry_count, completed_at \
         FROM job_results \
         WHERE job_id = $1 \
         ORDER BY completed_at DESC \
         LIMIT $2",
    )
    .bind(job_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
