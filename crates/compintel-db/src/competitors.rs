//! Read access to `competitors` and `user_api_keys`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `competitors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub social_media_handles: serde_json::Value,
    pub monitoring_status: String,
    pub last_analyzed: Option<DateTime<Utc>>,
}

/// Fetches a competitor owned by `user_id`. Returns `None` when absent or owned by someone else.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_competitor(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<CompetitorRow>, DbError> {
    let row = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, user_id, name, social_media_handles, monitoring_status, last_analyzed \
         FROM competitors \
         WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All competitors with `monitoring_status = 'active'`, across every user.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_competitors(pool: &PgPool) -> Result<Vec<CompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorRow>(
        "SELECT id, user_id, name, social_media_handles, monitoring_status, last_analyzed \
         FROM competitors \
         WHERE monitoring_status = 'active' \
         ORDER BY last_analyzed ASC NULLS FIRST, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamps `last_analyzed`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the competitor does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_last_analyzed(
    pool: &PgPool,
    id: Uuid,
    at: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE competitors SET last_analyzed = $2 WHERE id = $1")
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// The user's stored credential for `platform`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_api_key(
    pool: &PgPool,
    user_id: Uuid,
    platform: &str,
) -> Result<Option<String>, DbError> {
    let key = sqlx::query_scalar::<_, String>(
        "SELECT api_key FROM user_api_keys WHERE user_id = $1 AND platform = $2",
    )
    .bind(user_id)
    .bind(platform)
    .fetch_optional(pool)
    .await?;

    Ok(key)
}
