//! Database operations for `competitor_alerts`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const ALERT_COLUMNS: &str = "id, competitor_id, user_id, alert_type, severity, title, \
     description, source_data, action_items, recommended_actions, is_read, is_archived, created_at";

/// Insert payload for an alert. JSON columns are pre-serialized by the caller.
#[derive(Debug, Clone)]
pub struct NewAlertRow {
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub source_data: serde_json::Value,
    pub action_items: serde_json::Value,
    pub recommended_actions: serde_json::Value,
}

/// A row from the `competitor_alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    pub id: Uuid,
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub alert_type: String,
    pub severity: String,
    pub title: String,
    pub description: String,
    pub source_data: serde_json::Value,
    pub action_items: serde_json::Value,
    pub recommended_actions: serde_json::Value,
    pub is_read: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Optional filters for [`list_alerts`]. Archived alerts are always excluded.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter<'a> {
    pub competitor_id: Option<Uuid>,
    pub severity: Option<&'a str>,
    pub unread_only: bool,
    pub limit: i64,
}

/// Inserts an alert and returns its generated id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_alert(pool: &PgPool, alert: &NewAlertRow) -> Result<Uuid, DbError> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO competitor_alerts \
             (id, competitor_id, user_id, alert_type, severity, title, description, \
              source_data, action_items, recommended_actions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(alert.competitor_id)
    .bind(alert.user_id)
    .bind(&alert.alert_type)
    .bind(&alert.severity)
    .bind(&alert.title)
    .bind(&alert.description)
    .bind(&alert.source_data)
    .bind(&alert.action_items)
    .bind(&alert.recommended_actions)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Lists a user's non-archived alerts, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_alerts(
    pool: &PgPool,
    user_id: Uuid,
    filter: &AlertFilter<'_>,
) -> Result<Vec<AlertRow>, DbError> {
    let sql = format!(
        "SELECT {ALERT_COLUMNS} FROM competitor_alerts \
         WHERE user_id = $1 \
           AND is_archived = false \
           AND ($2::UUID IS NULL OR competitor_id = $2) \
           AND ($3::TEXT IS NULL OR severity = $3) \
           AND (NOT $4 OR is_read = false) \
         ORDER BY created_at DESC \
         LIMIT $5"
    );
    let rows = sqlx::query_as::<_, AlertRow>(&sql)
        .bind(user_id)
        .bind(filter.competitor_id)
        .bind(filter.severity)
        .bind(filter.unread_only)
        .bind(filter.limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Fetches one alert owned by `user_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if absent, or [`DbError::Sqlx`] on query failure.
pub async fn get_alert(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<AlertRow, DbError> {
    let sql = format!("SELECT {ALERT_COLUMNS} FROM competitor_alerts WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, AlertRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Marks an alert read. Returns `true` when it was previously unread.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the alert does not exist for the user, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn mark_alert_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<bool, DbError> {
    let previous = sqlx::query_scalar::<_, bool>(
        "UPDATE competitor_alerts a SET is_read = true \
         FROM (SELECT id, is_read FROM competitor_alerts WHERE id = $1 AND user_id = $2 FOR UPDATE) prev \
         WHERE a.id = prev.id \
         RETURNING prev.is_read",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(!previous)
}

/// Archives an alert so it no longer appears in listings.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the alert does not exist for the user, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn archive_alert(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE competitor_alerts SET is_archived = true WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
