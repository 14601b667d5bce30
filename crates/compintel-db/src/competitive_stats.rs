//! Per-user counters in `competitive_stats` and unlocked `competitive_achievements`.

use chrono::{DateTime, Utc};
use compintel_core::StatCounter;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `competitive_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitiveStatsRow {
    pub user_id: Uuid,
    pub competitors_monitored: i64,
    pub intelligence_gathered: i64,
    pub alerts_processed: i64,
    pub opportunities_identified: i64,
    pub competitive_tasks_completed: i64,
    pub market_victories: i64,
    pub threat_responses: i64,
    pub intelligence_streaks: i64,
    pub competitive_advantage_points: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<CompetitiveStatsRow> for compintel_core::CompetitiveStats {
    fn from(row: CompetitiveStatsRow) -> Self {
        Self {
            user_id: row.user_id,
            competitors_monitored: row.competitors_monitored,
            intelligence_gathered: row.intelligence_gathered,
            alerts_processed: row.alerts_processed,
            opportunities_identified: row.opportunities_identified,
            competitive_tasks_completed: row.competitive_tasks_completed,
            market_victories: row.market_victories,
            threat_responses: row.threat_responses,
            intelligence_streaks: row.intelligence_streaks,
            competitive_advantage_points: row.competitive_advantage_points,
        }
    }
}

/// Adds `delta` to one counter, creating the user's row on first use.
///
/// Returns the counter's new value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn increment_stat(
    pool: &PgPool,
    user_id: Uuid,
    counter: StatCounter,
    delta: i64,
) -> Result<i64, DbError> {
    // `column()` only yields fixed identifiers, so interpolation is safe here.
    let col = counter.column();
    let sql = format!(
        "INSERT INTO competitive_stats (user_id, {col}) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE \
         SET {col} = competitive_stats.{col} + EXCLUDED.{col}, updated_at = NOW() \
         RETURNING {col}"
    );
    let value = sqlx::query_scalar::<_, i64>(&sql)
        .bind(user_id)
        .bind(delta)
        .fetch_one(pool)
        .await?;

    Ok(value)
}

/// Overwrites one counter with `value`, creating the user's row on first use.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_stat(
    pool: &PgPool,
    user_id: Uuid,
    counter: StatCounter,
    value: i64,
) -> Result<(), DbError> {
    let col = counter.column();
    let sql = format!(
        "INSERT INTO competitive_stats (user_id, {col}) VALUES ($1, $2) \
         ON CONFLICT (user_id) DO UPDATE \
         SET {col} = EXCLUDED.{col}, updated_at = NOW()"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(value)
        .execute(pool)
        .await?;

    Ok(())
}

/// The user's counters, or `None` before any activity was recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_competitive_stats(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<CompetitiveStatsRow>, DbError> {
    let row = sqlx::query_as::<_, CompetitiveStatsRow>(
        "SELECT user_id, competitors_monitored, intelligence_gathered, alerts_processed, \
                opportunities_identified, competitive_tasks_completed, market_victories, \
                threat_responses, intelligence_streaks, competitive_advantage_points, updated_at \
         FROM competitive_stats \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Records an unlocked achievement and credits `points` to
/// `competitive_advantage_points` in the same statement.
///
/// Returns `false`, crediting nothing, if it was already unlocked.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails; neither write is applied.
pub async fn insert_achievement(
    pool: &PgPool,
    user_id: Uuid,
    achievement_id: &str,
    points: i64,
) -> Result<bool, DbError> {
    let unlocked = sqlx::query_scalar::<_, bool>(
        "WITH unlocked AS ( \
             INSERT INTO competitive_achievements (user_id, achievement_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, achievement_id) DO NOTHING \
             RETURNING user_id \
         ), credited AS ( \
             INSERT INTO competitive_stats (user_id, competitive_advantage_points) \
             SELECT user_id, $3 FROM unlocked \
             ON CONFLICT (user_id) DO UPDATE \
             SET competitive_advantage_points = \
                     competitive_stats.competitive_advantage_points + EXCLUDED.competitive_advantage_points, \
                 updated_at = NOW() \
             RETURNING user_id \
         ) \
         SELECT EXISTS (SELECT 1 FROM unlocked)",
    )
    .bind(user_id)
    .bind(achievement_id)
    .bind(points)
    .fetch_one(pool)
    .await?;

    Ok(unlocked)
}

/// Achievement ids the user has unlocked, in unlock order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_achievements(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, DbError> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT achievement_id FROM competitive_achievements \
         WHERE user_id = $1 ORDER BY unlocked_at ASC, achievement_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
