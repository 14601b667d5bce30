//! Stats persistence used by the direct-write path.

use async_trait::async_trait;
use compintel_core::{CompetitiveStats, Severity, StatCounter};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::GamificationError;

#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Adds `delta` and returns the new value.
    async fn increment_counter(
        &self,
        user_id: Uuid,
        counter: StatCounter,
        delta: i64,
    ) -> Result<i64, GamificationError>;

    async fn set_counter(
        &self,
        user_id: Uuid,
        counter: StatCounter,
        value: i64,
    ) -> Result<(), GamificationError>;

    async fn current_stats(&self, user_id: Uuid) -> Result<CompetitiveStats, GamificationError>;

    /// Records the achievement and adds `points` to the user's competitive
    /// advantage points as one write. Returns `true` only the first time;
    /// later calls change nothing.
    async fn record_achievement(
        &self,
        user_id: Uuid,
        achievement_id: &str,
        points: i64,
    ) -> Result<bool, GamificationError>;

    /// Severity of the user's alert, `None` if it does not exist.
    async fn alert_severity(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
    ) -> Result<Option<Severity>, GamificationError>;
}

/// [`StatsStore`] over the `competitive_stats` tables.
#[derive(Debug, Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStatsStore {
    async fn increment_counter(
        &self,
        user_id: Uuid,
        counter: StatCounter,
        delta: i64,
    ) -> Result<i64, GamificationError> {
        Ok(compintel_db::increment_stat(&self.pool, user_id, counter, delta).await?)
    }

    async fn set_counter(
        &self,
        user_id: Uuid,
        counter: StatCounter,
        value: i64,
    ) -> Result<(), GamificationError> {
        Ok(compintel_db::set_stat(&self.pool, user_id, counter, value).await?)
    }

    async fn current_stats(&self, user_id: Uuid) -> Result<CompetitiveStats, GamificationError> {
        let row = compintel_db::get_competitive_stats(&self.pool, user_id).await?;
        Ok(row.map_or_else(
            || CompetitiveStats {
                user_id,
                ..CompetitiveStats::default()
            },
            CompetitiveStats::from,
        ))
    }

    async fn record_achievement(
        &self,
        user_id: Uuid,
        achievement_id: &str,
        points: i64,
    ) -> Result<bool, GamificationError> {
        Ok(compintel_db::insert_achievement(&self.pool, user_id, achievement_id, points).await?)
    }

    async fn alert_severity(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
    ) -> Result<Option<Severity>, GamificationError> {
        match compintel_db::get_alert(&self.pool, alert_id, user_id).await {
            Ok(row) => Ok(row.severity.parse::<Severity>().ok()),
            Err(compintel_db::DbError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
