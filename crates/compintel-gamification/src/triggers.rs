//! Converts pipeline events into stat and point updates.

use std::sync::Arc;

use compintel_core::StatCounter;
use uuid::Uuid;

use crate::achievements;
use crate::activity::{Activity, ActivityType, TaskPriority, VictoryData};
use crate::error::GamificationError;
use crate::remote::RemoteGamificationClient;
use crate::store::StatsStore;

/// Which path recorded an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Remote,
    Fallback,
    Dropped,
}

/// Stateless façade: remote endpoint first, then a direct write to the stats store.
///
/// No method returns an error. A remote call that fails after the host has
/// applied it will be counted twice by the fallback; there is no
/// deduplication across the two paths.
#[derive(Clone)]
pub struct GamificationTriggers {
    remote: Option<Arc<RemoteGamificationClient>>,
    store: Arc<dyn StatsStore>,
}

impl GamificationTriggers {
    #[must_use]
    pub fn new(remote: Option<RemoteGamificationClient>, store: Arc<dyn StatsStore>) -> Self {
        Self {
            remote: remote.map(Arc::new),
            store,
        }
    }

    pub async fn on_competitor_added(&self, user_id: Uuid) -> TriggerOutcome {
        self.record(user_id, Activity::new(ActivityType::CompetitorAdded, 1))
            .await
    }

    pub async fn on_intelligence_gathered(&self, user_id: Uuid, count: u64) -> TriggerOutcome {
        self.record(
            user_id,
            Activity::new(ActivityType::IntelligenceGathered, saturating_i64(count)),
        )
        .await
    }

    /// Counts the alert as processed; urgent and critical alerts also count
    /// as a threat response.
    pub async fn on_alert_processed(&self, user_id: Uuid, alert_id: Uuid) -> TriggerOutcome {
        let outcome = self
            .record(user_id, Activity::new(ActivityType::AlertProcessed, 1))
            .await;

        match self.store.alert_severity(user_id, alert_id).await {
            Ok(Some(severity)) if severity.is_threat() => {
                self.on_threat_response(user_id).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    alert_id = %alert_id,
                    error = %e,
                    "gamification: could not read alert severity"
                );
            }
        }

        outcome
    }

    pub async fn on_opportunity_identified(&self, user_id: Uuid, count: u64) -> TriggerOutcome {
        self.record(
            user_id,
            Activity::new(ActivityType::OpportunityIdentified, saturating_i64(count)),
        )
        .await
    }

    pub async fn on_competitive_task_completed(
        &self,
        user_id: Uuid,
        priority: TaskPriority,
    ) -> TriggerOutcome {
        self.record(user_id, Activity::task_completed(priority)).await
    }

    /// `days` is the caller's current streak length; it replaces the stored
    /// value. Points are earned only for days beyond the stored streak.
    pub async fn on_intelligence_streak(&self, user_id: Uuid, days: u32) -> TriggerOutcome {
        self.record(
            user_id,
            Activity::new(ActivityType::IntelligenceStreak, i64::from(days)),
        )
        .await
    }

    pub async fn on_competitive_victory(&self, user_id: Uuid, data: VictoryData) -> TriggerOutcome {
        self.record(user_id, Activity::victory(data)).await
    }

    pub async fn on_threat_response(&self, user_id: Uuid) -> TriggerOutcome {
        self.record(user_id, Activity::new(ActivityType::ThreatResponse, 1))
            .await
    }

    async fn record(&self, user_id: Uuid, activity: Activity) -> TriggerOutcome {
        if let Some(remote) = &self.remote {
            match remote.record(user_id, &activity).await {
                Ok(()) => {
                    tracing::debug!(
                        user_id = %user_id,
                        activity = %activity.activity_type,
                        value = activity.value,
                        "gamification: recorded remotely"
                    );
                    return TriggerOutcome::Remote;
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        activity = %activity.activity_type,
                        error = %e,
                        "gamification: remote endpoint failed, using direct write"
                    );
                }
            }
        }

        match self.apply_directly(user_id, &activity).await {
            Ok(()) => TriggerOutcome::Fallback,
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    activity = %activity.activity_type,
                    value = activity.value,
                    error = %e,
                    "gamification: direct write failed, event dropped"
                );
                TriggerOutcome::Dropped
            }
        }
    }

    async fn apply_directly(&self, user_id: Uuid, activity: &Activity) -> Result<(), GamificationError> {
        let counter = activity.activity_type.counter();
        let points = if activity.activity_type.replaces_counter() {
            let previous = self.store.current_stats(user_id).await?.get(counter);
            self.store.set_counter(user_id, counter, activity.value).await?;
            activity.points_over(previous)
        } else {
            self.store
                .increment_counter(user_id, counter, activity.value)
                .await?;
            activity.points()
        };

        if points != 0 {
            self.store
                .increment_counter(user_id, StatCounter::CompetitiveAdvantagePoints, points)
                .await?;
        }

        self.unlock_achievements(user_id).await
    }

    async fn unlock_achievements(&self, user_id: Uuid) -> Result<(), GamificationError> {
        let stats = self.store.current_stats(user_id).await?;
        for achievement in achievements::reached(&stats) {
            if self
                .store
                .record_achievement(user_id, achievement.id, achievement.points)
                .await?
            {
                tracing::info!(
                    user_id = %user_id,
                    achievement = achievement.id,
                    points = achievement.points,
                    "gamification: achievement unlocked"
                );
            }
        }
        Ok(())
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "triggers_test.rs"]
mod tests;
