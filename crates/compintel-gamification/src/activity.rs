//! Activity events and their point values.

use std::fmt;

use compintel_core::StatCounter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const TASK_BONUS_POINTS: i64 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    CompetitorAdded,
    IntelligenceGathered,
    AlertProcessed,
    OpportunityIdentified,
    CompetitiveTaskCompleted,
    CompetitiveVictory,
    ThreatResponse,
    IntelligenceStreak,
}

impl ActivityType {
    pub const ALL: [ActivityType; 8] = [
        ActivityType::CompetitorAdded,
        ActivityType::IntelligenceGathered,
        ActivityType::AlertProcessed,
        ActivityType::OpportunityIdentified,
        ActivityType::CompetitiveTaskCompleted,
        ActivityType::CompetitiveVictory,
        ActivityType::ThreatResponse,
        ActivityType::IntelligenceStreak,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompetitorAdded => "competitor_added",
            Self::IntelligenceGathered => "intelligence_gathered",
            Self::AlertProcessed => "alert_processed",
            Self::OpportunityIdentified => "opportunity_identified",
            Self::CompetitiveTaskCompleted => "competitive_task_completed",
            Self::CompetitiveVictory => "competitive_victory",
            Self::ThreatResponse => "threat_response",
            Self::IntelligenceStreak => "intelligence_streak",
        }
    }

    /// Counter the direct-write fallback updates.
    #[must_use]
    pub fn counter(self) -> StatCounter {
        match self {
            Self::CompetitorAdded => StatCounter::CompetitorsMonitored,
            Self::IntelligenceGathered => StatCounter::IntelligenceGathered,
            Self::AlertProcessed => StatCounter::AlertsProcessed,
            Self::OpportunityIdentified => StatCounter::OpportunitiesIdentified,
            Self::CompetitiveTaskCompleted => StatCounter::CompetitiveTasksCompleted,
            Self::CompetitiveVictory => StatCounter::MarketVictories,
            Self::ThreatResponse => StatCounter::ThreatResponses,
            Self::IntelligenceStreak => StatCounter::IntelligenceStreaks,
        }
    }

    /// Streak length is set outright; every other counter accumulates.
    #[must_use]
    pub fn replaces_counter(self) -> bool {
        matches!(self, Self::IntelligenceStreak)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictoryTier {
    Minor,
    Moderate,
    Major,
    GameChanging,
}

impl VictoryTier {
    #[must_use]
    pub fn points(self) -> i64 {
        match self {
            Self::Minor => 50,
            Self::Moderate => 100,
            Self::Major => 250,
            Self::GameChanging => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryData {
    pub tier: VictoryTier,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// One gamification event, as posted to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub activity_type: ActivityType,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory_data: Option<VictoryData>,
    #[serde(skip)]
    pub bonus_points: i64,
}

impl Activity {
    #[must_use]
    pub fn new(activity_type: ActivityType, value: i64) -> Self {
        Self {
            activity_type,
            value,
            victory_data: None,
            bonus_points: 0,
        }
    }

    #[must_use]
    pub fn task_completed(priority: TaskPriority) -> Self {
        let bonus_points = if priority >= TaskPriority::High {
            TASK_BONUS_POINTS
        } else {
            0
        };
        Self {
            bonus_points,
            ..Self::new(ActivityType::CompetitiveTaskCompleted, 1)
        }
    }

    #[must_use]
    pub fn victory(data: VictoryData) -> Self {
        Self {
            victory_data: Some(data),
            ..Self::new(ActivityType::CompetitiveVictory, 1)
        }
    }

    /// Competitive advantage points earned by this event.
    #[must_use]
    pub fn points(&self) -> i64 {
        let base = match self.activity_type {
            ActivityType::CompetitorAdded => 10 * self.value,
            ActivityType::IntelligenceGathered => 2 * self.value,
            ActivityType::AlertProcessed => 5 * self.value,
            ActivityType::OpportunityIdentified => 15 * self.value,
            ActivityType::CompetitiveTaskCompleted => 20 * self.value,
            ActivityType::CompetitiveVictory => self
                .victory_data
                .as_ref()
                .map_or(VictoryTier::Minor.points(), |v| v.tier.points()),
            ActivityType::ThreatResponse => 30 * self.value,
            ActivityType::IntelligenceStreak => self.value,
        };
        base + self.bonus_points
    }

    /// Points when the counter moves from `previous` to this event's value.
    ///
    /// A replacing counter earns only on the increase; everything else earns
    /// [`Activity::points`].
    #[must_use]
    pub fn points_over(&self, previous: i64) -> i64 {
        if self.activity_type.replaces_counter() {
            (self.value - previous).max(0) + self.bonus_points
        } else {
            self.points()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_unit_points_scale_with_value() {
        assert_eq!(Activity::new(ActivityType::IntelligenceGathered, 12).points(), 24);
        assert_eq!(Activity::new(ActivityType::OpportunityIdentified, 3).points(), 45);
        assert_eq!(Activity::new(ActivityType::IntelligenceStreak, 9).points(), 9);
    }

    #[test]
    fn streak_earns_only_its_increase() {
        let streak = Activity::new(ActivityType::IntelligenceStreak, 7);
        assert_eq!(streak.points_over(0), 7);
        assert_eq!(streak.points_over(7), 0);
        assert_eq!(streak.points_over(4), 3);
        assert_eq!(streak.points_over(10), 0);

        let gathered = Activity::new(ActivityType::IntelligenceGathered, 3);
        assert_eq!(gathered.points_over(100), 6);
    }

    #[test]
    fn task_bonus_only_for_high_and_critical() {
        assert_eq!(Activity::task_completed(TaskPriority::Medium).points(), 20);
        assert_eq!(Activity::task_completed(TaskPriority::High).points(), 45);
        assert_eq!(Activity::task_completed(TaskPriority::Critical).points(), 45);
    }

    #[test]
    fn victory_tiers() {
        let points: Vec<i64> = [
            VictoryTier::Minor,
            VictoryTier::Moderate,
            VictoryTier::Major,
            VictoryTier::GameChanging,
        ]
        .into_iter()
        .map(|tier| {
            Activity::victory(VictoryData {
                tier,
                description: "won a deal".to_string(),
                competitor_id: None,
            })
            .points()
        })
        .collect();
        assert_eq!(points, vec![50, 100, 250, 500]);
    }

    #[test]
    fn remote_payload_shape() {
        let json = serde_json::to_value(Activity::task_completed(TaskPriority::High)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"activity_type": "competitive_task_completed", "value": 1})
        );
    }

    #[test]
    fn only_streak_replaces() {
        for activity in ActivityType::ALL {
            assert_eq!(
                activity.replaces_counter(),
                activity == ActivityType::IntelligenceStreak
            );
        }
    }
}
