use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The per-user counters the gamification layer maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatCounter {
    CompetitorsMonitored,
    IntelligenceGathered,
    AlertsProcessed,
    OpportunitiesIdentified,
    CompetitiveTasksCompleted,
    MarketVictories,
    ThreatResponses,
    IntelligenceStreaks,
    CompetitiveAdvantagePoints,
}

impl StatCounter {
    /// Column name in `competitive_stats`. Only these fixed names ever reach SQL.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::CompetitorsMonitored => "competitors_monitored",
            Self::IntelligenceGathered => "intelligence_gathered",
            Self::AlertsProcessed => "alerts_processed",
            Self::OpportunitiesIdentified => "opportunities_identified",
            Self::CompetitiveTasksCompleted => "competitive_tasks_completed",
            Self::MarketVictories => "market_victories",
            Self::ThreatResponses => "threat_responses",
            Self::IntelligenceStreaks => "intelligence_streaks",
            Self::CompetitiveAdvantagePoints => "competitive_advantage_points",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveStats {
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
}

impl CompetitiveStats {
    #[must_use]
    pub fn get(&self, counter: StatCounter) -> i64 {
        match counter {
            StatCounter::CompetitorsMonitored => self.competitors_monitored,
            StatCounter::IntelligenceGathered => self.intelligence_gathered,
            StatCounter::AlertsProcessed => self.alerts_processed,
            StatCounter::OpportunitiesIdentified => self.opportunities_identified,
            StatCounter::CompetitiveTasksCompleted => self.competitive_tasks_completed,
            StatCounter::MarketVictories => self.market_victories,
            StatCounter::ThreatResponses => self.threat_responses,
            StatCounter::IntelligenceStreaks => self.intelligence_streaks,
            StatCounter::CompetitiveAdvantagePoints => self.competitive_advantage_points,
        }
    }

    pub fn get_mut(&mut self, counter: StatCounter) -> &mut i64 {
        match counter {
            StatCounter::CompetitorsMonitored => &mut self.competitors_monitored,
            StatCounter::IntelligenceGathered => &mut self.intelligence_gathered,
            StatCounter::AlertsProcessed => &mut self.alerts_processed,
            StatCounter::OpportunitiesIdentified => &mut self.opportunities_identified,
            StatCounter::CompetitiveTasksCompleted => &mut self.competitive_tasks_completed,
            StatCounter::MarketVictories => &mut self.market_victories,
            StatCounter::ThreatResponses => &mut self.threat_responses,
            StatCounter::IntelligenceStreaks => &mut self.intelligence_streaks,
            StatCounter::CompetitiveAdvantagePoints => &mut self.competitive_advantage_points,
        }
    }
}
