//! Achievement catalog.

use compintel_core::{CompetitiveStats, StatCounter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub metric: StatCounter,
    pub target: i64,
    pub points: i64,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_competitor",
        name: "Know Your Rival",
        metric: StatCounter::CompetitorsMonitored,
        target: 1,
        points: 25,
    },
    Achievement {
        id: "competitor_watchlist",
        name: "Watchlist",
        metric: StatCounter::CompetitorsMonitored,
        target: 5,
        points: 100,
    },
    Achievement {
        id: "intel_gatherer",
        name: "Intel Gatherer",
        metric: StatCounter::IntelligenceGathered,
        target: 100,
        points: 50,
    },
    Achievement {
        id: "intel_master",
        name: "Intel Master",
        metric: StatCounter::IntelligenceGathered,
        target: 1_000,
        points: 250,
    },
    Achievement {
        id: "alert_responder",
        name: "Alert Responder",
        metric: StatCounter::AlertsProcessed,
        target: 10,
        points: 50,
    },
    Achievement {
        id: "opportunity_hunter",
        name: "Opportunity Hunter",
        metric: StatCounter::OpportunitiesIdentified,
        target: 10,
        points: 100,
    },
    Achievement {
        id: "task_finisher",
        name: "Task Finisher",
        metric: StatCounter::CompetitiveTasksCompleted,
        target: 10,
        points: 100,
    },
    Achievement {
        id: "first_victory",
        name: "First Victory",
        metric: StatCounter::MarketVictories,
        target: 1,
        points: 100,
    },
    Achievement {
        id: "threat_defender",
        name: "Threat Defender",
        metric: StatCounter::ThreatResponses,
        target: 5,
        points: 150,
    },
    Achievement {
        id: "week_streak",
        name: "Week of Intel",
        metric: StatCounter::IntelligenceStreaks,
        target: 7,
        points: 75,
    },
    Achievement {
        id: "month_streak",
        name: "Month of Intel",
        metric: StatCounter::IntelligenceStreaks,
        target: 30,
        points: 300,
    },
];

/// Achievements whose metric has reached its target.
///
/// Includes ones already unlocked; the store decides what is new.
pub fn reached(stats: &CompetitiveStats) -> impl Iterator<Item = &'static Achievement> + '_ {
    ACHIEVEMENTS
        .iter()
        .filter(move |a| stats.get(a.metric) >= a.target)
}
