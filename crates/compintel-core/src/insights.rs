use serde::{Deserialize, Serialize};

use crate::jobs::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    EngagementTrends,
    ContentOpportunities,
    TimingInsights,
    AudienceChanges,
    CompetitiveAdvantages,
    RiskFactors,
}

impl InsightCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EngagementTrends => "engagement_trends",
            Self::ContentOpportunities => "content_opportunities",
            Self::TimingInsights => "timing_insights",
            Self::AudienceChanges => "audience_changes",
            Self::CompetitiveAdvantages => "competitive_advantages",
            Self::RiskFactors => "risk_factors",
        }
    }
}

/// Ordinal scale used for both an insight's impact and its severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// A derived observation about one competitor on one platform.
///
/// Insights are never stored on their own; they only survive inside the
/// `source_data` of the alerts they produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub platform: Option<Platform>,
    /// Short machine-readable tag, e.g. `inconsistent_posting`.
    pub kind: String,
    pub description: String,
    /// Impact for advantages and opportunities, severity for risks.
    pub level: Level,
    pub data: serde_json::Value,
}

impl Insight {
    #[must_use]
    pub fn new(
        category: InsightCategory,
        platform: Option<Platform>,
        kind: &str,
        description: impl Into<String>,
        level: Level,
        data: serde_json::Value,
    ) -> Self {
        Self {
            category,
            platform,
            kind: kind.to_string(),
            description: description.into(),
            level,
            data,
        }
    }
}
