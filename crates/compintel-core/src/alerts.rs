use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{jobs::Priority, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    CompetitiveAdvantage,
    CompetitiveOpportunity,
    ContentInsight,
    Pricing,
    Hiring,
    Partnership,
}

impl AlertType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompetitiveAdvantage => "competitive_advantage",
            Self::CompetitiveOpportunity => "competitive_opportunity",
            Self::ContentInsight => "content_insight",
            Self::Pricing => "pricing",
            Self::Hiring => "hiring",
            Self::Partnership => "partnership",
        }
    }

    /// Alert types that count as an identified opportunity for gamification.
    #[must_use]
    pub fn is_opportunity(self) -> bool {
        matches!(self, Self::CompetitiveOpportunity | Self::ContentInsight)
    }
}

impl FromStr for AlertType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "competitive_advantage" => Ok(Self::CompetitiveAdvantage),
            "competitive_opportunity" => Ok(Self::CompetitiveOpportunity),
            "content_insight" => Ok(Self::ContentInsight),
            "pricing" => Ok(Self::Pricing),
            "hiring" => Ok(Self::Hiring),
            "partnership" => Ok(Self::Partnership),
            other => Err(CoreError::unknown("alert type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Urgent,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        }
    }

    /// Whether handling an alert of this severity counts as a threat response.
    #[must_use]
    pub fn is_threat(self) -> bool {
        matches!(self, Self::Urgent | Self::Critical)
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "urgent" => Ok(Self::Urgent),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::unknown("severity", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub action: String,
    pub priority: Priority,
    pub estimated_effort: String,
}

/// An alert ready for insertion; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub source_data: serde_json::Value,
    pub action_items: Vec<String>,
    pub recommended_actions: Vec<RecommendedAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub source_data: serde_json::Value,
    pub action_items: Vec<String>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub is_read: bool,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_urgent_and_critical_are_threats() {
        assert!(!Severity::Info.is_threat());
        assert!(!Severity::Warning.is_threat());
        assert!(Severity::Urgent.is_threat());
        assert!(Severity::Critical.is_threat());
    }

    #[test]
    fn opportunity_alert_types() {
        assert!(AlertType::CompetitiveOpportunity.is_opportunity());
        assert!(AlertType::ContentInsight.is_opportunity());
        assert!(!AlertType::CompetitiveAdvantage.is_opportunity());
    }

    #[test]
    fn recommended_action_serializes_effort() {
        let action = RecommendedAction {
            action: "Consider counter-positioning".to_string(),
            priority: Priority::Medium,
            estimated_effort: "1-2 hours".to_string(),
        };
        let json = serde_json::to_string(&action).expect("serialize");
        assert!(json.contains("\"priority\":\"medium\""));
        assert!(json.contains("\"estimated_effort\":\"1-2 hours\""));
    }
}
