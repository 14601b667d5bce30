//! Maps insights to user-facing alerts.

use compintel_core::{
    AlertType, Insight, InsightCategory, Level, NewAlert, Priority, RecommendedAction, Severity,
};
use uuid::Uuid;

const DEFAULT_EFFORT: &str = "1-2 hours";

const ADVANTAGE_ACTIONS: &[&str] = &[
    "Analyze their content strategy",
    "Consider counter-positioning",
    "Monitor for campaign launches",
];

const OPPORTUNITY_ACTIONS: &[&str] = &[
    "Review where their audience is disengaging",
    "Target their audience with stronger content",
    "Increase your activity on this platform",
];

const CONTENT_ACTIONS: &[&str] = &[
    "Test this content format in your own posts",
    "Schedule posts around their peak engagement",
];

/// Who an alert is for.
#[derive(Debug, Clone, Copy)]
pub struct AlertTarget<'a> {
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub competitor_name: &'a str,
}

/// Turns the insights of one analysis pass into alerts.
///
/// | category | filter | alert | severity |
/// |---|---|---|---|
/// | competitive advantages | impact high | competitive_advantage | info |
/// | risk factors | severity high | competitive_opportunity | warning |
/// | content opportunities | impact medium or high | content_insight | info |
///
/// Everything else yields no alert.
#[must_use]
pub fn generate_alerts(target: AlertTarget<'_>, insights: &[Insight]) -> Vec<NewAlert> {
    insights
        .iter()
        .filter_map(|insight| alert_for(target, insight))
        .collect()
}

fn alert_for(target: AlertTarget<'_>, insight: &Insight) -> Option<NewAlert> {
    let (alert_type, severity, actions) = match (insight.category, insight.level) {
        (InsightCategory::CompetitiveAdvantages, Level::High) => {
            (AlertType::CompetitiveAdvantage, Severity::Info, ADVANTAGE_ACTIONS)
        }
        (InsightCategory::RiskFactors, Level::High) => (
            AlertType::CompetitiveOpportunity,
            Severity::Warning,
            OPPORTUNITY_ACTIONS,
        ),
        (InsightCategory::ContentOpportunities, Level::High | Level::Medium) => {
            (AlertType::ContentInsight, Severity::Info, CONTENT_ACTIONS)
        }
        _ => return None,
    };

    let platform = insight
        .platform
        .map_or_else(|| "all platforms".to_string(), |p| p.to_string());
    let name = target.competitor_name;
    let title = match alert_type {
        AlertType::CompetitiveAdvantage => format!("{name} is gaining ground on {platform}"),
        AlertType::CompetitiveOpportunity => format!("Opening against {name} on {platform}"),
        _ => format!("Content insight from {name} on {platform}"),
    };

    let action_items: Vec<String> = actions.iter().map(|a| (*a).to_string()).collect();
    let recommended_actions = action_items
        .iter()
        .map(|action| RecommendedAction {
            action: action.clone(),
            priority: Priority::Medium,
            estimated_effort: DEFAULT_EFFORT.to_string(),
        })
        .collect();

    Some(NewAlert {
        competitor_id: target.competitor_id,
        user_id: target.user_id,
        alert_type,
        severity,
        title,
        description: insight.description.clone(),
        source_data: serde_json::to_value(insight).unwrap_or_default(),
        action_items,
        recommended_actions,
    })
}
