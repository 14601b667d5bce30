//! Audience response over a window: first half against second half.

use chrono::{DateTime, Utc};
use compintel_core::{Insight, InsightCategory, Level, Platform, Post};
use serde::Serialize;
use serde_json::json;

/// Relative change in average engagement that counts as growth or decline.
pub const CHANGE_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceTrend {
    Growing,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudienceMetrics {
    pub first_half_posts: usize,
    pub second_half_posts: usize,
    pub first_half_average: f64,
    pub second_half_average: f64,
    /// Relative change, `None` when either half has no engagement baseline.
    pub change: Option<f64>,
    pub trend: AudienceTrend,
}

/// Compares average engagement per post between the two halves of `[window_start, window_end]`.
#[must_use]
pub fn analyze_audience(
    posts: &[Post],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    include_views: bool,
) -> AudienceMetrics {
    let midpoint = window_start + (window_end - window_start) / 2;

    let mut first = (0_usize, 0_u64);
    let mut second = (0_usize, 0_u64);
    for post in posts {
        if post.posted_at < window_start || post.posted_at > window_end {
            continue;
        }
        let half = if post.posted_at < midpoint {
            &mut first
        } else {
            &mut second
        };
        half.0 += 1;
        half.1 = half.1.saturating_add(post.engagement(include_views));
    }

    let first_half_average = average(first);
    let second_half_average = average(second);

    let change = (first.0 > 0 && second.0 > 0 && first_half_average > 0.0)
        .then(|| (second_half_average - first_half_average) / first_half_average);

    let trend = match change {
        Some(c) if c > CHANGE_THRESHOLD => AudienceTrend::Growing,
        Some(c) if c < -CHANGE_THRESHOLD => AudienceTrend::Declining,
        _ => AudienceTrend::Stable,
    };

    AudienceMetrics {
        first_half_posts: first.0,
        second_half_posts: second.0,
        first_half_average,
        second_half_average,
        change,
        trend,
    }
}

#[must_use]
pub fn audience_insights(platform: Platform, metrics: &AudienceMetrics) -> Vec<Insight> {
    let change_pct = metrics.change.map(|c| c * 100.0);
    let data = json!({
        "first_half_average": metrics.first_half_average,
        "second_half_average": metrics.second_half_average,
        "change_pct": change_pct,
    });

    match metrics.trend {
        AudienceTrend::Growing => vec![Insight::new(
            InsightCategory::CompetitiveAdvantages,
            Some(platform),
            "audience_growth",
            format!(
                "Audience engagement on {platform} grew {:.0}% across the window",
                change_pct.unwrap_or_default()
            ),
            Level::High,
            data,
        )],
        AudienceTrend::Declining => vec![Insight::new(
            InsightCategory::RiskFactors,
            Some(platform),
            "audience_decline",
            format!(
                "Audience engagement on {platform} fell {:.0}% across the window",
                change_pct.unwrap_or_default().abs()
            ),
            Level::High,
            data,
        )],
        AudienceTrend::Stable => Vec::new(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn average((count, total): (usize, u64)) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use compintel_core::ContentType;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn post(day: i64, likes: u64) -> Post {
        Post {
            platform: Platform::Instagram,
            external_id: format!("{day}-{likes}"),
            content_type: ContentType::Image,
            text: String::new(),
            url: None,
            posted_at: start() + Duration::days(day),
            likes,
            shares: 0,
            comments: 0,
            views: None,
        }
    }

    fn analyze(posts: &[Post]) -> AudienceMetrics {
        analyze_audience(posts, start(), start() + Duration::days(30), false)
    }

    #[test]
    fn growth_beyond_ten_percent_is_growing() {
        let metrics = analyze(&[post(2, 100), post(20, 150)]);
        assert_eq!(metrics.trend, AudienceTrend::Growing);

        let insights = audience_insights(Platform::Instagram, &metrics);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, InsightCategory::CompetitiveAdvantages);
        assert_eq!(insights[0].level, Level::High);
    }

    #[test]
    fn decline_is_a_high_severity_risk() {
        let metrics = analyze(&[post(2, 100), post(20, 50)]);
        assert_eq!(metrics.trend, AudienceTrend::Declining);

        let insights = audience_insights(Platform::Instagram, &metrics);
        assert_eq!(insights[0].category, InsightCategory::RiskFactors);
        assert_eq!(insights[0].kind, "audience_decline");
        assert_eq!(insights[0].level, Level::High);
    }

    #[test]
    fn small_change_is_stable() {
        let metrics = analyze(&[post(2, 100), post(20, 105)]);
        assert_eq!(metrics.trend, AudienceTrend::Stable);
        assert!(audience_insights(Platform::Instagram, &metrics).is_empty());
    }

    #[test]
    fn empty_half_is_stable() {
        let metrics = analyze(&[post(20, 500)]);
        assert_eq!(metrics.change, None);
        assert_eq!(metrics.trend, AudienceTrend::Stable);
    }
}
