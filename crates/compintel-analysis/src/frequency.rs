//! Posting cadence: consistency score and daily-volume trend.

use chrono::{DateTime, Duration, Utc};
use compintel_core::{Insight, InsightCategory, Level, Platform, Post};
use serde::Serialize;
use serde_json::json;

/// Scores below this are reported as inconsistent posting.
pub const CONSISTENCY_THRESHOLD: f64 = 70.0;
/// Least-squares slope, in posts/day per day, above which volume is rising.
pub const TREND_SLOPE_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyMetrics {
    pub post_count: usize,
    pub window_days: i64,
    pub posts_per_day: f64,
    /// `None` with fewer than two posts.
    pub consistency_score: Option<f64>,
    pub trend_slope: f64,
    pub trend: Trend,
}

/// Measures cadence over `[window_start, window_end]`. Posts outside the window are ignored.
///
/// A post stamped exactly `window_end` counts toward the last daily slot.
#[must_use]
pub fn analyze_frequency(
    posts: &[Post],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> FrequencyMetrics {
    let mut times: Vec<DateTime<Utc>> = posts
        .iter()
        .map(|p| p.posted_at)
        .filter(|t| *t >= window_start && *t <= window_end)
        .collect();
    times.sort_unstable();

    let span = window_end - window_start;
    let window_days = (span.num_seconds() + Duration::days(1).num_seconds() - 1)
        .div_euclid(Duration::days(1).num_seconds())
        .max(1);

    let slots = usize::try_from(window_days).unwrap_or(1);
    let mut daily = vec![0_u32; slots];
    for t in &times {
        let day = usize::try_from((*t - window_start).num_days()).unwrap_or(usize::MAX);
        if let Some(slot) = daily.get_mut(day.min(slots - 1)) {
            *slot += 1;
        }
    }

    let trend_slope = least_squares_slope(&daily);
    let trend = if trend_slope > TREND_SLOPE_THRESHOLD {
        Trend::Increasing
    } else if trend_slope < -TREND_SLOPE_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    };

    #[allow(clippy::cast_precision_loss)]
    let posts_per_day = times.len() as f64 / window_days as f64;

    FrequencyMetrics {
        post_count: times.len(),
        window_days,
        posts_per_day,
        consistency_score: consistency_score(&times),
        trend_slope,
        trend,
    }
}

#[must_use]
pub fn frequency_insights(platform: Platform, metrics: &FrequencyMetrics) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some(score) = metrics.consistency_score {
        if score < CONSISTENCY_THRESHOLD {
            insights.push(Insight::new(
                InsightCategory::RiskFactors,
                Some(platform),
                "inconsistent_posting",
                format!("Posting cadence on {platform} is irregular (consistency {score:.0}/100)"),
                Level::Medium,
                json!({
                    "consistency_score": score,
                    "posts_per_day": metrics.posts_per_day,
                }),
            ));
        }
    }

    if metrics.trend == Trend::Increasing {
        insights.push(Insight::new(
            InsightCategory::EngagementTrends,
            Some(platform),
            "increasing_post_frequency",
            format!("Posting volume on {platform} is rising"),
            Level::Medium,
            json!({
                "trend_slope": metrics.trend_slope,
                "posts_per_day": metrics.posts_per_day,
            }),
        ));
    }

    insights
}

/// `100 × (1 − CV)` of the gaps between consecutive posts, clamped to `0..=100`.
fn consistency_score(sorted: &[DateTime<Utc>]) -> Option<f64> {
    if sorted.len() < 2 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let gaps: Vec<f64> = sorted
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64)
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<f64>() / n;
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return Some(100.0);
    }
    if mean <= 0.0 {
        return Some(0.0);
    }

    Some((100.0 * (1.0 - std_dev / mean)).clamp(0.0, 100.0))
}

fn least_squares_slope(values: &[u32]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().map(|v| f64::from(*v)).sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, v) in values.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let dx = i as f64 - mean_x;
        numerator += dx * (f64::from(*v) - mean_y);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use compintel_core::ContentType;

    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn post_at(at: DateTime<Utc>) -> Post {
        Post {
            platform: Platform::Linkedin,
            external_id: at.to_rfc3339(),
            content_type: ContentType::Text,
            text: String::new(),
            url: None,
            posted_at: at,
            likes: 0,
            shares: 0,
            comments: 0,
            views: None,
        }
    }

    #[test]
    fn regular_daily_posts_score_100() {
        let posts: Vec<Post> = (0..10)
            .map(|d| post_at(start() + Duration::days(d) + Duration::hours(9)))
            .collect();
        let metrics = analyze_frequency(&posts, start(), start() + Duration::days(30));

        assert_eq!(metrics.consistency_score, Some(100.0));
        assert!(frequency_insights(Platform::Linkedin, &metrics)
            .iter()
            .all(|i| i.kind != "inconsistent_posting"));
    }

    #[test]
    fn bursty_posting_is_flagged() {
        let mut posts = vec![
            post_at(start() + Duration::hours(1)),
            post_at(start() + Duration::hours(2)),
            post_at(start() + Duration::hours(3)),
        ];
        posts.push(post_at(start() + Duration::days(20)));
        let metrics = analyze_frequency(&posts, start(), start() + Duration::days(30));

        let score = metrics.consistency_score.expect("score");
        assert!(score < CONSISTENCY_THRESHOLD, "score was {score}");
        let insights = frequency_insights(Platform::Linkedin, &metrics);
        let risk = insights
            .iter()
            .find(|i| i.kind == "inconsistent_posting")
            .expect("risk insight");
        assert_eq!(risk.category, InsightCategory::RiskFactors);
        assert_eq!(risk.level, Level::Medium);
    }

    #[test]
    fn single_post_has_no_score() {
        let metrics = analyze_frequency(
            &[post_at(start() + Duration::hours(5))],
            start(),
            start() + Duration::days(30),
        );
        assert_eq!(metrics.consistency_score, None);
        assert_eq!(metrics.post_count, 1);
    }

    #[test]
    fn rising_volume_is_increasing_trend() {
        // Day d gets d posts across a 10-day window.
        let mut posts = Vec::new();
        for day in 0..10 {
            for n in 0..day {
                posts.push(post_at(start() + Duration::days(day) + Duration::minutes(n * 10)));
            }
        }
        let metrics = analyze_frequency(&posts, start(), start() + Duration::days(10));

        assert!((metrics.trend_slope - 1.0).abs() < 1e-9);
        assert_eq!(metrics.trend, Trend::Increasing);
        assert!(frequency_insights(Platform::Linkedin, &metrics)
            .iter()
            .any(|i| i.category == InsightCategory::EngagementTrends));
    }

    #[test]
    fn post_at_window_end_lands_in_last_slot() {
        let end = start() + Duration::days(10);
        let metrics = analyze_frequency(&[post_at(start()), post_at(end)], start(), end);

        assert_eq!(metrics.window_days, 10);
        assert_eq!(metrics.post_count, 2);
        assert!((metrics.posts_per_day - 0.2).abs() < 1e-9);
    }

    #[test]
    fn posts_outside_window_are_ignored() {
        let posts = vec![
            post_at(start() - Duration::days(1)),
            post_at(start() + Duration::days(31)),
        ];
        let metrics = analyze_frequency(&posts, start(), start() + Duration::days(30));
        assert_eq!(metrics.post_count, 0);
        assert_eq!(metrics.trend, Trend::Stable);
    }
}
