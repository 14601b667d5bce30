//! Per-competitor analysis pass over recently collected posts.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use compintel_core::{Insight, Platform, Post};
use serde::Serialize;

use crate::audience::{analyze_audience, audience_insights, AudienceMetrics};
use crate::engagement::{analyze_engagement, engagement_insights, EngagementMetrics};
use crate::frequency::{analyze_frequency, frequency_insights, FrequencyMetrics};
use crate::sentiment::{label_for, sentiment_score, SentimentLabel};

/// Lookback for engagement ranking.
pub const ENGAGEMENT_WINDOW_DAYS: i64 = 7;
/// Lookback for cadence and audience trend.
pub const TREND_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformAnalysis {
    pub platform: Platform,
    pub engagement: EngagementMetrics,
    pub frequency: FrequencyMetrics,
    pub audience: AudienceMetrics,
    pub average_sentiment: f32,
    pub sentiment: SentimentLabel,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompetitorAnalysis {
    pub platforms: Vec<PlatformAnalysis>,
}

impl CompetitorAnalysis {
    /// All insights across platforms, in platform order.
    #[must_use]
    pub fn insights(&self) -> Vec<Insight> {
        self.platforms
            .iter()
            .flat_map(|p| p.insights.iter().cloned())
            .collect()
    }
}

/// Window and scoring options for one pass.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub now: DateTime<Utc>,
    pub include_views: bool,
}

impl AnalysisOptions {
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            include_views: false,
        }
    }

    #[must_use]
    pub fn trend_window_start(&self) -> DateTime<Utc> {
        self.now - Duration::days(TREND_WINDOW_DAYS)
    }
}

/// Analyzes each platform present in `posts`.
///
/// `posts` should cover at least the trend window; older posts are ignored.
#[must_use]
pub fn analyze_competitor(posts: &[Post], options: AnalysisOptions) -> CompetitorAnalysis {
    let mut by_platform: BTreeMap<Platform, Vec<&Post>> = BTreeMap::new();
    for post in posts {
        by_platform.entry(post.platform).or_default().push(post);
    }

    let platforms = by_platform
        .into_iter()
        .map(|(platform, posts)| analyze_platform(platform, &posts, options))
        .collect();

    CompetitorAnalysis { platforms }
}

fn analyze_platform(platform: Platform, posts: &[&Post], options: AnalysisOptions) -> PlatformAnalysis {
    let engagement_start = options.now - Duration::days(ENGAGEMENT_WINDOW_DAYS);
    let trend_start = options.trend_window_start();

    let recent: Vec<Post> = posts
        .iter()
        .filter(|p| p.posted_at >= engagement_start && p.posted_at <= options.now)
        .map(|p| (*p).clone())
        .collect();
    let window: Vec<Post> = posts
        .iter()
        .filter(|p| p.posted_at >= trend_start && p.posted_at <= options.now)
        .map(|p| (*p).clone())
        .collect();

    let engagement = analyze_engagement(&recent, options.include_views);
    let frequency = analyze_frequency(&window, trend_start, options.now);
    let audience = analyze_audience(&window, trend_start, options.now, options.include_views);

    let average_sentiment = if window.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = window.len() as f32;
        window.iter().map(|p| sentiment_score(&p.text)).sum::<f32>() / n
    };

    let mut insights = engagement_insights(platform, &engagement);
    insights.extend(frequency_insights(platform, &frequency));
    insights.extend(audience_insights(platform, &audience));

    tracing::debug!(
        platform = %platform,
        recent_posts = recent.len(),
        window_posts = window.len(),
        insights = insights.len(),
        "analysis: platform pass complete"
    );

    PlatformAnalysis {
        platform,
        engagement,
        frequency,
        audience,
        average_sentiment,
        sentiment: label_for(average_sentiment),
        insights,
    }
}
