//! Engagement by content type and hour of day.

use std::collections::BTreeMap;

use chrono::Timelike;
use compintel_core::{ContentType, Insight, InsightCategory, Level, Platform, Post};
use serde::Serialize;
use serde_json::json;

/// Ratio of a bucket's average to the overall average that counts as high impact.
const HIGH_IMPACT_RATIO: f64 = 2.0;
const MEDIUM_IMPACT_RATIO: f64 = 1.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats<K> {
    pub key: K,
    pub posts: usize,
    pub average_engagement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementMetrics {
    pub post_count: usize,
    pub average_engagement: f64,
    /// Ranked best first.
    pub by_content_type: Vec<BucketStats<ContentType>>,
    /// Ranked best first; keys are UTC hours `0..24`.
    pub by_hour: Vec<BucketStats<u32>>,
}

impl EngagementMetrics {
    #[must_use]
    pub fn top_content_type(&self) -> Option<&BucketStats<ContentType>> {
        self.by_content_type.first()
    }

    #[must_use]
    pub fn top_hour(&self) -> Option<&BucketStats<u32>> {
        self.by_hour.first()
    }
}

/// Groups posts by content type and posting hour and ranks each grouping by
/// average engagement.
#[must_use]
pub fn analyze_engagement(posts: &[Post], include_views: bool) -> EngagementMetrics {
    let mut by_type: BTreeMap<ContentType, (usize, u64)> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, (usize, u64)> = BTreeMap::new();
    let mut total = 0_u64;

    for post in posts {
        let engagement = post.engagement(include_views);
        total = total.saturating_add(engagement);

        let entry = by_type.entry(post.content_type).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(engagement);

        let entry = by_hour.entry(post.posted_at.hour()).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(engagement);
    }

    EngagementMetrics {
        post_count: posts.len(),
        average_engagement: average(total, posts.len()),
        by_content_type: rank(by_type),
        by_hour: rank(by_hour),
    }
}

/// Top content type becomes a content opportunity, top hour a timing insight.
#[must_use]
pub fn engagement_insights(platform: Platform, metrics: &EngagementMetrics) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some(top) = metrics.top_content_type() {
        let impact = impact_for(top.average_engagement, metrics.average_engagement);
        insights.push(Insight::new(
            InsightCategory::ContentOpportunities,
            Some(platform),
            "top_content_type",
            format!(
                "{} posts on {platform} average {:.1} engagements, against {:.1} overall",
                top.key.as_str(),
                top.average_engagement,
                metrics.average_engagement
            ),
            impact,
            json!({
                "content_type": top.key,
                "posts": top.posts,
                "average_engagement": top.average_engagement,
                "overall_average": metrics.average_engagement,
            }),
        ));
    }

    if let Some(top) = metrics.top_hour() {
        let impact = impact_for(top.average_engagement, metrics.average_engagement);
        insights.push(Insight::new(
            InsightCategory::TimingInsights,
            Some(platform),
            "peak_engagement_hour",
            format!(
                "Posts published at {:02}:00 UTC on {platform} draw the most engagement",
                top.key
            ),
            impact,
            json!({
                "hour_utc": top.key,
                "posts": top.posts,
                "average_engagement": top.average_engagement,
            }),
        ));
    }

    insights
}

fn impact_for(bucket_average: f64, overall_average: f64) -> Level {
    if overall_average <= 0.0 {
        return Level::Low;
    }
    let ratio = bucket_average / overall_average;
    if ratio >= HIGH_IMPACT_RATIO {
        Level::High
    } else if ratio >= MEDIUM_IMPACT_RATIO {
        Level::Medium
    } else {
        Level::Low
    }
}

/// Best average first; ties go to the bucket with more posts, then the smaller key.
fn rank<K: Ord + Copy>(buckets: BTreeMap<K, (usize, u64)>) -> Vec<BucketStats<K>> {
    let mut ranked: Vec<BucketStats<K>> = buckets
        .into_iter()
        .map(|(key, (posts, total))| BucketStats {
            key,
            posts,
            average_engagement: average(total, posts),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.average_engagement
            .total_cmp(&a.average_engagement)
            .then(b.posts.cmp(&a.posts))
            .then(a.key.cmp(&b.key))
    });
    ranked
}

#[allow(clippy::cast_precision_loss)]
fn average(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
