//! Analysis engine: engagement, cadence, audience and sentiment metrics over
//! a competitor's recent posts, and the alert generator fed by their insights.

pub mod alerts;
pub mod audience;
pub mod engagement;
pub mod engine;
pub mod frequency;
pub mod sentiment;

pub use alerts::{generate_alerts, AlertTarget};
pub use audience::{analyze_audience, audience_insights, AudienceMetrics, AudienceTrend};
pub use engagement::{analyze_engagement, engagement_insights, BucketStats, EngagementMetrics};
pub use engine::{
    analyze_competitor, AnalysisOptions, CompetitorAnalysis, PlatformAnalysis,
    ENGAGEMENT_WINDOW_DAYS, TREND_WINDOW_DAYS,
};
pub use frequency::{analyze_frequency, frequency_insights, FrequencyMetrics, Trend};
pub use sentiment::{analyze_sentiment, label_for, sentiment_score, Sentiment, SentimentLabel};
