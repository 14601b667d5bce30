//! X / Twitter API v2 monitor.

use async_trait::async_trait;
use compintel_core::{ContentType, Platform, Post};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Url;
use serde::Deserialize;

use crate::error::MonitorError;
use crate::http::{join, parse_base_url, parse_timestamp, MonitorConfig, MonitorHttp};
use crate::{degrade, resolve_key, SourceMonitor};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";
const MAX_RESULTS: u32 = 20;

#[derive(Debug, Deserialize)]
struct UserLookup {
    data: Option<UserData>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    detail: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Timeline {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<String>,
    public_metrics: Option<PublicMetrics>,
    attachments: Option<Attachments>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    quote_count: u64,
    #[serde(default)]
    reply_count: u64,
    impression_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Attachments {
    #[serde(default)]
    media_keys: Vec<String>,
}

pub struct TwitterMonitor {
    http: MonitorHttp,
    base_url: Url,
    default_key: Option<String>,
}

impl TwitterMonitor {
    /// # Errors
    ///
    /// Returns [`MonitorError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &MonitorConfig, default_key: Option<String>) -> Result<Self, MonitorError> {
        Self::with_base_url(config, default_key, DEFAULT_BASE_URL)
    }

    /// Points the monitor at a different API host (wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        config: &MonitorConfig,
        default_key: Option<String>,
        base_url: &str,
    ) -> Result<Self, MonitorError> {
        Ok(Self {
            http: MonitorHttp::new(config)?,
            base_url: parse_base_url(base_url)?,
            default_key,
        })
    }

    async fn collect(&self, handle: &str, token: &str) -> Result<Vec<Post>, MonitorError> {
        let encoded = utf8_percent_encode(handle, NON_ALPHANUMERIC).to_string();
        let lookup_url = join(&self.base_url, &format!("2/users/by/username/{encoded}"))?;
        let lookup: UserLookup = self
            .http
            .get_json(&lookup_url, |req| req.bearer_auth(token))
            .await?;

        let Some(user) = lookup.data else {
            let message = lookup
                .errors
                .first()
                .and_then(|p| p.detail.clone().or_else(|| p.title.clone()))
                .unwrap_or_else(|| format!("user '{handle}' not found"));
            return Err(MonitorError::Api {
                platform: "twitter",
                message,
            });
        };

        let mut timeline_url = join(&self.base_url, &format!("2/users/{}/tweets", user.id))?;
        timeline_url
            .query_pairs_mut()
            .append_pair("max_results", &MAX_RESULTS.to_string())
            .append_pair("tweet.fields", "created_at,public_metrics,attachments");

        let timeline: Timeline = self
            .http
            .get_json(&timeline_url, |req| req.bearer_auth(token))
            .await?;

        Ok(timeline
            .data
            .into_iter()
            .filter_map(|tweet| to_post(handle, tweet))
            .collect())
    }
}

#[async_trait]
impl SourceMonitor for TwitterMonitor {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn fetch(&self, handle: &str, api_key: Option<&str>) -> Vec<Post> {
        let Some(token) = resolve_key(api_key, self.default_key.as_deref()) else {
            tracing::debug!(handle, "monitor: no twitter bearer token, skipping");
            return Vec::new();
        };
        degrade(Platform::Twitter, handle, self.collect(handle, token).await)
    }
}

fn to_post(handle: &str, tweet: Tweet) -> Option<Post> {
    let posted_at = tweet.created_at.as_deref().and_then(parse_timestamp)?;
    let metrics = tweet.public_metrics.unwrap_or_default();
    let has_media = tweet
        .attachments
        .as_ref()
        .is_some_and(|a| !a.media_keys.is_empty());
    let content_type = if has_media {
        ContentType::Image
    } else if tweet.text.contains("https://") || tweet.text.contains("http://") {
        ContentType::Link
    } else {
        ContentType::Text
    };

    Some(Post {
        platform: Platform::Twitter,
        url: Some(format!("https://twitter.com/{handle}/status/{}", tweet.id)),
        external_id: tweet.id,
        content_type,
        text: tweet.text,
        posted_at,
        likes: metrics.like_count,
        shares: metrics.retweet_count.saturating_add(metrics.quote_count),
        comments: metrics.reply_count,
        views: metrics.impression_count,
    })
}
