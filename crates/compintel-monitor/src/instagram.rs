//! Instagram Graph API monitor using business discovery.

use async_trait::async_trait;
use compintel_core::{ContentType, Platform, Post};
use reqwest::Url;
use serde::Deserialize;

use crate::error::MonitorError;
use crate::http::{
    derived_external_id, join, parse_base_url, parse_timestamp, MonitorConfig, MonitorHttp,
};
use crate::{degrade, resolve_key, SourceMonitor};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/";
const GRAPH_VERSION: &str = "v18.0";
const MEDIA_LIMIT: u32 = 25;

#[derive(Debug, Deserialize)]
struct DiscoveryEnvelope {
    business_discovery: Option<BusinessDiscovery>,
}

#[derive(Debug, Deserialize)]
struct BusinessDiscovery {
    media: Option<MediaPage>,
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    id: Option<String>,
    caption: Option<String>,
    media_type: Option<String>,
    permalink: Option<String>,
    timestamp: String,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    comments_count: u64,
}

pub struct InstagramMonitor {
    http: MonitorHttp,
    base_url: Url,
    default_key: Option<String>,
}

impl InstagramMonitor {
    /// # Errors
    ///
    /// Returns [`MonitorError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &MonitorConfig, default_key: Option<String>) -> Result<Self, MonitorError> {
        Self::with_base_url(config, default_key, DEFAULT_BASE_URL)
    }

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
        // Instagram usernames are restricted to [A-Za-z0-9._]; anything else
        // would break the field expansion syntax.
        if handle.is_empty()
            || !handle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        {
            return Err(MonitorError::Api {
                platform: "instagram",
                message: format!("invalid username '{handle}'"),
            });
        }

        let fields = format!(
            "business_discovery.username({handle}){{media.limit({MEDIA_LIMIT})\
             {{id,caption,media_type,permalink,timestamp,like_count,comments_count}}}}"
        );
        let mut url = join(&self.base_url, &format!("{GRAPH_VERSION}/me"))?;
        url.query_pairs_mut()
            .append_pair("fields", &fields)
            .append_pair("access_token", token);

        let envelope: DiscoveryEnvelope = self.http.get_json(&url, |req| req).await?;
        let media = envelope
            .business_discovery
            .and_then(|d| d.media)
            .map(|m| m.data)
            .unwrap_or_default();

        Ok(media.into_iter().filter_map(to_post).collect())
    }
}

#[async_trait]
impl SourceMonitor for InstagramMonitor {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn fetch(&self, handle: &str, api_key: Option<&str>) -> Vec<Post> {
        let Some(token) = resolve_key(api_key, self.default_key.as_deref()) else {
            tracing::debug!(handle, "monitor: no instagram access token, skipping");
            return Vec::new();
        };
        degrade(Platform::Instagram, handle, self.collect(handle, token).await)
    }
}

fn to_post(media: Media) -> Option<Post> {
    let posted_at = parse_timestamp(&media.timestamp)?;
    let text = media.caption.unwrap_or_default();
    let content_type = media
        .media_type
        .as_deref()
        .map(str::to_ascii_lowercase)
        .and_then(|t| t.parse::<ContentType>().ok())
        .unwrap_or(ContentType::Image);
    let external_id = media
        .id
        .unwrap_or_else(|| derived_external_id(media.permalink.as_deref(), &text));

    Some(Post {
        platform: Platform::Instagram,
        external_id,
        content_type,
        text,
        url: media.permalink,
        posted_at,
        likes: media.like_count,
        shares: 0,
        comments: media.comments_count,
        views: None,
    })
}
