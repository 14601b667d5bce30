//! Facebook Graph API page-posts monitor.

use async_trait::async_trait;
use compintel_core::{ContentType, Platform, Post};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Url;
use serde::Deserialize;

use crate::error::MonitorError;
use crate::http::{
    derived_external_id, join, parse_base_url, parse_timestamp, MonitorConfig, MonitorHttp,
};
use crate::{degrade, resolve_key, SourceMonitor};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/";
const GRAPH_VERSION: &str = "v18.0";
const POST_FIELDS: &str = "id,message,created_time,permalink_url,shares,\
reactions.summary(true).limit(0),comments.summary(true).limit(0),attachments{media_type}";
const PAGE_LIMIT: u32 = 25;

#[derive(Debug, Deserialize)]
struct PostsPage {
    #[serde(default)]
    data: Vec<GraphPost>,
}

#[derive(Debug, Deserialize)]
struct GraphPost {
    id: Option<String>,
    message: Option<String>,
    created_time: String,
    permalink_url: Option<String>,
    shares: Option<Count>,
    reactions: Option<Summarized>,
    comments: Option<Summarized>,
    attachments: Option<AttachmentList>,
}

#[derive(Debug, Deserialize)]
struct Count {
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct Summarized {
    summary: Option<Summary>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct AttachmentList {
    #[serde(default)]
    data: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
struct Attachment {
    media_type: Option<String>,
}

pub struct FacebookMonitor {
    http: MonitorHttp,
    base_url: Url,
    default_key: Option<String>,
}

impl FacebookMonitor {
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
        let encoded = utf8_percent_encode(handle, NON_ALPHANUMERIC).to_string();
        let mut url = join(&self.base_url, &format!("{GRAPH_VERSION}/{encoded}/posts"))?;
        url.query_pairs_mut()
            .append_pair("fields", POST_FIELDS)
            .append_pair("limit", &PAGE_LIMIT.to_string())
            .append_pair("access_token", token);

        let page: PostsPage = self.http.get_json(&url, |req| req).await?;
        Ok(page.data.into_iter().filter_map(to_post).collect())
    }
}

#[async_trait]
impl SourceMonitor for FacebookMonitor {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn fetch(&self, handle: &str, api_key: Option<&str>) -> Vec<Post> {
        let Some(token) = resolve_key(api_key, self.default_key.as_deref()) else {
            tracing::debug!(handle, "monitor: no facebook access token, skipping");
            return Vec::new();
        };
        degrade(Platform::Facebook, handle, self.collect(handle, token).await)
    }
}

fn to_post(post: GraphPost) -> Option<Post> {
    let posted_at = parse_timestamp(&post.created_time)?;
    let text = post.message.unwrap_or_default();
    let content_type = post
        .attachments
        .as_ref()
        .and_then(|a| a.data.first())
        .and_then(|a| a.media_type.as_deref())
        .map_or(ContentType::Text, |media| match media {
            "photo" | "album" => ContentType::Image,
            "video" => ContentType::Video,
            "link" | "share" => ContentType::Link,
            "article" | "note" => ContentType::Article,
            _ => ContentType::Text,
        });
    let external_id = post
        .id
        .unwrap_or_else(|| derived_external_id(post.permalink_url.as_deref(), &text));

    Some(Post {
        platform: Platform::Facebook,
        external_id,
        content_type,
        text,
        url: post.permalink_url,
        posted_at,
        likes: post.reactions.and_then(|r| r.summary).map_or(0, |s| s.total_count),
        shares: post.shares.map_or(0, |s| s.count),
        comments: post.comments.and_then(|c| c.summary).map_or(0, |s| s.total_count),
        views: None,
    })
}
