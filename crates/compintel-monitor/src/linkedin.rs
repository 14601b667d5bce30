//! LinkedIn organization posts monitor (Posts API + social metadata).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compintel_core::{ContentType, Platform, Post};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;

use crate::error::MonitorError;
use crate::http::{derived_external_id, join, parse_base_url, MonitorConfig, MonitorHttp};
use crate::{degrade, resolve_key, SourceMonitor};

const DEFAULT_BASE_URL: &str = "https://api.linkedin.com/";
const LINKEDIN_VERSION: &str = "202401";
const PAGE_COUNT: u32 = 20;

#[derive(Debug, Deserialize)]
struct PostsPage {
    #[serde(default)]
    elements: Vec<LinkedinPost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedinPost {
    id: Option<String>,
    #[serde(default)]
    commentary: String,
    created_at: Option<i64>,
    published_at: Option<i64>,
    content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SocialMetadataBatch {
    #[serde(default)]
    results: HashMap<String, SocialMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialMetadata {
    #[serde(default)]
    reaction_summaries: HashMap<String, ReactionSummary>,
    comment_summary: Option<CommentSummary>,
}

#[derive(Debug, Deserialize)]
struct ReactionSummary {
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct CommentSummary {
    #[serde(default)]
    count: u64,
}

pub struct LinkedinMonitor {
    http: MonitorHttp,
    base_url: Url,
    default_key: Option<String>,
}

impl LinkedinMonitor {
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
        let author = organization_urn(handle);
        let decorate = |req: RequestBuilder| {
            req.bearer_auth(token)
                .header("LinkedIn-Version", LINKEDIN_VERSION)
                .header("X-Restli-Protocol-Version", "2.0.0")
        };

        let mut posts_url = join(&self.base_url, "rest/posts")?;
        posts_url
            .query_pairs_mut()
            .append_pair("author", &author)
            .append_pair("q", "author")
            .append_pair("count", &PAGE_COUNT.to_string());

        let page: PostsPage = self.http.get_json(&posts_url, decorate).await?;
        let mut posts: Vec<Post> = page.elements.into_iter().filter_map(to_post).collect();

        if posts.is_empty() {
            return Ok(posts);
        }

        // Engagement lives behind a separate endpoint; missing metadata leaves counts at zero.
        let ids: Vec<&str> = posts.iter().map(|p| p.external_id.as_str()).collect();
        let mut meta_url = join(&self.base_url, "rest/socialMetadata")?;
        meta_url
            .query_pairs_mut()
            .append_pair("ids", &format!("List({})", ids.join(",")));

        match self
            .http
            .get_json::<SocialMetadataBatch, _>(&meta_url, decorate)
            .await
        {
            Ok(batch) => apply_metadata(&mut posts, &batch),
            Err(e) => {
                tracing::warn!(
                    handle,
                    error = %e,
                    "monitor: linkedin social metadata unavailable"
                );
            }
        }

        Ok(posts)
    }
}

#[async_trait]
impl SourceMonitor for LinkedinMonitor {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    async fn fetch(&self, handle: &str, api_key: Option<&str>) -> Vec<Post> {
        let Some(token) = resolve_key(api_key, self.default_key.as_deref()) else {
            tracing::debug!(handle, "monitor: no linkedin access token, skipping");
            return Vec::new();
        };
        degrade(Platform::Linkedin, handle, self.collect(handle, token).await)
    }
}

/// Accepts a bare organization id or a full URN.
fn organization_urn(handle: &str) -> String {
    if handle.starts_with("urn:li:") {
        handle.to_string()
    } else {
        format!("urn:li:organization:{handle}")
    }
}

fn to_post(post: LinkedinPost) -> Option<Post> {
    let millis = post.published_at.or(post.created_at)?;
    let posted_at = DateTime::<Utc>::from_timestamp_millis(millis)?;
    let content_type = match &post.content {
        Some(content) if content.get("article").is_some() => ContentType::Article,
        Some(content) if content.get("media").is_some() || content.get("multiImage").is_some() => {
            ContentType::Image
        }
        Some(_) => ContentType::Link,
        None => ContentType::Text,
    };
    let url = post
        .id
        .as_ref()
        .map(|id| format!("https://www.linkedin.com/feed/update/{id}"));
    let external_id = post
        .id
        .unwrap_or_else(|| derived_external_id(url.as_deref(), &post.commentary));

    Some(Post {
        platform: Platform::Linkedin,
        external_id,
        content_type,
        text: post.commentary,
        url,
        posted_at,
        likes: 0,
        shares: 0,
        comments: 0,
        views: None,
    })
}

fn apply_metadata(posts: &mut [Post], batch: &SocialMetadataBatch) {
    for post in posts {
        if let Some(meta) = batch.results.get(&post.external_id) {
            post.likes = meta.reaction_summaries.values().map(|r| r.count).sum();
            post.comments = meta.comment_summary.as_ref().map_or(0, |c| c.count);
        }
    }
}
