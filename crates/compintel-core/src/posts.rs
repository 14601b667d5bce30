use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{jobs::Platform, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Video,
    Link,
    Article,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Link => "link",
            Self::Article => "article",
        }
    }
}

impl FromStr for ContentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" | "photo" | "carousel_album" => Ok(Self::Image),
            "video" | "reel" => Ok(Self::Video),
            "link" => Ok(Self::Link),
            "article" => Ok(Self::Article),
            other => Err(CoreError::unknown("content type", other)),
        }
    }
}

/// A normalized piece of competitor activity returned by a source monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub platform: Platform,
    /// Platform id, or a derived content key when the platform has none.
    pub external_id: String,
    pub content_type: ContentType,
    pub text: String,
    pub url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub views: Option<u64>,
}

impl Post {
    /// Likes + shares + comments, plus views when `include_views` is set.
    #[must_use]
    pub fn engagement(&self, include_views: bool) -> u64 {
        let base = self
            .likes
            .saturating_add(self.shares)
            .saturating_add(self.comments);
        if include_views {
            base.saturating_add(self.views.unwrap_or(0))
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(views: Option<u64>) -> Post {
        Post {
            platform: Platform::Twitter,
            external_id: "1".to_string(),
            content_type: ContentType::Text,
            text: "launch day".to_string(),
            url: None,
            posted_at: Utc::now(),
            likes: 10,
            shares: 3,
            comments: 2,
            views,
        }
    }

    #[test]
    fn engagement_sums_interactions() {
        assert_eq!(post(Some(500)).engagement(false), 15);
    }

    #[test]
    fn engagement_optionally_includes_views() {
        assert_eq!(post(Some(500)).engagement(true), 515);
        assert_eq!(post(None).engagement(true), 15);
    }

    #[test]
    fn content_type_accepts_platform_aliases() {
        assert_eq!(
            "carousel_album".parse::<ContentType>().unwrap(),
            ContentType::Image
        );
        assert_eq!("reel".parse::<ContentType>().unwrap(), ContentType::Video);
    }
}
