//! Shared HTTP plumbing for the platform monitors.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Url};
use sha2::{Digest, Sha256};

use crate::error::MonitorError;
use crate::retry::retry_with_backoff;

const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client settings shared by every monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: "compintel/0.1 (competitive-intelligence)".to_string(),
            max_retries: 2,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn from_app_config(config: &compintel_core::AppConfig) -> Self {
        Self {
            request_timeout_secs: config.monitor_request_timeout_secs,
            user_agent: config.monitor_user_agent.clone(),
            max_retries: config.monitor_max_retries,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

/// A `reqwest` client plus the retry policy for one monitor.
#[derive(Debug, Clone)]
pub(crate) struct MonitorHttp {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl MonitorHttp {
    pub(crate) fn new(config: &MonitorConfig) -> Result<Self, MonitorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    /// GETs `url` with retry and decodes the body as `T`.
    ///
    /// `decorate` adds auth and platform headers to each attempt.
    pub(crate) async fn get_json<T, D>(&self, url: &Url, decorate: D) -> Result<T, MonitorError>
    where
        T: serde::de::DeserializeOwned,
        D: Fn(RequestBuilder) -> RequestBuilder,
    {
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let request = decorate(self.client.get(url.clone()));
            let response = request.send().await?.error_for_status()?;
            Ok(response.text().await?)
        })
        .await?;

        serde_json::from_str(&body).map_err(|e| MonitorError::Deserialize {
            context: redact_query(url),
            source: e,
        })
    }
}

/// Parses a base URL, normalising it to end in exactly one slash.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, MonitorError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| MonitorError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

/// Joins a relative path onto a normalised base URL.
pub(crate) fn join(base: &Url, path: &str) -> Result<Url, MonitorError> {
    base.join(path).map_err(|e| MonitorError::InvalidBaseUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })
}

/// Stable content key for posts the platform returns without an id.
#[must_use]
pub fn derived_external_id(url: Option<&str>, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.unwrap_or_default().as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..16].iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256:{hex}")
}

/// Accepts RFC 3339 and the Graph API's `+0000` offset form.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn redact_query(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_url_appends_single_slash() {
        let url = parse_base_url("https://api.example.com//").expect("parse");
        assert_eq!(url.as_str(), "https://api.example.com/");
    }

    #[test]
    fn parse_timestamp_accepts_graph_offset() {
        let ts = parse_timestamp("2024-03-01T12:30:00+0000").expect("parse");
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:00+00:00");
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339() {
        assert!(parse_timestamp("2024-03-01T12:30:00.000Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn derived_ids_are_stable_and_distinct() {
        let a = derived_external_id(Some("https://x.test/1"), "hello");
        let b = derived_external_id(Some("https://x.test/1"), "hello");
        let c = derived_external_id(Some("https://x.test/2"), "hello");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("sha256:"));
        assert_eq!(a.len(), "sha256:".len() + 32);
    }

    #[test]
    fn redact_query_drops_tokens() {
        let url = Url::parse("https://graph.test/v18.0/page/posts?access_token=secret").expect("url");
        assert_eq!(redact_query(&url), "https://graph.test/v18.0/page/posts");
    }
}
