//! Per-platform source monitors.
//!
//! A [`SourceMonitor`] turns a competitor handle into a list of normalized
//! [`Post`]s. Monitors never fail outward: missing credentials, transport
//! errors and malformed responses are logged and produce an empty list.

mod error;
mod facebook;
mod http;
mod instagram;
mod linkedin;
mod registry;
mod retry;
mod twitter;

use async_trait::async_trait;
use compintel_core::{Platform, Post};

pub use error::MonitorError;
pub use facebook::FacebookMonitor;
pub use http::{derived_external_id, MonitorConfig};
pub use instagram::InstagramMonitor;
pub use linkedin::LinkedinMonitor;
pub use registry::MonitorRegistry;
pub use twitter::TwitterMonitor;

/// Fetches recent activity for one platform.
#[async_trait]
pub trait SourceMonitor: Send + Sync {
    fn platform(&self) -> Platform;

    /// Recent posts for `handle`, newest first.
    ///
    /// `api_key` is the acting user's credential; monitors fall back to their
    /// process-wide default key when it is `None`.
    async fn fetch(&self, handle: &str, api_key: Option<&str>) -> Vec<Post>;
}

/// Collapses a monitor result into the never-failing `fetch` contract.
pub(crate) fn degrade(
    platform: Platform,
    handle: &str,
    result: Result<Vec<Post>, MonitorError>,
) -> Vec<Post> {
    match result {
        Ok(posts) => {
            tracing::debug!(
                platform = %platform,
                handle,
                count = posts.len(),
                "monitor: collected posts"
            );
            posts
        }
        Err(e) => {
            tracing::warn!(
                platform = %platform,
                handle,
                error = %e,
                "monitor: fetch failed, returning no posts"
            );
            Vec::new()
        }
    }
}

/// Picks the per-user key, else the default. Blank keys count as missing.
pub(crate) fn resolve_key<'a>(
    user_key: Option<&'a str>,
    default_key: Option<&'a str>,
) -> Option<&'a str> {
    user_key
        .filter(|k| !k.trim().is_empty())
        .or(default_key.filter(|k| !k.trim().is_empty()))
}
