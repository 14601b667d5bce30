use thiserror::Error;

/// Errors raised inside a source monitor. They never leave [`crate::SourceMonitor::fetch`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Network or TLS failure, or a non-2xx status from the platform.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform answered 2xx but reported an error in the body.
    #[error("{platform} API error: {message}")]
    Api {
        platform: &'static str,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A configured base URL could not be parsed.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
