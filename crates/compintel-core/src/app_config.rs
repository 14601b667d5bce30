use std::net::SocketAddr;

use crate::jobs::Platform;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide default API credentials, one per monitored platform.
///
/// Used when a user has not stored their own key for a platform.
#[derive(Clone, Default)]
pub struct PlatformKeys {
    pub twitter: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
}

impl PlatformKeys {
    #[must_use]
    pub fn get(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Twitter => self.twitter.as_deref(),
            Platform::Facebook => self.facebook.as_deref(),
            Platform::Instagram => self.instagram.as_deref(),
            Platform::Linkedin => self.linkedin.as_deref(),
        }
    }
}

impl std::fmt::Debug for PlatformKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("PlatformKeys")
            .field("twitter", &redact(&self.twitter))
            .field("facebook", &redact(&self.facebook))
            .field("instagram", &redact(&self.instagram))
            .field("linkedin", &redact(&self.linkedin))
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub process_interval_secs: u64,
    pub job_timeout_secs: u64,
    pub max_retries: u32,
    pub result_retention_days: u32,
    pub cleanup_cron: String,
    pub monitor_request_timeout_secs: u64,
    pub monitor_user_agent: String,
    pub monitor_max_retries: u32,
    pub gamification_url: Option<String>,
    pub gamification_token: Option<String>,
    pub platform_keys: PlatformKeys,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("process_interval_secs", &self.process_interval_secs)
            .field("job_timeout_secs", &self.job_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("result_retention_days", &self.result_retention_days)
            .field("cleanup_cron", &self.cleanup_cron)
            .field(
                "monitor_request_timeout_secs",
                &self.monitor_request_timeout_secs,
            )
            .field("monitor_user_agent", &self.monitor_user_agent)
            .field("monitor_max_retries", &self.monitor_max_retries)
            .field("gamification_url", &self.gamification_url)
            .field(
                "gamification_token",
                &self.gamification_token.as_ref().map(|_| "[redacted]"),
            )
            .field("platform_keys", &self.platform_keys)
            .finish()
    }
}
