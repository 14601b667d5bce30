//! Domain types and configuration shared by every compintel crate.

pub mod alerts;
pub mod app_config;
pub mod competitors;
pub mod config;
pub mod insights;
pub mod jobs;
pub mod posts;
pub mod stats;

use thiserror::Error;

pub use alerts::{Alert, AlertType, NewAlert, RecommendedAction, Severity};
pub use app_config::{AppConfig, Environment, PlatformKeys};
pub use competitors::{Competitor, MonitoringStatus};
pub use config::{load_app_config, load_app_config_from_env};
pub use insights::{Insight, InsightCategory, Level};
pub use jobs::{
    Frequency, JobConfig, JobResult, JobStatus, JobType, MonitoringJob, MonitoringSettings,
    Platform, Priority, ScheduleKind, DEFAULT_MAX_RETRIES,
};
pub use posts::{ContentType, Post};
pub use stats::{CompetitiveStats, StatCounter};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

impl CoreError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}
