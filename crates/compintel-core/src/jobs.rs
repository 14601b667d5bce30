//! Monitoring jobs, their typed configuration, and per-attempt results.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreError;

/// Retries allowed before a job becomes terminally `failed`.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Website,
    SocialMedia,
    News,
    JobPosting,
    AppStore,
}

impl JobType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::SocialMedia => "social_media",
            Self::News => "news",
            Self::JobPosting => "job_posting",
            Self::AppStore => "app_store",
        }
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "website" => Ok(Self::Website),
            "social_media" => Ok(Self::SocialMedia),
            "news" => Ok(Self::News),
            "job_posting" => Ok(Self::JobPosting),
            "app_store" => Ok(Self::AppStore),
            other => Err(CoreError::unknown("job type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::unknown("job status", other)),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(CoreError::unknown("priority", other)),
        }
    }
}

/// How a job's schedule value is interpreted. Only fixed intervals exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    #[default]
    Interval,
}

impl ScheduleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Interval => "interval",
        }
    }
}

/// Interval between successful runs.
///
/// Unrecognised values deserialize (and parse) as [`Frequency::Daily`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Frequency {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl Frequency {
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" => Self::Hourly,
            "weekly" => Self::Weekly,
            _ => Self::Daily,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    #[must_use]
    pub fn interval(self) -> chrono::Duration {
        match self {
            Self::Hourly => chrono::Duration::hours(1),
            Self::Daily => chrono::Duration::hours(24),
            Self::Weekly => chrono::Duration::days(7),
        }
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        Self::parse_lossy(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
}

impl Platform {
    /// Platforms monitored when a request does not name any.
    pub const DEFAULTS: [Platform; 4] = [
        Platform::Linkedin,
        Platform::Twitter,
        Platform::Facebook,
        Platform::Instagram,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
        }
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Self::Linkedin),
            "twitter" | "x" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            _ => Err(CoreError::unknown("platform", s)),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitoring options carried by social-media jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    #[serde(default = "default_true")]
    pub track_engagement: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            track_engagement: true,
            keywords: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-job configuration, one shape per [`JobType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobConfig {
    SocialMedia {
        platform: Platform,
        handle: String,
        #[serde(default)]
        monitoring: MonitoringSettings,
    },
    Website {
        url: String,
        #[serde(default)]
        selectors: Vec<String>,
    },
    News {
        query: String,
    },
    JobPosting {
        board: String,
        company: String,
    },
    AppStore {
        store: String,
        app_id: String,
    },
}

impl JobConfig {
    #[must_use]
    pub fn job_type(&self) -> JobType {
        match self {
            Self::SocialMedia { .. } => JobType::SocialMedia,
            Self::Website { .. } => JobType::Website,
            Self::News { .. } => JobType::News,
            Self::JobPosting { .. } => JobType::JobPosting,
            Self::AppStore { .. } => JobType::AppStore,
        }
    }

    #[must_use]
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Self::SocialMedia { platform, .. } => Some(*platform),
            _ => None,
        }
    }

    /// The URL or handle the job watches.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::SocialMedia { handle, .. } => handle,
            Self::Website { url, .. } => url,
            Self::News { query } => query,
            Self::JobPosting { company, .. } => company,
            Self::AppStore { app_id, .. } => app_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringJob {
    pub id: Uuid,
    pub competitor_id: Uuid,
    pub user_id: Uuid,
    pub job_type: JobType,
    pub target: String,
    pub priority: Priority,
    pub schedule_kind: ScheduleKind,
    pub frequency: Frequency,
    pub status: JobStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub config: JobConfig,
    pub created_at: DateTime<Utc>,
}

impl MonitoringJob {
    /// Builds a fresh `pending` job whose type and target follow from `config`.
    #[must_use]
    pub fn new(
        competitor_id: Uuid,
        user_id: Uuid,
        config: JobConfig,
        priority: Priority,
        frequency: Frequency,
        next_run_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            competitor_id,
            user_id,
            job_type: config.job_type(),
            target: config.target().to_string(),
            priority,
            schedule_kind: ScheduleKind::Interval,
            frequency,
            status: JobStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            next_run_at,
            last_run_at: None,
            config,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn platform(&self) -> Option<Platform> {
        self.config.platform()
    }
}

/// One row of the append-only attempt log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub id: Uuid,
    pub job_id: Uuid,
    pub success: bool,
    pub payload: serde_json::Value,
    pub error_message: Option<String>,
    pub execution_time_ms: u64,
    pub changes_detected: bool,
    pub retry_count: u32,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "jobs_test.rs"]
mod tests;
