use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{jobs::Platform, CoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitoringStatus {
    Active,
    Paused,
    Inactive,
}

impl MonitoringStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Inactive => "inactive",
        }
    }
}

impl FromStr for MonitoringStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "inactive" => Ok(Self::Inactive),
            other => Err(CoreError::unknown("monitoring status", other)),
        }
    }
}

/// The slice of a competitor record the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub social_media_handles: BTreeMap<Platform, String>,
    pub monitoring_status: MonitoringStatus,
    pub last_analyzed: Option<DateTime<Utc>>,
}

impl Competitor {
    /// Handle for `platform`, ignoring blank entries.
    #[must_use]
    pub fn handle_for(&self, platform: Platform) -> Option<&str> {
        self.social_media_handles
            .get(&platform)
            .map(|h| h.trim().trim_start_matches('@'))
            .filter(|h| !h.is_empty())
    }
}
