//! Gamification trigger layer: pipeline events become counter, point and
//! achievement updates, via the host's endpoint when configured and a direct
//! stats write otherwise.

mod achievements;
mod activity;
mod error;
mod remote;
mod store;
mod triggers;

pub use achievements::{reached, Achievement, ACHIEVEMENTS};
pub use activity::{Activity, ActivityType, TaskPriority, VictoryData, VictoryTier};
pub use error::GamificationError;
pub use remote::RemoteGamificationClient;
pub use store::{PgStatsStore, StatsStore};
pub use triggers::{GamificationTriggers, TriggerOutcome};
