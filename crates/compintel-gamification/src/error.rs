use thiserror::Error;

#[derive(Debug, Error)]
pub enum GamificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gamification endpoint rejected activity with status {status}")]
    Rejected { status: u16 },

    #[error("invalid gamification endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error(transparent)]
    Db(#[from] compintel_db::DbError),
}
