//! Database operations for `competitor_posts`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `competitor_posts` table (minus the surrogate key).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompetitorPostRow {
    pub competitor_id: Uuid,
    pub platform: String,
    pub external_id: String,
    pub content_type: String,
    pub text: String,
    pub url: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
    pub views: Option<i64>,
}

/// Inserts posts, skipping any `(competitor, platform, external_id)` already stored.
///
/// Returns how many rows were actually new.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails. Inserts run in one
/// transaction, so a failure stores nothing.
pub async fn insert_competitor_posts(
    pool: &PgPool,
    posts: &[CompetitorPostRow],
) -> Result<u64, DbError> {
    if posts.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0_u64;

    for post in posts {
        let result = sqlx::query(
            "INSERT INTO competitor_posts \
                 (competitor_id, platform, external_id, content_type, text, url, posted_at, \
                  likes, shares, comments, views) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (competitor_id, platform, external_id) DO NOTHING",
        )
        .bind(post.competitor_id)
        .bind(&post.platform)
        .bind(&post.external_id)
        .bind(&post.content_type)
        .bind(&post.text)
        .bind(post.url.as_deref())
        .bind(post.posted_at)
        .bind(post.likes)
        .bind(post.shares)
        .bind(post.comments)
        .bind(post.views)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// When the competitor's most recent post was collected, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_post_collected_at(
    pool: &PgPool,
    competitor_id: Uuid,
) -> Result<Option<DateTime<Utc>>, DbError> {
    let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(collected_at) FROM competitor_posts WHERE competitor_id = $1",
    )
    .bind(competitor_id)
    .fetch_one(pool)
    .await?;

    Ok(latest)
}

/// Posts for a competitor published at or after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_competitor_posts_since(
    pool: &PgPool,
    competitor_id: Uuid,
    since: DateTime<Utc>,
) -> Result<Vec<CompetitorPostRow>, DbError> {
    let rows = sqlx::query_as::<_, CompetitorPostRow>(
        "SELECT competitor_id, platform, external_id, content_type, text, url, posted_at, \
                likes, shares, comments, views \
         FROM competitor_posts \
         WHERE competitor_id = $1 AND posted_at >= $2 \
         ORDER BY posted_at ASC",
    )
    .bind(competitor_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
