//! End-to-end pipeline checks against a real database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use compintel_core::{ContentType, JobStatus, Platform, Post};
use compintel_gamification::{GamificationTriggers, PgStatsStore};
use compintel_monitor::{MonitorRegistry, SourceMonitor};
use compintel_pipeline::{
    JobProcessor, MonitoringRequest, MonitoringScheduler, PgStore, PipelineStores,
    ProcessorConfig,
};
use sqlx::PgPool;
use uuid::Uuid;

struct CannedMonitor;

#[async_trait]
impl SourceMonitor for CannedMonitor {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn fetch(&self, _handle: &str, _api_key: Option<&str>) -> Vec<Post> {
        vec![Post {
            platform: Platform::Twitter,
            external_id: "1790000000000000001".to_string(),
            content_type: ContentType::Text,
            text: "Excited to announce our new release".to_string(),
            url: None,
            posted_at: Utc::now() - Duration::hours(2),
            likes: 40,
            shares: 5,
            comments: 3,
            views: Some(1_200),
        }]
    }
}

async fn seed_competitor(pool: &PgPool, user_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO competitors (id, user_id, name, social_media_handles) \
         VALUES ($1, $2, 'Rival Co', $3)",
    )
    .bind(id)
    .bind(user_id)
    .bind(serde_json::json!({"twitter": "@rivalco", "linkedin": "rival-co"}))
    .execute(pool)
    .await
    .expect("seed competitor");
    id
}

fn wire(pool: &PgPool) -> (MonitoringScheduler, JobProcessor) {
    let store = Arc::new(PgStore::new(pool.clone()));
    let stores = PipelineStores::shared(store);
    let triggers = GamificationTriggers::new(None, Arc::new(PgStatsStore::new(pool.clone())));

    let mut monitors = MonitorRegistry::new();
    monitors.register(Arc::new(CannedMonitor));

    let scheduler = MonitoringScheduler::new(
        Arc::clone(&stores.jobs),
        Arc::clone(&stores.directory),
        3,
    )
    .with_triggers(triggers.clone());
    let processor = JobProcessor::new(stores, monitors, triggers, ProcessorConfig::default());
    (scheduler, processor)
}

#[sqlx::test(migrations = "../../migrations")]
async fn schedule_is_idempotent_in_postgres(pool: PgPool) {
    let user = Uuid::new_v4();
    let competitor = seed_competitor(&pool, user).await;
    let (scheduler, _) = wire(&pool);

    let first = scheduler
        .schedule_monitoring(competitor, user, &MonitoringRequest::default())
        .await
        .expect("schedule");
    let second = scheduler
        .schedule_monitoring(competitor, user, &MonitoringRequest::default())
        .await
        .expect("schedule again");

    assert_eq!(first.len(), 2);
    assert!(second.is_empty());

    let competitors_monitored: i64 = sqlx::query_scalar(
        "SELECT competitors_monitored FROM competitive_stats WHERE user_id = $1",
    )
    .bind(user)
    .fetch_one(&pool)
    .await
    .expect("stats row");
    assert_eq!(competitors_monitored, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn processed_job_stores_posts_result_and_schedule(pool: PgPool) {
    let user = Uuid::new_v4();
    let competitor = seed_competitor(&pool, user).await;
    let (scheduler, processor) = wire(&pool);
    scheduler
        .schedule_monitoring(
            competitor,
            user,
            &MonitoringRequest {
                platforms: Some(vec![Platform::Twitter]),
                ..MonitoringRequest::default()
            },
        )
        .await
        .expect("schedule");
    let job = scheduler
        .monitoring_status(competitor, user)
        .await
        .expect("status")
        .remove(0);

    let now = Utc::now();
    let result = processor.process_job_at(&job, now).await.expect("attempt");
    assert!(result.success);
    assert!(result.changes_detected);

    let stored = scheduler
        .monitoring_status(competitor, user)
        .await
        .expect("status")
        .remove(0);
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(stored.retry_count, 0);
    assert!(stored.next_run_at > now + Duration::hours(23));

    let posts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM competitor_posts WHERE competitor_id = $1")
            .bind(competitor)
            .fetch_one(&pool)
            .await
            .expect("count posts");
    assert_eq!(posts, 1);

    let results = compintel_db::list_job_results(&pool, job.id, 10)
        .await
        .expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].result_data["new_posts"], 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_cycle_stamps_competitors(pool: PgPool) {
    let user = Uuid::new_v4();
    let competitor = seed_competitor(&pool, user).await;
    let (_, processor) = wire(&pool);

    let summary = processor
        .run_analysis_cycle(Utc::now())
        .await
        .expect("analysis");

    assert_eq!(summary.analyzed, 1);
    let last_analyzed: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT last_analyzed FROM competitors WHERE id = $1")
            .bind(competitor)
            .fetch_one(&pool)
            .await
            .expect("competitor");
    assert!(last_analyzed.is_some());

    let again = processor
        .run_analysis_cycle(Utc::now())
        .await
        .expect("analysis");
    assert_eq!(again.analyzed, 0);
    assert_eq!(again.unchanged, 1);
}
