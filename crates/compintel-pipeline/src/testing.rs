//! In-memory stores and monitors for state-machine tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use compintel_core::{
    CompetitiveStats, Competitor, ContentType, JobConfig, JobResult, MonitoringJob,
    MonitoringSettings, MonitoringStatus, NewAlert, Platform, Post, Priority, Frequency,
    Severity, StatCounter,
};
use compintel_gamification::{GamificationError, GamificationTriggers, StatsStore};
use compintel_monitor::{MonitorRegistry, SourceMonitor};
use uuid::Uuid;

use crate::store::{
    AlertStore, CompetitorDirectory, DueJobs, JobPatch, JobStore, PostStore, StoreError,
};

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub jobs: Mutex<BTreeMap<Uuid, MonitoringJob>>,
    pub results: Mutex<Vec<JobResult>>,
    pub competitors: Mutex<Vec<Competitor>>,
    pub api_keys: Mutex<HashMap<(Uuid, Platform), String>>,
    pub posts: Mutex<HashMap<Uuid, Vec<Post>>>,
    pub collected_at: Mutex<HashMap<Uuid, DateTime<Utc>>>,
    pub alerts: Mutex<Vec<NewAlert>>,
    pub analyzed: Mutex<HashMap<Uuid, DateTime<Utc>>>,
    pub fail_post_writes: AtomicBool,
    pub fail_insert_for: Mutex<Option<Platform>>,
    pub fail_posts_for: Mutex<HashSet<Uuid>>,
    pub status_history: Mutex<Vec<(Uuid, compintel_core::JobStatus)>>,
}

impl MemoryStore {
    pub fn with_competitor(competitor: Competitor) -> Arc<Self> {
        let store = Self::default();
        store.competitors.lock().unwrap().push(competitor);
        Arc::new(store)
    }

    pub fn job(&self, id: Uuid) -> MonitoringJob {
        self.jobs.lock().unwrap()[&id].clone()
    }

    pub fn put_job(&self, job: MonitoringJob) {
        self.jobs.lock().unwrap().insert(job.id, job);
    }

    pub fn results_for(&self, job_id: Uuid) -> Vec<JobResult> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect()
    }

    fn storage_error() -> StoreError {
        StoreError::Corrupt {
            entity: "test",
            id: "memory".to_string(),
            reason: "simulated write failure".to_string(),
        }
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &MonitoringJob) -> Result<(), StoreError> {
        if job.platform().is_some() && *self.fail_insert_for.lock().unwrap() == job.platform() {
            return Err(Self::storage_error());
        }
        self.put_job(job.clone());
        Ok(())
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::NotFound)?;
        let status = patch.status.filter(|_| patch.writes_status(job.status));
        patch.apply(job);
        if let Some(status) = status {
            self.status_history.lock().unwrap().push((job_id, status));
        }
        Ok(())
    }

    async fn select_due_jobs(&self, due: DueJobs) -> Result<Vec<MonitoringJob>, StoreError> {
        let mut jobs: Vec<MonitoringJob> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| {
                j.job_type == due.job_type && j.status == due.status && j.next_run_at <= due.due_at
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.next_run_at.cmp(&b.next_run_at))
        });
        Ok(jobs)
    }

    async fn select_by_competitor(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
        job_type: compintel_core::JobType,
    ) -> Result<Vec<MonitoringJob>, StoreError> {
        let mut jobs: Vec<MonitoringJob> = self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| {
                j.competitor_id == competitor_id && j.user_id == user_id && j.job_type == job_type
            })
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }

    async fn insert_result(&self, result: &JobResult) -> Result<(), StoreError> {
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn delete_results_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut results = self.results.lock().unwrap();
        let before = results.len();
        results.retain(|r| r.completed_at >= cutoff);
        Ok(u64::try_from(before - results.len()).unwrap())
    }
}

#[async_trait]
impl CompetitorDirectory for MemoryStore {
    async fn competitor(
        &self,
        competitor_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Competitor>, StoreError> {
        Ok(self
            .competitors
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == competitor_id && c.user_id == user_id)
            .cloned())
    }

    async fn active_competitors(&self) -> Result<Vec<Competitor>, StoreError> {
        Ok(self
            .competitors
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.monitoring_status == MonitoringStatus::Active)
            .cloned()
            .collect())
    }

    async fn mark_analyzed(
        &self,
        competitor_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.analyzed.lock().unwrap().insert(competitor_id, at);
        if let Some(c) = self
            .competitors
            .lock()
            .unwrap()
            .iter_mut()
            .find(|c| c.id == competitor_id)
        {
            c.last_analyzed = Some(at);
        }
        Ok(())
    }

    async fn user_api_key(
        &self,
        user_id: Uuid,
        platform: Platform,
    ) -> Result<Option<String>, StoreError> {
        Ok(self
            .api_keys
            .lock()
            .unwrap()
            .get(&(user_id, platform))
            .cloned())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn save_posts(&self, competitor_id: Uuid, posts: &[Post]) -> Result<u64, StoreError> {
        if self.fail_post_writes.load(Ordering::SeqCst) {
            return Err(Self::storage_error());
        }
        let mut stored = self.posts.lock().unwrap();
        let existing = stored.entry(competitor_id).or_default();
        let mut new = 0;
        for post in posts {
            let seen = existing
                .iter()
                .any(|p| p.platform == post.platform && p.external_id == post.external_id);
            if !seen {
                existing.push(post.clone());
                new += 1;
            }
        }
        if new > 0 {
            self.collected_at
                .lock()
                .unwrap()
                .insert(competitor_id, Utc::now());
        }
        Ok(new)
    }

    async fn posts_since(
        &self,
        competitor_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>, StoreError> {
        if self.fail_posts_for.lock().unwrap().contains(&competitor_id) {
            return Err(Self::storage_error());
        }
        Ok(self
            .posts
            .lock()
            .unwrap()
            .get(&competitor_id)
            .map(|posts| {
                posts
                    .iter()
                    .filter(|p| p.posted_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn last_collected_at(
        &self,
        competitor_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.collected_at.lock().unwrap().get(&competitor_id).copied())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_alert(&self, alert: &NewAlert) -> Result<Uuid, StoreError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(Uuid::new_v4())
    }
}

/// Counter-only stats store; enough to observe which triggers fired.
#[derive(Default)]
pub(crate) struct CountingStats {
    counters: Mutex<HashMap<(Uuid, StatCounter), i64>>,
}

impl CountingStats {
    pub fn get(&self, user_id: Uuid, counter: StatCounter) -> i64 {
        self.counters
            .lock()
            .unwrap()
            .get(&(user_id, counter))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl StatsStore for CountingStats {
    async fn increment_counter(
        &self,
        user_id: Uuid,
        counter: StatCounter,
        delta: i64,
    ) -> Result<i64, GamificationError> {
        let mut counters = self.counters.lock().unwrap();
        let value = counters.entry((user_id, counter)).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn set_counter(
        &self,
        user_id: Uuid,
        counter: StatCounter,
        value: i64,
    ) -> Result<(), GamificationError> {
        self.counters.lock().unwrap().insert((user_id, counter), value);
        Ok(())
    }

    async fn current_stats(&self, user_id: Uuid) -> Result<CompetitiveStats, GamificationError> {
        Ok(CompetitiveStats {
            user_id,
            ..CompetitiveStats::default()
        })
    }

    async fn record_achievement(
        &self,
        _user_id: Uuid,
        _achievement_id: &str,
        _points: i64,
    ) -> Result<bool, GamificationError> {
        Ok(false)
    }

    async fn alert_severity(
        &self,
        _user_id: Uuid,
        _alert_id: Uuid,
    ) -> Result<Option<Severity>, GamificationError> {
        Ok(None)
    }
}

pub(crate) fn triggers(stats: &Arc<CountingStats>) -> GamificationTriggers {
    GamificationTriggers::new(None, Arc::clone(stats) as Arc<dyn StatsStore>)
}

/// Returns canned posts, optionally after a delay.
pub(crate) struct StubMonitor {
    pub platform: Platform,
    pub posts: Vec<Post>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub keys_seen: Mutex<Vec<Option<String>>>,
}

impl StubMonitor {
    pub fn new(platform: Platform, posts: Vec<Post>) -> Self {
        Self {
            platform,
            posts,
            delay: None,
            calls: AtomicUsize::new(0),
            keys_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(platform: Platform, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(platform, Vec::new())
        }
    }
}

#[async_trait]
impl SourceMonitor for StubMonitor {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, _handle: &str, api_key: Option<&str>) -> Vec<Post> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys_seen
            .lock()
            .unwrap()
            .push(api_key.map(str::to_string));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.posts.clone()
    }
}

pub(crate) fn registry_with(monitor: Arc<StubMonitor>) -> MonitorRegistry {
    let mut registry = MonitorRegistry::new();
    registry.register(monitor);
    registry
}

pub(crate) fn competitor(user_id: Uuid, handles: &[(Platform, &str)]) -> Competitor {
    Competitor {
        id: Uuid::new_v4(),
        user_id,
        name: "Rival Co".to_string(),
        social_media_handles: handles
            .iter()
            .map(|(p, h)| (*p, (*h).to_string()))
            .collect(),
        monitoring_status: MonitoringStatus::Active,
        last_analyzed: None,
    }
}

pub(crate) fn social_job(competitor: &Competitor, platform: Platform, due: DateTime<Utc>) -> MonitoringJob {
    MonitoringJob::new(
        competitor.id,
        competitor.user_id,
        JobConfig::SocialMedia {
            platform,
            handle: competitor.handle_for(platform).unwrap_or("rivalco").to_string(),
            monitoring: MonitoringSettings::default(),
        },
        Priority::Medium,
        Frequency::Daily,
        due,
    )
}

pub(crate) fn post(platform: Platform, id: &str, posted_at: DateTime<Utc>, likes: u64) -> Post {
    Post {
        platform,
        external_id: id.to_string(),
        content_type: ContentType::Text,
        text: "new feature launch".to_string(),
        url: None,
        posted_at,
        likes,
        shares: 0,
        comments: 0,
        views: None,
    }
}
