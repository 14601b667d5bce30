use super::*;

#[test]
fn frequency_parse_lossy_known_values() {
    assert_eq!(Frequency::parse_lossy("hourly"), Frequency::Hourly);
    assert_eq!(Frequency::parse_lossy("Daily"), Frequency::Daily);
    assert_eq!(Frequency::parse_lossy(" weekly "), Frequency::Weekly);
}

#[test]
fn frequency_unknown_defaults_to_daily() {
    assert_eq!(Frequency::parse_lossy("fortnightly"), Frequency::Daily);
    let parsed: Frequency = serde_json::from_str("\"monthly\"").unwrap();
    assert_eq!(parsed, Frequency::Daily);
}

#[test]
fn frequency_intervals() {
    assert_eq!(Frequency::Hourly.interval(), chrono::Duration::hours(1));
    assert_eq!(Frequency::Daily.interval(), chrono::Duration::hours(24));
    assert_eq!(Frequency::Weekly.interval(), chrono::Duration::days(7));
}

#[test]
fn platform_parses_x_as_twitter() {
    assert_eq!("X".parse::<Platform>().unwrap(), Platform::Twitter);
    assert!("myspace".parse::<Platform>().is_err());
}

#[test]
fn job_status_round_trips_through_str() {
    for status in [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Paused,
        JobStatus::Failed,
    ] {
        assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
    }
}

#[test]
fn social_config_serializes_with_type_tag() {
    let config = JobConfig::SocialMedia {
        platform: Platform::Instagram,
        handle: "rivalco".to_string(),
        monitoring: MonitoringSettings::default(),
    };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["type"], "social_media");
    assert_eq!(json["platform"], "instagram");
    assert_eq!(json["monitoring"]["track_engagement"], true);
}

#[test]
fn social_config_without_monitoring_uses_defaults() {
    let config: JobConfig = serde_json::from_value(serde_json::json!({
        "type": "social_media",
        "platform": "twitter",
        "handle": "rivalco"
    }))
    .unwrap();
    let JobConfig::SocialMedia { monitoring, .. } = config else {
        panic!("expected social media config");
    };
    assert_eq!(monitoring, MonitoringSettings::default());
}

#[test]
fn new_job_derives_type_and_target_from_config() {
    let config = JobConfig::SocialMedia {
        platform: Platform::Linkedin,
        handle: "rival-inc".to_string(),
        monitoring: MonitoringSettings::default(),
    };
    let job = MonitoringJob::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        config,
        Priority::High,
        Frequency::Hourly,
        Utc::now(),
    );
    assert_eq!(job.job_type, JobType::SocialMedia);
    assert_eq!(job.target, "rival-inc");
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.retry_count, 0);
    assert_eq!(job.max_retries, DEFAULT_MAX_RETRIES);
    assert_eq!(job.platform(), Some(Platform::Linkedin));
}

#[test]
fn non_social_configs_have_no_platform() {
    let config = JobConfig::Website {
        url: "https://rival.example.com".to_string(),
        selectors: vec![],
    };
    assert_eq!(config.platform(), None);
    assert_eq!(config.job_type(), JobType::Website);
    assert_eq!(config.target(), "https://rival.example.com");
}
