//! Integration tests for the HTTP monitors using wiremock HTTP mocks.

use compintel_core::{ContentType, Platform};
use compintel_monitor::{
    FacebookMonitor, InstagramMonitor, LinkedinMonitor, MonitorConfig, SourceMonitor,
    TwitterMonitor,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        request_timeout_secs: 5,
        user_agent: "compintel-test".to_string(),
        max_retries: 2,
        backoff_base_ms: 0,
    }
}

#[tokio::test]
async fn twitter_fetch_returns_normalized_posts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/rivalco"))
        .and(header("authorization", "Bearer default-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"id": "42"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2/users/42/tweets"))
        .and(query_param("max_results", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {
                    "id": "1001",
                    "text": "Launching our new plan today",
                    "created_at": "2024-05-01T14:00:00.000Z",
                    "public_metrics": {
                        "like_count": 40, "retweet_count": 5, "quote_count": 1,
                        "reply_count": 3, "impression_count": 900
                    }
                },
                {
                    "id": "1002",
                    "text": "Screenshot of the dashboard",
                    "created_at": "2024-05-02T09:00:00.000Z",
                    "attachments": {"media_keys": ["3_1"]},
                    "public_metrics": {"like_count": 10, "retweet_count": 0, "reply_count": 0}
                }
            ]
        })))
        .mount(&server)
        .await;

    let monitor = TwitterMonitor::with_base_url(
        &fast_config(),
        Some("default-token".to_string()),
        &server.uri(),
    )
    .expect("monitor");
    let posts = monitor.fetch("rivalco", None).await;

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].external_id, "1001");
    assert_eq!(posts[0].likes, 40);
    assert_eq!(posts[0].shares, 6);
    assert_eq!(posts[0].comments, 3);
    assert_eq!(posts[0].views, Some(900));
    assert_eq!(posts[0].content_type, ContentType::Text);
    assert_eq!(posts[1].content_type, ContentType::Image);
    assert_eq!(
        posts[0].url.as_deref(),
        Some("https://twitter.com/rivalco/status/1001")
    );
}

#[tokio::test]
async fn twitter_prefers_user_key_over_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/rivalco"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"id": "7"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2/users/7/tweets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"meta": {}})))
        .mount(&server)
        .await;

    let monitor =
        TwitterMonitor::with_base_url(&fast_config(), Some("default".to_string()), &server.uri())
            .expect("monitor");
    let posts = monitor.fetch("rivalco", Some("user-token")).await;
    assert!(posts.is_empty());
}

#[tokio::test]
async fn missing_credentials_yield_no_posts_without_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let monitor =
        TwitterMonitor::with_base_url(&fast_config(), None, &server.uri()).expect("monitor");
    assert!(monitor.fetch("rivalco", None).await.is_empty());
}

#[tokio::test]
async fn server_errors_are_retried_then_degrade_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/rivalco"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let monitor =
        TwitterMonitor::with_base_url(&fast_config(), Some("t".to_string()), &server.uri())
            .expect("monitor");
    assert!(monitor.fetch("rivalco", None).await.is_empty());
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/rivalco"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let monitor =
        TwitterMonitor::with_base_url(&fast_config(), Some("t".to_string()), &server.uri())
            .expect("monitor");
    assert!(monitor.fetch("rivalco", None).await.is_empty());
}

#[tokio::test]
async fn twitter_unknown_user_degrades_to_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errors": [{"title": "Not Found Error", "detail": "Could not find user with username: [ghost]."}]
        })))
        .mount(&server)
        .await;

    let monitor =
        TwitterMonitor::with_base_url(&fast_config(), Some("t".to_string()), &server.uri())
            .expect("monitor");
    assert!(monitor.fetch("ghost", None).await.is_empty());
}

#[tokio::test]
async fn facebook_fetch_reads_summaries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v18.0/rivalco/posts"))
        .and(query_param("access_token", "fb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {
                    "id": "123_456",
                    "message": "Our spring sale starts now",
                    "created_time": "2024-04-10T16:20:00+0000",
                    "permalink_url": "https://facebook.com/123/posts/456",
                    "shares": {"count": 4},
                    "reactions": {"data": [], "summary": {"total_count": 88}},
                    "comments": {"data": [], "summary": {"total_count": 12}},
                    "attachments": {"data": [{"media_type": "photo"}]}
                },
                {
                    "message": "Post with no id",
                    "created_time": "2024-04-11T08:00:00+0000"
                }
            ]
        })))
        .mount(&server)
        .await;

    let monitor =
        FacebookMonitor::with_base_url(&fast_config(), Some("fb-token".to_string()), &server.uri())
            .expect("monitor");
    let posts = monitor.fetch("rivalco", None).await;

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].platform, Platform::Facebook);
    assert_eq!(posts[0].likes, 88);
    assert_eq!(posts[0].shares, 4);
    assert_eq!(posts[0].comments, 12);
    assert_eq!(posts[0].content_type, ContentType::Image);
    assert!(posts[1].external_id.starts_with("sha256:"));
}

#[tokio::test]
async fn instagram_fetch_maps_media_types() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v18.0/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "business_discovery": {
                "media": {
                    "data": [
                        {
                            "id": "17890",
                            "caption": "Behind the scenes",
                            "media_type": "VIDEO",
                            "permalink": "https://instagram.com/p/abc",
                            "timestamp": "2024-06-01T10:00:00+0000",
                            "like_count": 150,
                            "comments_count": 9
                        },
                        {
                            "id": "17891",
                            "media_type": "CAROUSEL_ALBUM",
                            "timestamp": "2024-06-02T10:00:00+0000"
                        }
                    ]
                }
            }
        })))
        .mount(&server)
        .await;

    let monitor = InstagramMonitor::with_base_url(
        &fast_config(),
        Some("ig-token".to_string()),
        &server.uri(),
    )
    .expect("monitor");
    let posts = monitor.fetch("rival.co", None).await;

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].content_type, ContentType::Video);
    assert_eq!(posts[0].likes, 150);
    assert_eq!(posts[1].content_type, ContentType::Image);
    assert_eq!(posts[1].text, "");
}

#[tokio::test]
async fn instagram_rejects_malformed_username() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let monitor =
        InstagramMonitor::with_base_url(&fast_config(), Some("t".to_string()), &server.uri())
            .expect("monitor");
    assert!(monitor.fetch("bad){handle", None).await.is_empty());
}

#[tokio::test]
async fn linkedin_fetch_merges_social_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/posts"))
        .and(query_param("author", "urn:li:organization:555"))
        .and(header("LinkedIn-Version", "202401"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "elements": [
                {
                    "id": "urn:li:share:1",
                    "commentary": "We are hiring engineers",
                    "publishedAt": 1_714_000_000_000_i64
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/socialMetadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {
                "urn:li:share:1": {
                    "reactionSummaries": {"LIKE": {"count": 20}, "PRAISE": {"count": 5}},
                    "commentSummary": {"count": 7}
                }
            }
        })))
        .mount(&server)
        .await;

    let monitor =
        LinkedinMonitor::with_base_url(&fast_config(), Some("li-token".to_string()), &server.uri())
            .expect("monitor");
    let posts = monitor.fetch("555", None).await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].likes, 25);
    assert_eq!(posts[0].comments, 7);
    assert_eq!(posts[0].content_type, ContentType::Text);
}

#[tokio::test]
async fn linkedin_metadata_failure_keeps_posts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "elements": [
                {"id": "urn:li:share:9", "commentary": "Update", "createdAt": 1_714_000_000_000_i64}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/socialMetadata"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let monitor =
        LinkedinMonitor::with_base_url(&fast_config(), Some("li-token".to_string()), &server.uri())
            .expect("monitor");
    let posts = monitor.fetch("555", None).await;

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].likes, 0);
}
