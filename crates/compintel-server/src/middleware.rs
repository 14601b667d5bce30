use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Request ID stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-key settings used by [`require_bearer_auth`].
///
/// Only SHA-256 digests of the configured keys are kept.
#[derive(Debug, Clone)]
pub struct AuthState {
    key_digests: Arc<Vec<[u8; 32]>>,
    pub enabled: bool,
}

impl AuthState {
    /// Reads `COMPINTEL_API_KEYS` (comma-separated bearer tokens).
    ///
    /// In development, missing keys disable auth. Elsewhere they fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("COMPINTEL_API_KEYS").unwrap_or_default();
        Self::from_keys(&raw, is_development)
    }

    pub fn from_keys(raw: &str, is_development: bool) -> anyhow::Result<Self> {
        let mut key_digests: Vec<[u8; 32]> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(digest)
            .collect();
        key_digests.sort_unstable();
        key_digests.dedup();

        if key_digests.is_empty() {
            if is_development {
                tracing::warn!(
                    "COMPINTEL_API_KEYS not set; bearer auth disabled in development environment"
                );
                return Ok(Self {
                    key_digests: Arc::new(Vec::new()),
                    enabled: false,
                });
            }

            anyhow::bail!(
                "COMPINTEL_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }

        Ok(Self {
            key_digests: Arc::new(key_digests),
            enabled: true,
        })
    }

    fn allows(&self, token: &str) -> bool {
        let candidate = digest(token);
        let matched = self
            .key_digests
            .iter()
            .fold(subtle::Choice::from(0), |acc, key| {
                acc | key.as_slice().ct_eq(candidate.as_slice())
            });
        matched.into()
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Uses the incoming `x-request-id` or generates a `UUIDv4`, stores it as
/// [`RequestId`], and echoes it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;

    if window.started_at.elapsed() >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        let state = AuthState::from_keys(" , ", true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[test]
    fn auth_state_requires_keys_outside_dev() {
        assert!(AuthState::from_keys("", false).is_err());
    }

    #[test]
    fn auth_state_matches_only_configured_keys() {
        let state = AuthState::from_keys("alpha-key, beta-key", false).expect("keys");
        assert!(state.enabled);
        assert!(state.allows("alpha-key"));
        assert!(state.allows("beta-key"));
        assert!(!state.allows("alpha"));
        assert!(!state.allows(""));
    }
}
