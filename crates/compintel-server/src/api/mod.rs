mod alerts;
mod monitoring;

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use compintel_gamification::GamificationTriggers;
use compintel_pipeline::{MonitoringScheduler, SchedulerError, StoreError};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub scheduler: MonitoringScheduler,
    pub triggers: GamificationTriggers,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// The user a request acts for, read from the `x-user-id` header.
///
/// Authentication happens upstream; this only trusts and parses the header.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub Uuid);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|r| r.0.clone())
            .unwrap_or_default();

        let Some(raw) = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            return Err(ApiError::new(
                request_id,
                "bad_request",
                "x-user-id header is required",
            ));
        };

        Uuid::parse_str(raw.trim()).map(ActingUser).map_err(|_| {
            ApiError::new(
                request_id,
                "validation_error",
                "x-user-id must be a UUID",
            )
        })
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &compintel_db::DbError) -> ApiError {
    if matches!(error, compintel_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_scheduler_error(request_id: String, error: &SchedulerError) -> ApiError {
    match error {
        SchedulerError::CompetitorNotFound(id) => {
            ApiError::new(request_id, "not_found", format!("competitor {id} not found"))
        }
        SchedulerError::Store(StoreError::NotFound) => {
            ApiError::new(request_id, "not_found", "record not found")
        }
        SchedulerError::Store(e) => {
            tracing::error!(error = %e, "scheduler request failed");
            ApiError::new(request_id, "internal_error", "monitoring store failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(USER_ID_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/alerts", get(alerts::list_alerts))
        .route("/api/v1/alerts/{id}/read", post(alerts::mark_read))
        .route("/api/v1/alerts/{id}/archive", post(alerts::archive))
        .route(
            "/api/v1/competitors/{id}/jobs",
            get(monitoring::list_jobs),
        )
        .route(
            "/api/v1/competitors/{id}/monitoring",
            post(monitoring::schedule).patch(monitoring::update),
        )
        .route(
            "/api/v1/competitors/{id}/monitoring/pause",
            post(monitoring::pause),
        )
        .route(
            "/api/v1/competitors/{id}/monitoring/resume",
            post(monitoring::resume),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match compintel_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
