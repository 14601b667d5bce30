//! Monitoring job endpoints for one competitor.
//!
//! - `GET   /api/v1/competitors/{id}/jobs`
//! - `POST  /api/v1/competitors/{id}/monitoring`
//! - `PATCH /api/v1/competitors/{id}/monitoring`
//! - `POST  /api/v1/competitors/{id}/monitoring/pause`
//! - `POST  /api/v1/competitors/{id}/monitoring/resume`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use compintel_core::MonitoringJob;
use compintel_pipeline::{MonitoringRequest, MonitoringUpdate, UpdateSummary};
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_scheduler_error, ActingUser, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ScheduledJobs {
    competitor_id: Uuid,
    created: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub(super) struct JobsChanged {
    competitor_id: Uuid,
    jobs: usize,
}

pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(competitor_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<MonitoringJob>>>, ApiError> {
    let jobs = state
        .scheduler
        .monitoring_status(competitor_id, user_id)
        .await
        .map_err(|e| map_scheduler_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: jobs,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn schedule(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(competitor_id): Path<Uuid>,
    Json(request): Json<MonitoringRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScheduledJobs>>), ApiError> {
    if request.platforms.as_ref().is_some_and(Vec::is_empty) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "platforms must not be empty",
        ));
    }

    let created = state
        .scheduler
        .schedule_monitoring(competitor_id, user_id, &request)
        .await
        .map_err(|e| map_scheduler_error(req_id.0.clone(), &e))?;

    let status = if created.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(ApiResponse {
            data: ScheduledJobs {
                competitor_id,
                created,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(competitor_id): Path<Uuid>,
    Json(update): Json<MonitoringUpdate>,
) -> Result<Json<ApiResponse<UpdateSummary>>, ApiError> {
    let summary = state
        .scheduler
        .update_monitoring_config(competitor_id, user_id, &update)
        .await
        .map_err(|e| map_scheduler_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn pause(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(competitor_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobsChanged>>, ApiError> {
    let jobs = state
        .scheduler
        .pause_monitoring(competitor_id, user_id)
        .await
        .map_err(|e| map_scheduler_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: JobsChanged {
            competitor_id,
            jobs,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn resume(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(competitor_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobsChanged>>, ApiError> {
    let jobs = state
        .scheduler
        .resume_monitoring(competitor_id, user_id)
        .await
        .map_err(|e| map_scheduler_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: JobsChanged {
            competitor_id,
            jobs,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
