use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use compintel_core::Severity;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ActingUser, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct AlertsQuery {
    pub competitor_id: Option<Uuid>,
    pub severity: Option<String>,
    pub unread: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct AlertItem {
    alert_id: Uuid,
    competitor_id: Uuid,
    alert_type: String,
    severity: String,
    title: String,
    description: String,
    source_data: serde_json::Value,
    action_items: serde_json::Value,
    recommended_actions: serde_json::Value,
    is_read: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReadOutcome {
    alert_id: Uuid,
    newly_read: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct ArchiveOutcome {
    alert_id: Uuid,
    archived: bool,
}

impl From<compintel_db::AlertRow> for AlertItem {
    fn from(row: compintel_db::AlertRow) -> Self {
        Self {
            alert_id: row.id,
            competitor_id: row.competitor_id,
            alert_type: row.alert_type,
            severity: row.severity,
            title: row.title,
            description: row.description,
            source_data: row.source_data,
            action_items: row.action_items,
            recommended_actions: row.recommended_actions,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Query(query): Query<AlertsQuery>,
) -> Result<Json<ApiResponse<Vec<AlertItem>>>, ApiError> {
    let severity = match query.severity.as_deref() {
        Some(raw) => Some(Severity::from_str(raw).map_err(|_| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown severity '{raw}'"),
            )
        })?),
        None => None,
    };

    let filter = compintel_db::AlertFilter {
        competitor_id: query.competitor_id,
        severity: severity.map(Severity::as_str),
        unread_only: query.unread.unwrap_or(false),
        limit: normalize_limit(query.limit),
    };
    let rows = compintel_db::list_alerts(&state.pool, user_id, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(AlertItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Marks the alert read. Only the first read counts as a processed alert.
pub(super) async fn mark_read(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReadOutcome>>, ApiError> {
    let newly_read = compintel_db::mark_alert_read(&state.pool, alert_id, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if newly_read {
        state.triggers.on_alert_processed(user_id, alert_id).await;
    }

    Ok(Json(ApiResponse {
        data: ReadOutcome {
            alert_id,
            newly_read,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn archive(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ActingUser(user_id): ActingUser,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ArchiveOutcome>>, ApiError> {
    compintel_db::archive_alert(&state.pool, alert_id, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ArchiveOutcome {
            alert_id,
            archived: true,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
