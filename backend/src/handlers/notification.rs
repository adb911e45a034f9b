//! HTTP handlers for in-app notifications

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Notification;

use crate::error::AppResult;
use crate::services::notification::NotificationService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

/// Recent notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db);
    let notifications = service
        .list(query.unread_only, query.limit.unwrap_or(50).clamp(1, 200))
        .await?;
    Ok(Json(notifications))
}

/// Mark a notification read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let service = NotificationService::new(state.db);
    let notification = service.mark_read(id).await?;
    Ok(Json(notification))
}
