use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    api::events::DeliveryReport,
    api::middleware::{ApiError, ApiResult, AppState},
    models::{DeviceEvent, Notification, NotificationStats},
};

// Request DTOs
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

// Response DTOs
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub priority: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ekey_id: Option<String>,
    pub status: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        let is_read = notification.is_read();
        Self {
            id: notification.id,
            type_: notification.notification_type.as_str().to_string(),
            priority: notification.priority.as_str().to_string(),
            title: notification.title,
            body: notification.body,
            data: notification.data,
            device_id: notification.device_id,
            gateway_id: notification.gateway_id,
            ekey_id: notification.ekey_id,
            status: notification.status.as_str().to_string(),
            is_read,
            sent_at: notification.sent_at,
            read_at: notification.read_at,
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TestNotificationResponse {
    pub message: String,
    pub notification_id: String,
    pub status: String,
    pub delivery: DeliveryReport,
}

// API Handlers

/// List a user's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<impl IntoResponse> {
    // Validate pagination parameters
    if query.limit < 1 || query.limit > 100 {
        return Err(ApiError::BadRequest(
            "Limit must be between 1 and 100".to_string(),
        ));
    }

    if query.offset < 0 {
        return Err(ApiError::BadRequest(
            "Offset must be non-negative".to_string(),
        ));
    }

    let notifications = state
        .db
        .list_notifications(&user_id, query.unread_only, query.limit, query.offset)
        .await?;

    let total = notifications.len() as i64;

    let notification_responses: Vec<NotificationResponse> = notifications
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    Ok(Json(NotificationListResponse {
        notifications: notification_responses,
        total,
    }))
}

/// Get unread notification count for a user
pub async fn get_unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = state.db.get_unread_count(&user_id).await?;

    Ok(Json(UnreadCountResponse { count }))
}

/// Get notification statistics for a user
pub async fn get_notification_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<NotificationStats>> {
    let stats = state.db.get_notification_stats(&user_id).await?;

    Ok(Json(stats))
}

/// Mark a notification as read
pub async fn mark_notification_as_read(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    // Get the notification to verify ownership
    let notification = state
        .db
        .get_notification_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

    // Users can only mark their own notifications as read
    if notification.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Cannot mark another user's notification as read".to_string(),
        ));
    }

    state.db.mark_notification_as_read(&id).await?;

    Ok(Json(SuccessResponse {
        message: "Notification marked as read".to_string(),
    }))
}

/// Mark all of a user's notifications as read
pub async fn mark_all_notifications_as_read(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let count = state.db.mark_all_notifications_as_read(&user_id).await?;

    Ok(Json(MarkAllReadResponse {
        message: "All notifications marked as read".to_string(),
        count,
    }))
}

/// Send a test notification through the full dispatch path.
///
/// Only available in debug mode; bypasses the battery gate on purpose.
pub async fn send_test_notification(
    State(state): State<AppState>,
    Json(event): Json<DeviceEvent>,
) -> ApiResult<impl IntoResponse> {
    if !state.debug {
        return Err(ApiError::Forbidden(
            "Test notifications are only available in debug mode".to_string(),
        ));
    }

    let (notification, delivery) = state.notifications.dispatch(&event).await?;

    Ok(Json(TestNotificationResponse {
        message: "Test notification sent".to_string(),
        notification_id: notification.id,
        status: notification.status.as_str().to_string(),
        delivery: DeliveryReport::from(&delivery),
    }))
}
