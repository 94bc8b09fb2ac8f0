use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use quad_db::clock::parse_ts;
use quad_types::api::{NotificationItem, UnreadCountResponse};
use quad_types::models::NotificationKind;

use crate::error::ApiError;
use crate::{AppState, avatar_b64, run_blocking};

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub username: String,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let rows = run_blocking(move || db.db.list_notifications(&query.username)).await?;

    let notifications: Vec<NotificationItem> = rows
        .into_iter()
        .filter_map(|row| {
            let Some(kind) = NotificationKind::parse(&row.kind) else {
                warn!("Corrupt notification kind {:?} on id {}", row.kind, row.id);
                return None;
            };
            Some(NotificationItem {
                id: row.id,
                username: row.username,
                sender_name: row.sender_name,
                kind,
                post_id: row.post_id,
                comment_id: row.comment_id,
                message: row.message,
                read: row.read,
                created_at: parse_ts(&row.created_at),
                sender_display_name: row.sender_display_name,
                sender_profile_picture: avatar_b64(&row.sender_profile_picture),
            })
        })
        .collect();

    Ok(Json(notifications))
}

#[derive(Debug, Deserialize)]
pub struct MarkReadQuery {
    pub id: i64,
}

pub async fn mark_read(
    State(state): State<AppState>,
    Query(query): Query<MarkReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    run_blocking(move || db.db.mark_notification_read(query.id)).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    run_blocking(move || db.db.mark_all_notifications_read(&query.username)).await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let count = run_blocking(move || db.db.unread_notification_count(&query.username)).await?;

    Ok(Json(UnreadCountResponse { count }))
}
