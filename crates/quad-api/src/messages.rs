use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use quad_db::clock::parse_ts;
use quad_db::models::MessageRow;
use quad_types::api::{MessageResponse, SendMessageRequest, UnreadCountResponse};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub conversation_id: i64,
    pub username: String,
}

/// Returns the conversation's full message log and, as a side effect,
/// advances the requester's read state past everything returned.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let rows =
        run_blocking(move || db.db.list_messages(query.conversation_id, &query.username)).await?;

    let messages: Vec<MessageResponse> = rows.into_iter().map(message_response).collect();
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let message = run_blocking(move || {
        db.db.append_message(req.conversation_id, &req.sender, &req.content)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message_response(message))))
}

#[derive(Debug, Deserialize)]
pub struct UnreadQuery {
    pub username: String,
}

pub async fn unread_count(
    State(state): State<AppState>,
    Query(query): Query<UnreadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let count = run_blocking(move || db.db.unread_count_global(&query.username)).await?;

    Ok(Json(UnreadCountResponse { count }))
}

pub(crate) fn message_response(row: MessageRow) -> MessageResponse {
    MessageResponse {
        id: row.id,
        conversation_id: row.conversation_id,
        sender: row.sender,
        content: row.content,
        created_at: parse_ts(&row.created_at),
        read: row.read,
    }
}
