use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use quad_types::api::{ConversationPreview, CreateConversationRequest, CreateConversationResponse};

use crate::error::ApiError;
use crate::follows::contacts;
use crate::messages::message_response;
use crate::{AppState, run_blocking};

pub async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (creator, recipient, content) = (
        req.creator.clone(),
        req.recipient.clone(),
        req.message.clone(),
    );
    let first = run_blocking(move || {
        db.db.create_conversation_with_message(&creator, &recipient, &content)
    })
    .await;

    let (conversation_id, message) = match first {
        // Lost the directory race to a concurrent create: the conversation
        // exists now, so a retry resolves it as a lookup and appends there.
        Err(ApiError::Conflict(_)) => {
            let db = state.clone();
            run_blocking(move || {
                db.db
                    .create_conversation_with_message(&req.creator, &req.recipient, &req.message)
            })
            .await?
        }
        other => other?,
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateConversationResponse {
            conversation_id,
            message_id: message.id,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    pub username: String,
}

pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ConversationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let rows = run_blocking(move || db.db.list_conversations(&query.username)).await?;

    let previews: Vec<ConversationPreview> = rows
        .into_iter()
        .map(|row| ConversationPreview {
            id: row.id,
            participants: contacts(row.participants),
            last_message: message_response(row.last_message),
            unread_count: row.unread_count,
        })
        .collect();

    Ok(Json(previews))
}
