use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use quad_types::api::CreateCommentRequest;

use crate::error::ApiError;
use crate::posts::comment_item;
use crate::{AppState, run_blocking};

pub async fn create_comment(
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let author = req.username.clone();
    let content = req.content.clone();
    let comment =
        run_blocking(move || db.db.create_comment(req.post_id, &author, &content)).await?;

    // Fan-out after the comment has committed.
    let db = state.clone();
    let author = req.username.clone();
    let comment_id = comment.id;
    if let Err(e) =
        tokio::task::spawn_blocking(move || db.db.notify_comment(req.post_id, comment_id, &author))
            .await
    {
        error!("spawn_blocking join error: {e}");
    }

    Ok((StatusCode::CREATED, Json(comment_item(comment))))
}
