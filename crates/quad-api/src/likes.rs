use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::error;

use quad_types::api::{LikeStatus, ToggleLikeRequest};

use crate::error::ApiError;
use crate::{AppState, run_blocking};

pub async fn toggle_like(
    State(state): State<AppState>,
    Json(req): Json<ToggleLikeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let actor = req.username.clone();
    let (is_liked, count) = run_blocking(move || db.db.toggle_like(req.post_id, &actor)).await?;

    // Fan-out after the like has committed; only a transition into "liked"
    // notifies the post owner.
    if is_liked {
        let db = state.clone();
        let actor = req.username.clone();
        if let Err(e) =
            tokio::task::spawn_blocking(move || db.db.notify_like(req.post_id, &actor)).await
        {
            error!("spawn_blocking join error: {e}");
        }
    }

    Ok(Json(LikeStatus { is_liked, count }))
}

#[derive(Debug, Deserialize)]
pub struct LikeStatusQuery {
    pub post_id: i64,
    pub username: String,
}

pub async fn like_status(
    State(state): State<AppState>,
    Query(query): Query<LikeStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (is_liked, count) =
        run_blocking(move || db.db.like_status(query.post_id, &query.username)).await?;

    Ok(Json(LikeStatus { is_liked, count }))
}
