use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use quad_types::api::PostItem;

use crate::error::ApiError;
use crate::posts::post_item;
use crate::{AppState, run_blocking};

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub username: String,
}

pub async fn get_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let rows = run_blocking(move || db.db.feed_for(&query.username)).await?;

    let feed: Vec<PostItem> = rows.into_iter().map(post_item).collect();
    Ok(Json(feed))
}
