use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::error;

use quad_db::models::ContactRow;
use quad_types::api::{FollowStatus, ToggleFollowRequest, UserBasic};

use crate::error::ApiError;
use crate::{AppState, avatar_b64, run_blocking};

pub async fn toggle_follow(
    State(state): State<AppState>,
    Json(req): Json<ToggleFollowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let follower = req.follower.clone();
    let following = req.following.clone();
    let is_following = run_blocking(move || db.db.toggle_follow(&follower, &following)).await?;

    // Fan-out after the edge has committed; unfollowing stays silent.
    if is_following {
        let db = state.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || {
            db.db.notify_follow(&req.following, &req.follower)
        })
        .await
        {
            error!("spawn_blocking join error: {e}");
        }
    }

    Ok(Json(FollowStatus { is_following }))
}

#[derive(Debug, Deserialize)]
pub struct FollowStatusQuery {
    pub follower: String,
    pub following: String,
}

pub async fn follow_status(
    State(state): State<AppState>,
    Query(query): Query<FollowStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.follower.is_empty() || query.following.is_empty() {
        return Err(ApiError::Validation(
            "follower and following are required".into(),
        ));
    }

    let db = state.clone();
    let is_following =
        run_blocking(move || db.db.follow_status(&query.follower, &query.following)).await?;

    Ok(Json(FollowStatus { is_following }))
}

#[derive(Debug, Deserialize)]
pub struct FollowListQuery {
    pub username: String,
}

pub async fn get_followers(
    State(state): State<AppState>,
    Query(query): Query<FollowListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let rows = run_blocking(move || db.db.followers_of(&query.username)).await?;
    Ok(Json(contacts(rows)))
}

pub async fn get_following(
    State(state): State<AppState>,
    Query(query): Query<FollowListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let rows = run_blocking(move || db.db.following_of(&query.username)).await?;
    Ok(Json(contacts(rows)))
}

pub(crate) fn contacts(rows: Vec<ContactRow>) -> Vec<UserBasic> {
    rows.into_iter()
        .map(|contact| UserBasic {
            username: contact.username,
            display_name: contact.display_name,
            profile_picture: avatar_b64(&contact.profile_picture),
        })
        .collect()
}
