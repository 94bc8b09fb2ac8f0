use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use quad_db::clock::parse_ts;
use quad_types::api::{ProfileResponse, UpdateProfileRequest, UserProfile};

use crate::error::ApiError;
use crate::posts::post_item;
use crate::{AppState, avatar_data_url, decode_avatar, run_blocking};

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub username: String,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }

    let db = state.clone();
    let (user, posts) = run_blocking(move || {
        let user = db.db.get_user(&query.username)?;
        let posts = db.db.posts_by_author(&user.username)?;
        Ok((user, posts))
    })
    .await?;

    Ok(Json(ProfileResponse {
        user: UserProfile {
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            profile_picture: avatar_data_url(&user.profile_picture),
            created_at: parse_ts(&user.created_at),
            updated_at: parse_ts(&user.updated_at),
        },
        posts: posts.into_iter().map(post_item).collect(),
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let picture = decode_avatar(&req.profile_picture)?;

    let db = state.clone();
    run_blocking(move || db.db.update_profile(&req.username, &req.display_name, picture)).await?;

    Ok(Json(json!({ "message": "Profile updated successfully" })))
}
