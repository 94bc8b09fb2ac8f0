use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use quad_types::api::{CreateUserRequest, UserBasic, UserSearchResult};

use crate::error::ApiError;
use crate::{AppState, avatar_b64, avatar_data_url, run_blocking};

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user = run_blocking(move || {
        db.db.create_user(&req.username, &req.email, &req.display_name)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserBasic {
            username: user.username,
            display_name: user.display_name,
            profile_picture: avatar_b64(&user.profile_picture),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // An empty query matches nobody rather than everybody.
    if query.q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let db = state.clone();
    let rows = run_blocking(move || db.db.search_users(&query.q)).await?;

    let results: Vec<UserSearchResult> = rows
        .into_iter()
        .map(|user| UserSearchResult {
            username: user.username,
            display_name: user.display_name,
            profile_picture: avatar_data_url(&user.profile_picture),
            email: user.email,
        })
        .collect();

    Ok(Json(results))
}
