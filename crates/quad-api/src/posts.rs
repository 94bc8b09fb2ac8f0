use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use quad_db::clock::parse_ts;
use quad_db::models::{CommentRow, PostDetailRow};
use quad_types::api::{CommentItem, CreatePostRequest, PostItem, PostResponse, ViewPostResponse};

use crate::error::ApiError;
use crate::{AppState, avatar_data_url, run_blocking};

pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let post = run_blocking(move || db.db.create_post(&req.username, &req.content)).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            id: post.id,
            username: post.username,
            content: post.content,
            created_at: parse_ts(&post.created_at),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ViewPostQuery {
    pub id: i64,
}

pub async fn view_post(
    State(state): State<AppState>,
    Query(query): Query<ViewPostQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let (post, comments) = run_blocking(move || {
        let post = db.db.get_post(query.id)?;
        let comments = db.db.list_comments(query.id)?;
        Ok((post, comments))
    })
    .await?;

    Ok(Json(ViewPostResponse {
        post: post_item(post),
        comments: comments.into_iter().map(comment_item).collect(),
    }))
}

pub(crate) fn post_item(row: PostDetailRow) -> PostItem {
    PostItem {
        id: row.id,
        username: row.username,
        display_name: row.display_name,
        profile_picture: avatar_data_url(&row.profile_picture),
        content: row.content,
        created_at: parse_ts(&row.created_at),
        likes_count: row.likes_count,
        comments_count: row.comments_count,
    }
}

pub(crate) fn comment_item(row: CommentRow) -> CommentItem {
    CommentItem {
        id: row.id,
        post_id: row.post_id,
        username: row.username,
        display_name: row.display_name,
        profile_picture: avatar_data_url(&row.profile_picture),
        content: row.content,
        created_at: parse_ts(&row.created_at),
    }
}
