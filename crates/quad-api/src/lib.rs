pub mod comments;
pub mod conversations;
pub mod error;
pub mod feed;
pub mod follows;
pub mod likes;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod profile;
pub mod users;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::error;

use quad_db::error::StoreError;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: quad_db::Database,
}

/// The full REST surface. The server binary mounts this as-is; the HTTP
/// tests drive it directly.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/create", post(users::create_user))
        .route("/profile", get(profile::get_profile))
        .route("/profile/update", put(profile::update_profile))
        .route("/search/users", get(users::search_users))
        .route("/feed", get(feed::get_feed))
        .route("/posts/create", post(posts::create_post))
        .route("/posts/view", get(posts::view_post))
        .route("/posts/like", post(likes::toggle_like))
        .route("/posts/like/status", get(likes::like_status))
        .route("/comments/create", post(comments::create_comment))
        .route("/follow/toggle", post(follows::toggle_follow))
        .route("/follow/status", get(follows::follow_status))
        .route("/followers", get(follows::get_followers))
        .route("/following", get(follows::get_following))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/create", post(conversations::create_conversation))
        .route("/messages", get(messages::get_messages))
        .route("/messages/send", post(messages::send_message))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read", put(notifications::mark_read))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .with_state(state)
}

/// Run a store closure off the async runtime and fold join errors into the
/// API error space.
pub(crate) async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!("spawn_blocking join error: {e}");
            Err(ApiError::Internal)
        }
    }
}

/// Plain base64 avatar, as embedded in participant and notification rows.
pub(crate) fn avatar_b64(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        String::new()
    } else {
        B64.encode(bytes)
    }
}

/// `data:` URL avatar, as served by the feed, profile, search and post views.
pub(crate) fn avatar_data_url(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        String::new()
    } else {
        format!("data:image/png;base64,{}", B64.encode(bytes))
    }
}

/// Decode an uploaded avatar, accepting either raw base64 or a `data:image`
/// URL. Empty input means "leave unchanged".
pub(crate) fn decode_avatar(input: &str) -> Result<Option<Vec<u8>>, ApiError> {
    if input.is_empty() {
        return Ok(None);
    }
    let data = if input.starts_with("data:image") {
        match input.split_once(',') {
            Some((_, rest)) => rest,
            None => input,
        }
    } else {
        input
    };
    B64.decode(data)
        .map(Some)
        .map_err(|_| ApiError::Validation("invalid base64 image data".into()))
}
