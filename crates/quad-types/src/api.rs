use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::NotificationKind;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub display_name: String,
}

/// Compact user shape embedded in conversation previews and follower lists.
/// `profile_picture` is plain base64 (empty when the user has no avatar).
#[derive(Debug, Clone, Serialize)]
pub struct UserBasic {
    pub username: String,
    pub display_name: String,
    pub profile_picture: String,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
    pub posts: Vec<PostItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub display_name: String,
    /// Base64 or `data:image/...` URL; empty leaves the stored avatar as is.
    #[serde(default)]
    pub profile_picture: String,
}

#[derive(Debug, Serialize)]
pub struct UserSearchResult {
    pub username: String,
    pub display_name: String,
    pub profile_picture: String,
    pub email: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub username: String,
    pub content: String,
}

/// The shape returned by post creation: the bare row, no author join.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A post with its author denormalized, as served by the feed, profile and
/// single-post views. `profile_picture` is a `data:image/png;base64,` URL.
#[derive(Debug, Serialize)]
pub struct PostItem {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_picture: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub comments_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentItem {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_picture: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ViewPostResponse {
    pub post: PostItem,
    pub comments: Vec<CommentItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub username: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleLikeRequest {
    pub post_id: i64,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LikeStatus {
    pub is_liked: bool,
    pub count: i64,
}

// -- Follows --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleFollowRequest {
    pub follower: String,
    pub following: String,
}

#[derive(Debug, Serialize)]
pub struct FollowStatus {
    #[serde(rename = "isFollowing")]
    pub is_following: bool,
}

// -- Messaging --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConversationRequest {
    pub creator: String,
    pub recipient: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub conversation_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub conversation_id: i64,
    pub sender: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub id: i64,
    /// Every participant except the requesting user.
    pub participants: Vec<UserBasic>,
    pub last_message: MessageResponse,
    pub unread_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub conversation_id: i64,
    pub sender: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationItem {
    pub id: i64,
    /// Who receives the notification.
    pub username: String,
    /// Who triggered it.
    pub sender_name: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub sender_display_name: String,
    pub sender_profile_picture: String,
}
