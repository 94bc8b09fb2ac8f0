//! Database row types — these map directly to SQLite rows.
//! Distinct from the quad-types API models to keep the store layer
//! independent; timestamps stay as the stored RFC 3339 text here.

#[derive(Debug)]
pub struct UserRow {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub profile_picture: Vec<u8>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug)]
pub struct PostRow {
    pub id: i64,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

/// A post joined with its author row and aggregate counters, as read by the
/// feed, profile and single-post queries.
#[derive(Debug)]
pub struct PostDetailRow {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_picture: Vec<u8>,
    pub content: String,
    pub created_at: String,
    pub likes_count: i64,
    pub comments_count: i64,
}

#[derive(Debug)]
pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub username: String,
    pub display_name: String,
    pub profile_picture: Vec<u8>,
    pub content: String,
    pub created_at: String,
}

/// Compact user shape for participant and follower listings.
pub struct ContactRow {
    pub username: String,
    pub display_name: String,
    pub profile_picture: Vec<u8>,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: i64,
    pub conversation_id: i64,
    pub sender: String,
    pub content: String,
    pub created_at: String,
    pub read: bool,
}

/// One entry of a user's conversation list: everyone else in the
/// conversation, the latest message, and how many are unread.
pub struct ConversationPreviewRow {
    pub id: i64,
    pub participants: Vec<ContactRow>,
    pub last_message: MessageRow,
    pub unread_count: i64,
}

/// A notification joined with the sender's user row for display.
pub struct NotificationRow {
    pub id: i64,
    pub username: String,
    pub sender_name: String,
    pub kind: String,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub message: String,
    pub read: bool,
    pub created_at: String,
    pub sender_display_name: String,
    pub sender_profile_picture: Vec<u8>,
}
