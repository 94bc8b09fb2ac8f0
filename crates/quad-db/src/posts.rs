use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::clock::format_ts;
use crate::error::{Result, StoreError};
use crate::models::{CommentRow, PostDetailRow, PostRow};
use crate::users::require_user;

const POST_DETAIL_SELECT: &str = "
    SELECT p.id, p.username, u.display_name, u.profile_picture, p.content, p.created_at,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count
    FROM posts p
    JOIN users u ON p.username = u.username";

impl Database {
    // -- Posts --

    pub fn create_post(&self, username: &str, content: &str) -> Result<PostRow> {
        if content.trim().is_empty() {
            return Err(StoreError::Validation("content is required".into()));
        }

        let now = format_ts(self.now());
        self.with_conn(|conn| {
            require_user(conn, username)?;
            conn.execute(
                "INSERT INTO posts (username, content, created_at) VALUES (?1, ?2, ?3)",
                params![username, content, now],
            )?;

            Ok(PostRow {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                content: content.to_string(),
                created_at: now.clone(),
            })
        })
    }

    pub fn get_post(&self, post_id: i64) -> Result<PostDetailRow> {
        self.with_conn(|conn| {
            let sql = format!("{POST_DETAIL_SELECT} WHERE p.id = ?1");
            conn.query_row(&sql, [post_id], map_post_detail)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("post not found: {post_id}")))
        })
    }

    /// Posts authored by users the given user follows, newest first.
    pub fn feed_for(&self, username: &str) -> Result<Vec<PostDetailRow>> {
        self.with_conn(|conn| {
            require_user(conn, username)?;
            let sql = format!(
                "{POST_DETAIL_SELECT}
                 WHERE p.username IN (SELECT following FROM follows WHERE follower = ?1)
                 ORDER BY p.created_at DESC, p.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([username], map_post_detail)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts authored by one user, newest first; drives the profile view.
    pub fn posts_by_author(&self, username: &str) -> Result<Vec<PostDetailRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{POST_DETAIL_SELECT}
                 WHERE p.username = ?1
                 ORDER BY p.created_at DESC, p.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([username], map_post_detail)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Comments --

    pub fn create_comment(&self, post_id: i64, username: &str, content: &str) -> Result<CommentRow> {
        if content.trim().is_empty() {
            return Err(StoreError::Validation("content is required".into()));
        }

        let now = format_ts(self.now());
        self.with_conn(|conn| {
            require_post(conn, post_id)?;
            require_user(conn, username)?;
            conn.execute(
                "INSERT INTO comments (post_id, username, content, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![post_id, username, content, now],
            )?;
            let id = conn.last_insert_rowid();

            let (display_name, profile_picture) = conn.query_row(
                "SELECT display_name, profile_picture FROM users WHERE username = ?1",
                [username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(CommentRow {
                id,
                post_id,
                username: username.to_string(),
                display_name,
                profile_picture,
                content: content.to_string(),
                created_at: now.clone(),
            })
        })
    }

    /// Comments on a post, oldest first, with each author denormalized.
    pub fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.username, u.display_name, u.profile_picture,
                        c.content, c.created_at
                 FROM comments c
                 JOIN users u ON c.username = u.username
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC",
            )?;
            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        username: row.get(2)?,
                        display_name: row.get(3)?,
                        profile_picture: row.get(4)?,
                        content: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Likes --

    /// Toggle a like: removes if present, inserts if not.
    /// Returns (is_liked, like count) after the toggle.
    pub fn toggle_like(&self, post_id: i64, username: &str) -> Result<(bool, i64)> {
        let now = format_ts(self.now());
        self.with_tx(|tx| {
            require_post(tx, post_id)?;
            require_user(tx, username)?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM likes WHERE post_id = ?1 AND username = ?2",
                    params![post_id, username],
                    |row| row.get(0),
                )
                .optional()?;

            let is_liked = if existing.is_some() {
                tx.execute(
                    "DELETE FROM likes WHERE post_id = ?1 AND username = ?2",
                    params![post_id, username],
                )?;
                false
            } else {
                tx.execute(
                    "INSERT INTO likes (post_id, username, created_at) VALUES (?1, ?2, ?3)",
                    params![post_id, username, now],
                )?;
                true
            };

            Ok((is_liked, count_likes(tx, post_id)?))
        })
    }

    pub fn like_status(&self, post_id: i64, username: &str) -> Result<(bool, i64)> {
        self.with_conn(|conn| {
            require_post(conn, post_id)?;
            let liked: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM likes WHERE post_id = ?1 AND username = ?2",
                    params![post_id, username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok((liked.is_some(), count_likes(conn, post_id)?))
        })
    }
}

pub(crate) fn post_owner(conn: &Connection, post_id: i64) -> Result<Option<String>> {
    let owner = conn
        .query_row("SELECT username FROM posts WHERE id = ?1", [post_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(owner)
}

pub(crate) fn require_post(conn: &Connection, post_id: i64) -> Result<()> {
    if post_owner(conn, post_id)?.is_none() {
        return Err(StoreError::NotFound(format!("post not found: {post_id}")));
    }
    Ok(())
}

fn count_likes(conn: &Connection, post_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        [post_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

fn map_post_detail(row: &rusqlite::Row) -> std::result::Result<PostDetailRow, rusqlite::Error> {
    Ok(PostDetailRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        profile_picture: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        likes_count: row.get(6)?,
        comments_count: row.get(7)?,
    })
}
