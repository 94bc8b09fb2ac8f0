use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::Database;
use crate::clock::format_ts;
use crate::directory::require_participant;
use crate::error::Result;
use crate::users::require_user;

impl Database {
    // -- Read state --

    /// Messages in one conversation the user has not read yet: sent by
    /// someone else, strictly after the user's `last_read_at`.
    pub fn unread_count_for_conversation(
        &self,
        conversation_id: i64,
        username: &str,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            require_participant(conn, conversation_id, username)?;
            unread_in_conversation(conn, conversation_id, username)
        })
    }

    /// Total unread messages for a user across all their conversations.
    pub fn unread_count_global(&self, username: &str) -> Result<i64> {
        self.with_conn(|conn| {
            require_user(conn, username)?;
            conn.query_row(
                "SELECT COUNT(*)
                 FROM messages m
                 JOIN conversation_participants cp ON m.conversation_id = cp.conversation_id
                 WHERE cp.username = ?1 AND m.sender != ?1 AND m.created_at > cp.last_read_at",
                [username],
                |row| row.get(0),
            )
            .map_err(Into::into)
        })
    }
}

pub(crate) fn unread_in_conversation(
    conn: &Connection,
    conversation_id: i64,
    username: &str,
) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*)
         FROM messages m
         JOIN conversation_participants cp ON m.conversation_id = cp.conversation_id
         WHERE m.conversation_id = ?1 AND cp.username = ?2
           AND m.sender != ?2 AND m.created_at > cp.last_read_at",
        params![conversation_id, username],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

/// Advance the reader's high-water mark and flip the sender-facing read
/// flags in one shot. `last_read_at` only moves forward; the flag update
/// covers exactly the messages at or before the new mark, so the two stay
/// consistent. Runs inside the caller's transaction, together with
/// whatever select produced the messages being read.
pub(crate) fn mark_read(
    conn: &Connection,
    conversation_id: i64,
    username: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let ts = format_ts(now);
    conn.execute(
        "UPDATE conversation_participants SET last_read_at = ?3
         WHERE conversation_id = ?1 AND username = ?2 AND last_read_at < ?3",
        params![conversation_id, username, ts],
    )?;
    conn.execute(
        "UPDATE messages SET read = 1
         WHERE conversation_id = ?1 AND sender != ?2 AND read = 0 AND created_at <= ?3",
        params![conversation_id, username, ts],
    )?;
    Ok(())
}
