use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::clock::format_ts;
use crate::error::{Result, StoreError, is_constraint_violation};
use crate::users::require_user;

/// Canonical identity of a two-party conversation: both handles sorted and
/// joined. Handles cannot contain ':' (enforced at user creation), so the
/// key is unambiguous.
pub(crate) fn pair_key(a: &str, b: &str) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}

impl Database {
    // -- Conversation directory --

    /// Look up the conversation between two users, creating it (with both
    /// membership rows) if it does not exist yet. At most one conversation
    /// ever exists per unordered pair, in either argument order.
    pub fn get_or_create_conversation(&self, user_a: &str, user_b: &str) -> Result<i64> {
        if user_a == user_b {
            return Err(StoreError::Validation(
                "cannot start a conversation with yourself".into(),
            ));
        }

        let now = self.now();
        self.with_tx(|tx| {
            require_user(tx, user_a)?;
            require_user(tx, user_b)?;

            match find_conversation(tx, user_a, user_b)? {
                Some(id) => Ok(id),
                None => create_conversation(tx, user_a, user_b, now),
            }
        })
    }

    pub fn find_conversation(&self, user_a: &str, user_b: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| find_conversation(conn, user_a, user_b))
    }
}

pub(crate) fn find_conversation(conn: &Connection, a: &str, b: &str) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM conversations WHERE pair_key = ?1",
            [pair_key(a, b)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Insert the conversation row plus one membership row per participant,
/// with `last_read_at` initialized to `now`. A concurrent insert of the
/// same pair loses to the UNIQUE key and surfaces as `Conflict`; callers
/// retry as a lookup.
pub(crate) fn create_conversation(
    conn: &Connection,
    a: &str,
    b: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let ts = format_ts(now);
    conn.execute(
        "INSERT INTO conversations (pair_key, created_at, updated_at) VALUES (?1, ?2, ?2)",
        params![pair_key(a, b), ts],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            StoreError::Conflict(format!("conversation already exists between {a} and {b}"))
        } else {
            e.into()
        }
    })?;
    let id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO conversation_participants (conversation_id, username, last_read_at)
         VALUES (?1, ?2, ?4), (?1, ?3, ?4)",
        params![id, a, b, ts],
    )?;

    Ok(id)
}

pub(crate) fn conversation_exists(conn: &Connection, conversation_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM conversations WHERE id = ?1",
            [conversation_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn is_participant(
    conn: &Connection,
    conversation_id: i64,
    username: &str,
) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM conversation_participants
             WHERE conversation_id = ?1 AND username = ?2",
            params![conversation_id, username],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// NotFound for a missing conversation, Forbidden for a non-member.
pub(crate) fn require_participant(
    conn: &Connection,
    conversation_id: i64,
    username: &str,
) -> Result<()> {
    if !conversation_exists(conn, conversation_id)? {
        return Err(StoreError::NotFound(format!(
            "conversation not found: {conversation_id}"
        )));
    }
    if !is_participant(conn, conversation_id, username)? {
        return Err(StoreError::Forbidden(format!(
            "{username} is not a participant of conversation {conversation_id}"
        )));
    }
    Ok(())
}
