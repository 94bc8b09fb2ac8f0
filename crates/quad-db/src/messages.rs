use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::clock::format_ts;
use crate::directory::{create_conversation, find_conversation, require_participant};
use crate::error::{Result, StoreError};
use crate::models::{ContactRow, ConversationPreviewRow, MessageRow};
use crate::read_state;
use crate::users::require_user;

impl Database {
    // -- Messages --

    /// Append to an existing conversation. The message insert and the
    /// conversation's last-activity bump are one atomic unit.
    pub fn append_message(
        &self,
        conversation_id: i64,
        sender: &str,
        content: &str,
    ) -> Result<MessageRow> {
        let now = self.now();
        self.with_tx(|tx| append_message(tx, conversation_id, sender, content, now))
    }

    /// Start (or rejoin) the conversation between `creator` and `recipient`
    /// and append the opening message, all in one transaction. If the pair
    /// already has a conversation it is reused.
    pub fn create_conversation_with_message(
        &self,
        creator: &str,
        recipient: &str,
        content: &str,
    ) -> Result<(i64, MessageRow)> {
        if creator == recipient {
            return Err(StoreError::Validation(
                "cannot start a conversation with yourself".into(),
            ));
        }

        // Two clock reads: membership rows must sit strictly before the
        // first message so the recipient starts with one unread.
        let created = self.now();
        let sent = self.now();
        self.with_tx(|tx| {
            require_user(tx, creator)?;
            require_user(tx, recipient)?;

            let conversation_id = match find_conversation(tx, creator, recipient)? {
                Some(id) => id,
                None => create_conversation(tx, creator, recipient, created)?,
            };
            let message = append_message(tx, conversation_id, creator, content, sent)?;
            Ok((conversation_id, message))
        })
    }

    /// All messages of a conversation, oldest first. As a side effect the
    /// requester's read state advances past everything returned, in the
    /// same transaction as the read itself.
    pub fn list_messages(&self, conversation_id: i64, requester: &str) -> Result<Vec<MessageRow>> {
        let now = self.now();
        self.with_tx(|tx| {
            require_participant(tx, conversation_id, requester)?;
            let messages = select_messages(tx, conversation_id)?;
            read_state::mark_read(tx, conversation_id, requester, now)?;
            Ok(messages)
        })
    }

    /// Conversation previews for a user: most recently active first, only
    /// conversations that have at least one message. Participants exclude
    /// the requester.
    pub fn list_conversations(&self, username: &str) -> Result<Vec<ConversationPreviewRow>> {
        self.with_conn(|conn| {
            require_user(conn, username)?;

            let mut stmt = conn.prepare(
                "SELECT c.id
                 FROM conversations c
                 JOIN conversation_participants cp ON c.id = cp.conversation_id
                 WHERE cp.username = ?1
                   AND EXISTS (SELECT 1 FROM messages m WHERE m.conversation_id = c.id)
                 ORDER BY c.updated_at DESC, c.id DESC",
            )?;
            let ids = stmt
                .query_map([username], |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut previews = Vec::with_capacity(ids.len());
            for id in ids {
                let Some(last_message) = last_message(conn, id)? else {
                    continue;
                };
                previews.push(ConversationPreviewRow {
                    id,
                    participants: other_participants(conn, id, username)?,
                    last_message,
                    unread_count: read_state::unread_in_conversation(conn, id, username)?,
                });
            }
            Ok(previews)
        })
    }
}

pub(crate) fn append_message(
    conn: &Connection,
    conversation_id: i64,
    sender: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<MessageRow> {
    if content.trim().is_empty() {
        return Err(StoreError::Validation("content is required".into()));
    }
    require_participant(conn, conversation_id, sender)?;

    let ts = format_ts(now);
    conn.execute(
        "INSERT INTO messages (conversation_id, sender, content, created_at, read)
         VALUES (?1, ?2, ?3, ?4, 0)",
        params![conversation_id, sender, content, ts],
    )?;
    let id = conn.last_insert_rowid();

    conn.execute(
        "UPDATE conversations SET updated_at = ?2 WHERE id = ?1",
        params![conversation_id, ts],
    )?;

    Ok(MessageRow {
        id,
        conversation_id,
        sender: sender.to_string(),
        content: content.to_string(),
        created_at: ts,
        read: false,
    })
}

fn select_messages(conn: &Connection, conversation_id: i64) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender, content, created_at, read
         FROM messages
         WHERE conversation_id = ?1
         ORDER BY created_at ASC, id ASC",
    )?;
    let rows = stmt
        .query_map([conversation_id], map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn last_message(conn: &Connection, conversation_id: i64) -> Result<Option<MessageRow>> {
    let row = conn
        .query_row(
            "SELECT id, conversation_id, sender, content, created_at, read
             FROM messages
             WHERE conversation_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            [conversation_id],
            map_message,
        )
        .optional()?;
    Ok(row)
}

fn other_participants(
    conn: &Connection,
    conversation_id: i64,
    username: &str,
) -> Result<Vec<ContactRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.username, u.display_name, u.profile_picture
         FROM conversation_participants cp
         JOIN users u ON cp.username = u.username
         WHERE cp.conversation_id = ?1 AND cp.username != ?2
         ORDER BY u.username",
    )?;
    let rows = stmt
        .query_map(params![conversation_id, username], |row| {
            Ok(ContactRow {
                username: row.get(0)?,
                display_name: row.get(1)?,
                profile_picture: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_message(row: &rusqlite::Row) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        read: row.get(5)?,
    })
}
