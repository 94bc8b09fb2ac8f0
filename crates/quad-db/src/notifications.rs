use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::Database;
use crate::clock::format_ts;
use crate::error::{Result, StoreError};
use crate::models::NotificationRow;
use crate::users::require_user;
use quad_types::models::NotificationKind;

impl Database {
    // -- Notifications --

    /// A user's notifications, newest first, each joined with the sender's
    /// display row.
    pub fn list_notifications(&self, username: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            require_user(conn, username)?;

            let mut stmt = conn.prepare(
                "SELECT n.id, n.username, n.sender_name, n.kind, n.post_id, n.comment_id,
                        n.message, n.read, n.created_at, u.display_name, u.profile_picture
                 FROM notifications n
                 JOIN users u ON n.sender_name = u.username
                 WHERE n.username = ?1
                 ORDER BY n.created_at DESC, n.id DESC",
            )?;
            let rows = stmt
                .query_map([username], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        sender_name: row.get(2)?,
                        kind: row.get(3)?,
                        post_id: row.get(4)?,
                        comment_id: row.get(5)?,
                        message: row.get(6)?,
                        read: row.get(7)?,
                        created_at: row.get(8)?,
                        sender_display_name: row.get(9)?,
                        sender_profile_picture: row.get(10)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn unread_notification_count(&self, username: &str) -> Result<i64> {
        self.with_conn(|conn| {
            require_user(conn, username)?;
            conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE username = ?1 AND read = 0",
                [username],
                |row| row.get(0),
            )
            .map_err(Into::into)
        })
    }

    pub fn mark_notification_read(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("UPDATE notifications SET read = 1 WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("notification not found: {id}")));
            }
            Ok(())
        })
    }

    pub fn mark_all_notifications_read(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            require_user(conn, username)?;
            conn.execute(
                "UPDATE notifications SET read = 1 WHERE username = ?1",
                [username],
            )?;
            Ok(())
        })
    }
}

pub(crate) fn insert_notification(
    conn: &Connection,
    recipient: &str,
    actor: &str,
    kind: NotificationKind,
    post_id: Option<i64>,
    comment_id: Option<i64>,
    message: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications
             (username, sender_name, kind, post_id, comment_id, message, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            recipient,
            actor,
            kind.as_str(),
            post_id,
            comment_id,
            message,
            format_ts(now)
        ],
    )?;
    Ok(())
}
