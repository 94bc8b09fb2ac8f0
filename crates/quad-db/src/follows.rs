use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::clock::format_ts;
use crate::error::Result;
use crate::models::ContactRow;
use crate::users::require_user;

impl Database {
    // -- Follows --

    /// Toggle the follow edge: removes if present, inserts if not.
    /// Returns whether `follower` now follows `following`.
    pub fn toggle_follow(&self, follower: &str, following: &str) -> Result<bool> {
        let now = format_ts(self.now());
        self.with_tx(|tx| {
            require_user(tx, follower)?;
            require_user(tx, following)?;

            if is_following(tx, follower, following)? {
                tx.execute(
                    "DELETE FROM follows WHERE follower = ?1 AND following = ?2",
                    params![follower, following],
                )?;
                Ok(false)
            } else {
                tx.execute(
                    "INSERT INTO follows (follower, following, created_at) VALUES (?1, ?2, ?3)",
                    params![follower, following, now],
                )?;
                Ok(true)
            }
        })
    }

    pub fn follow_status(&self, follower: &str, following: &str) -> Result<bool> {
        self.with_conn(|conn| is_following(conn, follower, following))
    }

    /// Users who follow `username`.
    pub fn followers_of(&self, username: &str) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            require_user(conn, username)?;
            query_contacts(
                conn,
                "SELECT u.username, u.display_name, u.profile_picture
                 FROM follows f
                 JOIN users u ON f.follower = u.username
                 WHERE f.following = ?1
                 ORDER BY u.username",
                username,
            )
        })
    }

    /// Users that `username` follows.
    pub fn following_of(&self, username: &str) -> Result<Vec<ContactRow>> {
        self.with_conn(|conn| {
            require_user(conn, username)?;
            query_contacts(
                conn,
                "SELECT u.username, u.display_name, u.profile_picture
                 FROM follows f
                 JOIN users u ON f.following = u.username
                 WHERE f.follower = ?1
                 ORDER BY u.username",
                username,
            )
        })
    }
}

pub(crate) fn is_following(conn: &Connection, follower: &str, following: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM follows WHERE follower = ?1 AND following = ?2",
            params![follower, following],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn query_contacts(conn: &Connection, sql: &str, username: &str) -> Result<Vec<ContactRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([username], |row| {
            Ok(ContactRow {
                username: row.get(0)?,
                display_name: row.get(1)?,
                profile_picture: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
