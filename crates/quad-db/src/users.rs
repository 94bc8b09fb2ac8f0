use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::clock::format_ts;
use crate::error::{Result, StoreError, is_constraint_violation};
use crate::models::UserRow;

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, email: &str, display_name: &str) -> Result<UserRow> {
        validate_handle(username)?;
        if email.trim().is_empty() {
            return Err(StoreError::Validation("email is required".into()));
        }
        if display_name.trim().is_empty() {
            return Err(StoreError::Validation("display_name is required".into()));
        }

        let now = format_ts(self.now());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, display_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![username, email, display_name, now],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict(format!("username or email already taken: {username}"))
                } else {
                    e.into()
                }
            })?;

            Ok(UserRow {
                username: username.to_string(),
                email: email.to_string(),
                display_name: display_name.to_string(),
                profile_picture: Vec::new(),
                created_at: now.clone(),
                updated_at: now.clone(),
            })
        })
    }

    pub fn get_user(&self, username: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            query_user(conn, username)?
                .ok_or_else(|| StoreError::NotFound(format!("user not found: {username}")))
        })
    }

    /// Case-insensitive substring match on handle or display name.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserRow>> {
        let pattern = format!("%{}%", query.to_lowercase());
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, email, display_name, profile_picture, created_at, updated_at
                 FROM users
                 WHERE LOWER(username) LIKE ?1 OR LOWER(display_name) LIKE ?1
                 ORDER BY username",
            )?;

            let rows = stmt
                .query_map([pattern], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Update display name and (optionally) avatar. `picture: None` leaves
    /// the stored avatar untouched.
    pub fn update_profile(
        &self,
        username: &str,
        display_name: &str,
        picture: Option<Vec<u8>>,
    ) -> Result<()> {
        if display_name.trim().is_empty() {
            return Err(StoreError::Validation("display_name is required".into()));
        }

        let now = format_ts(self.now());
        self.with_conn(|conn| {
            let affected = match picture {
                Some(pic) => conn.execute(
                    "UPDATE users SET display_name = ?2, profile_picture = ?3, updated_at = ?4
                     WHERE username = ?1",
                    params![username, display_name, pic, now],
                )?,
                None => conn.execute(
                    "UPDATE users SET display_name = ?2, updated_at = ?3
                     WHERE username = ?1",
                    params![username, display_name, now],
                )?,
            };

            if affected == 0 {
                return Err(StoreError::NotFound(format!("user not found: {username}")));
            }
            Ok(())
        })
    }

    /// Remove a user; the schema cascades to their posts, likes, comments,
    /// follows, notifications, messages and conversation memberships.
    pub fn delete_user(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM users WHERE username = ?1", [username])?;
            if affected == 0 {
                return Err(StoreError::NotFound(format!("user not found: {username}")));
            }
            Ok(())
        })
    }
}

/// Handles end up embedded in conversation pair keys and referenced all over
/// the schema, so the charset is locked down at creation time.
pub(crate) fn validate_handle(username: &str) -> Result<()> {
    if username.is_empty() || username.len() > 50 {
        return Err(StoreError::Validation(
            "username must be 1-50 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(StoreError::Validation(
            "username may only contain letters, digits, '_', '-' and '.'".into(),
        ));
    }
    Ok(())
}

pub(crate) fn user_exists(conn: &Connection, username: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            [username],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn require_user(conn: &Connection, username: &str) -> Result<()> {
    if !user_exists(conn, username)? {
        return Err(StoreError::NotFound(format!("user not found: {username}")));
    }
    Ok(())
}

/// Display name for notification templates, falling back to the raw handle
/// when the user row cannot be read.
pub(crate) fn display_name_or_handle(conn: &Connection, username: &str) -> String {
    conn.query_row(
        "SELECT display_name FROM users WHERE username = ?1",
        [username],
        |row| row.get(0),
    )
    .unwrap_or_else(|_| username.to_string())
}

fn query_user(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, email, display_name, profile_picture, created_at, updated_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt.query_row([username], map_user_row).optional()?;
    Ok(row)
}

fn map_user_row(row: &rusqlite::Row) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        username: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        profile_picture: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_charset_is_enforced() {
        assert!(validate_handle("alice").is_ok());
        assert!(validate_handle("a.b-c_9").is_ok());
        assert!(validate_handle("").is_err());
        assert!(validate_handle("has space").is_err());
        assert!(validate_handle("colon:here").is_err());
        assert!(validate_handle(&"x".repeat(51)).is_err());
    }
}
