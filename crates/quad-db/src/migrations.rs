use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- password belongs to the auth layer; nothing here reads or
        -- writes it.
        CREATE TABLE IF NOT EXISTS users (
            username        TEXT PRIMARY KEY,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL DEFAULT '',
            display_name    TEXT NOT NULL,
            profile_picture BLOB NOT NULL DEFAULT x'',
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_author
            ON posts(username, created_at);

        CREATE TABLE IF NOT EXISTS likes (
            post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (post_id, username)
        );

        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at);

        CREATE TABLE IF NOT EXISTS follows (
            follower    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            following   TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (follower, following)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_following
            ON follows(following);

        CREATE TABLE IF NOT EXISTS notifications (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            sender_name TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            kind        TEXT NOT NULL,
            post_id     INTEGER REFERENCES posts(id) ON DELETE CASCADE,
            comment_id  INTEGER REFERENCES comments(id) ON DELETE CASCADE,
            message     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(username, created_at);

        -- One conversation per unordered pair of users: pair_key is the two
        -- handles sorted and joined, enforced UNIQUE.
        CREATE TABLE IF NOT EXISTS conversations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            pair_key    TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversation_participants (
            conversation_id INTEGER NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            username        TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            last_read_at    TEXT NOT NULL,
            PRIMARY KEY (conversation_id, username)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_user
            ON conversation_participants(username);

        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
            sender          TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
            content         TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            read            INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages(conversation_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
