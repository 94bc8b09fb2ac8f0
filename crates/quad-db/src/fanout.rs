use tracing::warn;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::notifications::insert_notification;
use crate::posts::post_owner;
use crate::users::{display_name_or_handle, user_exists};
use quad_types::models::NotificationKind;

/// Notification fan-out. Each social action resolves to a single recipient
/// and produces at most one notification row; acting on your own content
/// produces none. Fan-out runs after the triggering write has committed,
/// so delivery is best-effort: failures are logged and never propagated
/// back to the caller.
impl Database {
    pub fn notify_like(&self, post_id: i64, actor: &str) {
        if let Err(e) = self.try_notify_like(post_id, actor) {
            warn!("like notification for post {post_id} not delivered: {e}");
        }
    }

    pub fn notify_comment(&self, post_id: i64, comment_id: i64, actor: &str) {
        if let Err(e) = self.try_notify_comment(post_id, comment_id, actor) {
            warn!("comment notification for post {post_id} not delivered: {e}");
        }
    }

    pub fn notify_follow(&self, followed: &str, actor: &str) {
        if let Err(e) = self.try_notify_follow(followed, actor) {
            warn!("follow notification for {followed} not delivered: {e}");
        }
    }

    fn try_notify_like(&self, post_id: i64, actor: &str) -> Result<()> {
        let now = self.now();
        self.with_conn(|conn| {
            let Some(owner) = post_owner(conn, post_id)? else {
                return Err(StoreError::NotFound(format!("post not found: {post_id}")));
            };
            if owner == actor {
                return Ok(());
            }

            let name = display_name_or_handle(conn, actor);
            insert_notification(
                conn,
                &owner,
                actor,
                NotificationKind::Like,
                Some(post_id),
                None,
                &format!("{name} liked your post"),
                now,
            )
        })
    }

    fn try_notify_comment(&self, post_id: i64, comment_id: i64, actor: &str) -> Result<()> {
        let now = self.now();
        self.with_conn(|conn| {
            let Some(owner) = post_owner(conn, post_id)? else {
                return Err(StoreError::NotFound(format!("post not found: {post_id}")));
            };
            if owner == actor {
                return Ok(());
            }

            let name = display_name_or_handle(conn, actor);
            insert_notification(
                conn,
                &owner,
                actor,
                NotificationKind::Comment,
                Some(post_id),
                Some(comment_id),
                &format!("{name} commented on your post"),
                now,
            )
        })
    }

    fn try_notify_follow(&self, followed: &str, actor: &str) -> Result<()> {
        if followed == actor {
            return Ok(());
        }

        let now = self.now();
        self.with_conn(|conn| {
            if !user_exists(conn, followed)? {
                return Err(StoreError::NotFound(format!("user not found: {followed}")));
            }

            let name = display_name_or_handle(conn, actor);
            insert_notification(
                conn,
                followed,
                actor,
                NotificationKind::Follow,
                None,
                None,
                &format!("{name} started following you"),
                now,
            )
        })
    }
}
