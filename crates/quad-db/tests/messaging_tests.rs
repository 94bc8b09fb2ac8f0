//! Conversation directory, message log and read-state tests, including the
//! concurrency guarantee that one pair of users never ends up with two
//! conversations.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};

use quad_db::Database;
use quad_db::error::StoreError;

fn store_with_users(names: &[&str]) -> Database {
    let db = Database::open_in_memory().unwrap();
    for name in names {
        db.create_user(name, &format!("{name}@campus.edu"), name)
            .unwrap();
    }
    db
}

#[test]
fn conversation_is_reused_in_either_order() {
    let db = store_with_users(&["alice", "bob"]);

    let first = db.get_or_create_conversation("alice", "bob").unwrap();
    let second = db.get_or_create_conversation("bob", "alice").unwrap();
    assert_eq!(first, second);

    assert_eq!(db.find_conversation("alice", "bob").unwrap(), Some(first));
    assert_eq!(db.find_conversation("bob", "alice").unwrap(), Some(first));

    let (reused, _) = db
        .create_conversation_with_message("bob", "alice", "hello again")
        .unwrap();
    assert_eq!(reused, first);
}

#[test]
fn racing_creates_converge_on_one_conversation() {
    let db = Arc::new(store_with_users(&["alice", "bob"]));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = db.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                let (a, b) = if i % 2 == 0 {
                    ("alice", "bob")
                } else {
                    ("bob", "alice")
                };
                db.get_or_create_conversation(a, b).unwrap()
            })
        })
        .collect();

    let ids: HashSet<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 1, "distinct conversations for one pair: {ids:?}");
}

#[test]
fn self_and_unknown_parties_are_rejected() {
    let db = store_with_users(&["alice"]);

    let err = db.get_or_create_conversation("alice", "alice").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");

    let err = db.get_or_create_conversation("alice", "ghost").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");

    let err = db
        .create_conversation_with_message("alice", "alice", "hi me")
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
}

#[test]
fn first_message_counts_unread_for_recipient_only() {
    let db = store_with_users(&["alice", "bob"]);

    let (conversation, message) = db
        .create_conversation_with_message("alice", "bob", "hello bob")
        .unwrap();
    assert!(!message.read);

    assert_eq!(db.unread_count_global("bob").unwrap(), 1);
    assert_eq!(db.unread_count_global("alice").unwrap(), 0);
    assert_eq!(
        db.unread_count_for_conversation(conversation, "bob").unwrap(),
        1
    );
    assert_eq!(
        db.unread_count_for_conversation(conversation, "alice").unwrap(),
        0
    );
}

#[test]
fn listing_resets_unread_and_flips_read_flags() {
    let db = store_with_users(&["alice", "bob"]);
    let (conversation, _) = db
        .create_conversation_with_message("alice", "bob", "one")
        .unwrap();
    db.append_message(conversation, "alice", "two").unwrap();
    db.append_message(conversation, "alice", "three").unwrap();

    assert_eq!(db.unread_count_global("bob").unwrap(), 3);

    let messages = db.list_messages(conversation, "bob").unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);

    // The listing itself advanced bob's read state.
    assert_eq!(db.unread_count_global("bob").unwrap(), 0);
    assert_eq!(
        db.unread_count_for_conversation(conversation, "bob").unwrap(),
        0
    );

    // Alice now sees her messages flagged as read.
    let messages = db.list_messages(conversation, "alice").unwrap();
    assert!(messages.iter().all(|m| m.read));
}

#[test]
fn reading_does_not_touch_the_other_participants_state() {
    let db = store_with_users(&["alice", "bob"]);
    let (conversation, _) = db
        .create_conversation_with_message("alice", "bob", "one")
        .unwrap();

    db.list_messages(conversation, "bob").unwrap();
    db.append_message(conversation, "bob", "two").unwrap();

    assert_eq!(db.unread_count_global("alice").unwrap(), 1);

    // Bob re-listing (his own message is the only new one) changes nothing
    // for alice, and bob stays at zero.
    db.list_messages(conversation, "bob").unwrap();
    assert_eq!(db.unread_count_global("alice").unwrap(), 1);
    assert_eq!(db.unread_count_global("bob").unwrap(), 0);

    db.list_messages(conversation, "alice").unwrap();
    assert_eq!(db.unread_count_global("alice").unwrap(), 0);
}

#[test]
fn messages_after_a_read_count_again() {
    let db = store_with_users(&["alice", "bob"]);
    let (conversation, _) = db
        .create_conversation_with_message("alice", "bob", "one")
        .unwrap();

    db.list_messages(conversation, "bob").unwrap();
    assert_eq!(db.unread_count_global("bob").unwrap(), 0);

    db.append_message(conversation, "alice", "two").unwrap();
    assert_eq!(db.unread_count_global("bob").unwrap(), 1);
}

#[test]
fn empty_message_rejected_and_failed_create_leaves_no_conversation() {
    let db = store_with_users(&["alice", "bob"]);

    let err = db
        .create_conversation_with_message("alice", "bob", "   ")
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");

    // The whole transaction rolled back: no half-created conversation.
    assert_eq!(db.find_conversation("alice", "bob").unwrap(), None);
    assert!(db.list_conversations("alice").unwrap().is_empty());

    let (conversation, _) = db
        .create_conversation_with_message("alice", "bob", "real one")
        .unwrap();
    let err = db.append_message(conversation, "alice", "").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
    assert_eq!(db.unread_count_global("bob").unwrap(), 1);
}

#[test]
fn non_participants_cannot_read_or_send() {
    let db = store_with_users(&["alice", "bob", "charlie"]);
    let (conversation, _) = db
        .create_conversation_with_message("alice", "bob", "private")
        .unwrap();

    let err = db.list_messages(conversation, "charlie").unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)), "got {err:?}");

    let err = db.append_message(conversation, "charlie", "hi").unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)), "got {err:?}");

    let err = db.list_messages(9999, "alice").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");

    // Charlie's snooping left bob's unread count alone.
    assert_eq!(db.unread_count_global("bob").unwrap(), 1);
}

#[test]
fn previews_show_partner_last_message_and_unread() {
    let db = store_with_users(&["alice", "bob", "carol"]);

    let (with_bob, _) = db
        .create_conversation_with_message("alice", "bob", "hi bob")
        .unwrap();
    let (with_carol, _) = db
        .create_conversation_with_message("alice", "carol", "hi carol")
        .unwrap();
    db.append_message(with_carol, "carol", "hi back").unwrap();

    let previews = db.list_conversations("alice").unwrap();
    assert_eq!(previews.len(), 2);

    // Most recently active first.
    assert_eq!(previews[0].id, with_carol);
    assert_eq!(previews[0].last_message.content, "hi back");
    assert_eq!(previews[0].unread_count, 1);
    let partners: Vec<_> = previews[0]
        .participants
        .iter()
        .map(|p| p.username.as_str())
        .collect();
    assert_eq!(partners, vec!["carol"]);

    assert_eq!(previews[1].id, with_bob);
    assert_eq!(previews[1].last_message.content, "hi bob");
    assert_eq!(previews[1].unread_count, 0);

    // New activity bumps a conversation back to the top.
    db.append_message(with_bob, "bob", "pong").unwrap();
    let previews = db.list_conversations("alice").unwrap();
    assert_eq!(previews[0].id, with_bob);

    // A conversation without messages never shows up.
    db.create_user("dave", "dave@campus.edu", "dave").unwrap();
    db.get_or_create_conversation("alice", "dave").unwrap();
    let previews = db.list_conversations("alice").unwrap();
    assert_eq!(previews.len(), 2);
}

#[test]
fn unread_total_sums_across_conversations() {
    let db = store_with_users(&["alice", "bob", "carol"]);

    let (with_bob, _) = db
        .create_conversation_with_message("bob", "alice", "b1")
        .unwrap();
    db.append_message(with_bob, "bob", "b2").unwrap();
    db.create_conversation_with_message("carol", "alice", "c1")
        .unwrap();

    assert_eq!(db.unread_count_global("alice").unwrap(), 3);
    assert_eq!(db.unread_count_for_conversation(with_bob, "alice").unwrap(), 2);

    db.list_messages(with_bob, "alice").unwrap();
    assert_eq!(db.unread_count_global("alice").unwrap(), 1);
}
