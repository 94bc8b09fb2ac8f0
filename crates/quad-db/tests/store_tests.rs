//! Store-level tests for users, posts, likes, comments and follows,
//! run against a private in-memory database.

use quad_db::Database;
use quad_db::error::StoreError;

fn store_with_users(names: &[&str]) -> Database {
    let db = Database::open_in_memory().unwrap();
    for name in names {
        let display = {
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        };
        db.create_user(name, &format!("{name}@campus.edu"), &display)
            .unwrap();
    }
    db
}

#[test]
fn create_and_fetch_user() {
    let db = store_with_users(&["alice"]);

    let user = db.get_user("alice").unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@campus.edu");
    assert_eq!(user.display_name, "Alice");
    assert!(user.profile_picture.is_empty());
    assert_eq!(user.created_at, user.updated_at);

    let err = db.get_user("nobody").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn duplicate_handle_or_email_conflicts() {
    let db = store_with_users(&["alice"]);

    let err = db
        .create_user("alice", "other@campus.edu", "Alice Again")
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    let err = db
        .create_user("alice2", "alice@campus.edu", "Alice Two")
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
}

#[test]
fn handles_with_bad_charset_are_rejected() {
    let db = Database::open_in_memory().unwrap();

    for bad in ["", "with space", "colon:name", "näme"] {
        let err = db.create_user(bad, "x@campus.edu", "X").unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)), "accepted {bad:?}");
    }
}

#[test]
fn search_matches_handle_and_display_name() {
    let db = store_with_users(&["alice", "bob"]);
    db.create_user("carol", "carol@campus.edu", "Alison Carter")
        .unwrap();

    let hits = db.search_users("ALI").unwrap();
    let names: Vec<_> = hits.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "carol"]);

    assert!(db.search_users("zzz").unwrap().is_empty());
}

#[test]
fn update_profile_changes_name_and_keeps_avatar_when_absent() {
    let db = store_with_users(&["alice"]);

    db.update_profile("alice", "Alice P.", Some(vec![1, 2, 3]))
        .unwrap();
    let user = db.get_user("alice").unwrap();
    assert_eq!(user.display_name, "Alice P.");
    assert_eq!(user.profile_picture, vec![1, 2, 3]);
    assert!(user.updated_at > user.created_at);

    // No picture supplied: the stored avatar stays.
    db.update_profile("alice", "Alice Q.", None).unwrap();
    let user = db.get_user("alice").unwrap();
    assert_eq!(user.display_name, "Alice Q.");
    assert_eq!(user.profile_picture, vec![1, 2, 3]);

    let err = db.update_profile("nobody", "X", None).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn posts_carry_denormalized_author_and_counts() {
    let db = store_with_users(&["alice", "bob"]);

    let post = db.create_post("alice", "hello campus").unwrap();
    let detail = db.get_post(post.id).unwrap();
    assert_eq!(detail.username, "alice");
    assert_eq!(detail.display_name, "Alice");
    assert_eq!(detail.content, "hello campus");
    assert_eq!(detail.likes_count, 0);
    assert_eq!(detail.comments_count, 0);

    db.toggle_like(post.id, "bob").unwrap();
    db.create_comment(post.id, "bob", "welcome!").unwrap();
    let detail = db.get_post(post.id).unwrap();
    assert_eq!(detail.likes_count, 1);
    assert_eq!(detail.comments_count, 1);

    let err = db.create_post("alice", "   ").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)), "got {err:?}");
    let err = db.create_post("nobody", "hi").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn feed_shows_followed_authors_newest_first() {
    let db = store_with_users(&["alice", "bob", "carol"]);

    db.create_post("bob", "first").unwrap();
    db.create_post("carol", "not followed").unwrap();
    db.create_post("bob", "second").unwrap();
    db.create_post("alice", "own post").unwrap();

    db.toggle_follow("alice", "bob").unwrap();

    let feed = db.feed_for("alice").unwrap();
    let contents: Vec<_> = feed.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);
}

#[test]
fn toggle_like_flips_and_counts() {
    let db = store_with_users(&["alice", "bob"]);
    let post = db.create_post("alice", "likeable").unwrap();

    assert_eq!(db.toggle_like(post.id, "bob").unwrap(), (true, 1));
    assert_eq!(db.like_status(post.id, "bob").unwrap(), (true, 1));
    assert_eq!(db.like_status(post.id, "alice").unwrap(), (false, 1));

    assert_eq!(db.toggle_like(post.id, "bob").unwrap(), (false, 0));
    assert_eq!(db.like_status(post.id, "bob").unwrap(), (false, 0));

    let err = db.toggle_like(9999, "bob").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn comments_list_oldest_first_with_author() {
    let db = store_with_users(&["alice", "bob"]);
    let post = db.create_post("alice", "discuss").unwrap();

    db.create_comment(post.id, "bob", "one").unwrap();
    db.create_comment(post.id, "alice", "two").unwrap();

    let comments = db.list_comments(post.id).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].content, "one");
    assert_eq!(comments[0].display_name, "Bob");
    assert_eq!(comments[1].content, "two");

    let err = db.create_comment(9999, "bob", "hi").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn follow_toggle_status_and_listings() {
    let db = store_with_users(&["alice", "bob", "carol"]);

    assert!(db.toggle_follow("alice", "bob").unwrap());
    assert!(db.toggle_follow("carol", "bob").unwrap());
    assert!(db.follow_status("alice", "bob").unwrap());
    assert!(!db.follow_status("bob", "alice").unwrap());

    let followers: Vec<_> = db
        .followers_of("bob")
        .unwrap()
        .into_iter()
        .map(|c| c.username)
        .collect();
    assert_eq!(followers, vec!["alice", "carol"]);

    let following: Vec<_> = db
        .following_of("alice")
        .unwrap()
        .into_iter()
        .map(|c| c.username)
        .collect();
    assert_eq!(following, vec!["bob"]);

    // Toggling again removes the edge.
    assert!(!db.toggle_follow("alice", "bob").unwrap());
    assert!(!db.follow_status("alice", "bob").unwrap());
    assert!(db.followers_of("bob").unwrap().len() == 1);

    let err = db.toggle_follow("alice", "nobody").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn deleting_a_user_cascades_everywhere() {
    let db = store_with_users(&["alice", "bob"]);

    let alice_post = db.create_post("alice", "mine").unwrap();
    let bob_post = db.create_post("bob", "theirs").unwrap();
    db.toggle_like(bob_post.id, "alice").unwrap();
    db.create_comment(bob_post.id, "alice", "nice").unwrap();
    db.toggle_follow("alice", "bob").unwrap();
    db.notify_like(bob_post.id, "alice");
    let (conversation, _) = db
        .create_conversation_with_message("alice", "bob", "hey")
        .unwrap();

    db.delete_user("alice").unwrap();

    let err = db.get_post(alice_post.id).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");

    let bobs = db.get_post(bob_post.id).unwrap();
    assert_eq!(bobs.likes_count, 0);
    assert_eq!(bobs.comments_count, 0);
    assert!(db.followers_of("bob").unwrap().is_empty());
    assert!(db.list_notifications("bob").unwrap().is_empty());

    // Bob's side of the conversation is still reachable but empty of
    // alice's membership; the messages she sent are gone.
    assert_eq!(db.unread_count_global("bob").unwrap(), 0);
    let err = db.unread_count_for_conversation(conversation, "alice").unwrap_err();
    assert!(matches!(err, StoreError::Forbidden(_)), "got {err:?}");
}
