//! Unit tests for the visitor queue manager: partition invariant, move
//! semantics, wholesale snapshot replacement, and selectors.

use chrono::{TimeZone, Utc};
use livedesk_core::models::visitor::{Bucket, QueueState, VisitorSession};
use livedesk_core::queue::QueueManager;
use livedesk_core::AppError;

fn visitor(id: &str) -> VisitorSession {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid ts");
    VisitorSession {
        id: id.to_owned(),
        assigned_agent_id: None,
        joined_at: now,
        last_activity_at: now,
    }
}

fn snapshot_with(incoming: &[&str], served: &[&str]) -> QueueState {
    QueueState {
        incoming: incoming.iter().map(|id| visitor(id)).collect(),
        currently_served: served.iter().map(|id| visitor(id)).collect(),
        loading: false,
        ..QueueState::default()
    }
}

#[test]
fn starts_loading_until_first_snapshot() {
    let mut manager = QueueManager::new();
    assert!(manager.loading());

    manager.replace_queue(snapshot_with(&["v1"], &[]));
    assert!(!manager.loading());
}

#[test]
fn move_visitor_transfers_between_buckets() {
    let mut manager = QueueManager::new();
    manager.replace_queue(snapshot_with(&["v1", "v2"], &[]));

    manager
        .move_visitor("v1", Bucket::Incoming, Bucket::CurrentlyServed)
        .expect("move must succeed");

    assert_eq!(manager.state().incoming.len(), 1);
    assert_eq!(manager.state().currently_served.len(), 1);
    assert_eq!(manager.state().currently_served[0].id, "v1");
}

#[test]
fn move_appends_to_destination_order() {
    let mut manager = QueueManager::new();
    manager.replace_queue(snapshot_with(&["v1"], &["v0"]));

    manager
        .move_visitor("v1", Bucket::Incoming, Bucket::CurrentlyServed)
        .expect("move must succeed");

    let served: Vec<&str> = manager
        .state()
        .currently_served
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(served, vec!["v0", "v1"]);
}

#[test]
fn move_from_wrong_bucket_reports_invalid_transition() {
    let mut manager = QueueManager::new();
    manager.replace_queue(snapshot_with(&["v1"], &[]));

    let err = manager
        .move_visitor("v1", Bucket::Idle, Bucket::Active)
        .expect_err("desync must surface");
    assert!(matches!(err, AppError::InvalidTransition(_)), "got {err:?}");

    // The failed move must not mutate anything.
    assert_eq!(manager.state().incoming.len(), 1);
    assert!(manager.state().active.is_empty());
}

#[test]
fn unknown_visitor_reports_invalid_transition() {
    let mut manager = QueueManager::new();
    manager.replace_queue(snapshot_with(&[], &[]));

    let err = manager
        .move_visitor("ghost", Bucket::Incoming, Bucket::CurrentlyServed)
        .expect_err("unknown id must surface");
    assert!(matches!(err, AppError::InvalidTransition(_)), "got {err:?}");
}

#[test]
fn partition_invariant_holds_across_move_sequences() {
    let mut manager = QueueManager::new();
    manager.replace_queue(snapshot_with(&["v1", "v2", "v3"], &["v4"]));

    let moves = [
        ("v1", Bucket::Incoming, Bucket::CurrentlyServed),
        ("v2", Bucket::Incoming, Bucket::PendingInvite),
        ("v1", Bucket::CurrentlyServed, Bucket::PendingTransfer),
        ("v4", Bucket::CurrentlyServed, Bucket::Idle),
        ("v2", Bucket::PendingInvite, Bucket::Active),
        ("v3", Bucket::Incoming, Bucket::CurrentlyServed),
    ];

    for (id, from, to) in moves {
        manager.move_visitor(id, from, to).expect("scripted move must succeed");
        assert!(
            manager.state().is_partition(),
            "visitor {id} appears in two buckets after {from:?} -> {to:?}"
        );
    }
}

#[test]
fn snapshot_fully_wins_over_inflight_transitions() {
    let mut manager = QueueManager::new();
    manager.replace_queue(snapshot_with(&["v1", "v2"], &[]));

    // In-flight local transition...
    manager
        .move_visitor("v1", Bucket::Incoming, Bucket::CurrentlyServed)
        .expect("move must succeed");

    // ...then a full snapshot arrives (e.g. reconnect resync). Post-state
    // must equal the snapshot exactly, independent of the pre-state.
    let snapshot = snapshot_with(&["v2", "v3"], &["v5"]);
    manager.replace_queue(snapshot.clone());
    assert_eq!(manager.state(), &snapshot);
}

#[test]
fn open_chat_sets_active_and_clears_unread() {
    let mut manager = QueueManager::new();
    manager.record_unread("room-1");
    manager.record_unread("room-1");
    assert_eq!(manager.unread_count("room-1"), 2);

    manager.open_chat("room-1");
    assert_eq!(manager.active_chat_id(), Some("room-1"));
    assert_eq!(manager.unread_count("room-1"), 0);

    manager.close_chat();
    assert_eq!(manager.active_chat_id(), None);
}

#[test]
fn unread_is_not_counted_for_the_active_chat() {
    let mut manager = QueueManager::new();
    manager.open_chat("room-1");
    manager.record_unread("room-1");
    manager.record_unread("room-2");

    assert_eq!(manager.unread_count("room-1"), 0);
    assert_eq!(manager.unread_count("room-2"), 1);
}

#[test]
fn typing_state_is_per_room() {
    let mut manager = QueueManager::new();
    manager.set_typing("room-1", true);

    assert!(manager.is_typing("room-1"));
    assert!(!manager.is_typing("room-2"));

    manager.set_typing("room-1", false);
    assert!(!manager.is_typing("room-1"));
}

#[test]
fn unread_and_typing_survive_snapshot_replacement() {
    let mut manager = QueueManager::new();
    manager.record_unread("room-1");
    manager.set_typing("room-2", true);

    manager.replace_queue(snapshot_with(&["v1"], &[]));

    assert_eq!(manager.unread_count("room-1"), 1);
    assert!(manager.is_typing("room-2"));
}

#[test]
fn visitor_lookup_spans_all_buckets() {
    let mut manager = QueueManager::new();
    let mut snapshot = snapshot_with(&["v1"], &[]);
    snapshot.pending_invite.push(visitor("v7"));
    manager.replace_queue(snapshot);

    assert!(manager.visitor("v7").is_some());
    assert!(manager.visitor("missing").is_none());
}
