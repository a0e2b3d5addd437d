//! Unit tests for the assembled agent session: reconnect-triggered queue
//! resync, active-chat-aware notification dispatch, and teardown.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use livedesk_core::connection::{NetworkSignal, Reachability};
use livedesk_core::models::message::{Message, SenderKind};
use livedesk_core::models::visitor::{QueueState, VisitorSession};
use livedesk_core::notify::{DesktopNotifier, Dispatch, Sound, SoundPlayer};
use livedesk_core::session::{AgentSession, SnapshotSource};
use livedesk_core::{Result, SessionConfig};

struct AlwaysReachable;

impl Reachability for AlwaysReachable {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async { true })
    }
}

struct FixedSnapshots {
    snapshot: QueueState,
    fetches: AtomicUsize,
}

impl SnapshotSource for FixedSnapshots {
    fn fetch(&self) -> Pin<Box<dyn Future<Output = Result<QueueState>> + Send + '_>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.snapshot.clone())
        })
    }
}

#[derive(Default)]
struct RecordingSounds {
    played: Mutex<Vec<Sound>>,
}

impl SoundPlayer for RecordingSounds {
    fn play(&self, sound: Sound) {
        self.played.lock().expect("sound lock").push(sound);
    }
}

#[derive(Default)]
struct SilentDesktop;

impl DesktopNotifier for SilentDesktop {
    fn show_once(&self, _id: &str, _title: &str, _body: &str) {}
}

fn config() -> SessionConfig {
    SessionConfig {
        upload_base_url: "http://127.0.0.1:9".into(),
        probe_url: "http://127.0.0.1:9".into(),
        debounce_ms: 500,
        probe_retry_ms: 25,
        duration_tick_ms: 50,
        fingerprint_capacity: 64,
    }
}

fn visitor(id: &str) -> VisitorSession {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid ts");
    VisitorSession {
        id: id.to_owned(),
        assigned_agent_id: None,
        joined_at: now,
        last_activity_at: now,
    }
}

fn session_with(
    snapshot: QueueState,
) -> (AgentSession, Arc<FixedSnapshots>, Arc<RecordingSounds>) {
    let snapshots = Arc::new(FixedSnapshots {
        snapshot,
        fetches: AtomicUsize::new(0),
    });
    let sounds = Arc::new(RecordingSounds::default());
    let snapshot_source: Arc<dyn SnapshotSource> = snapshots.clone();
    let sound_player: Arc<dyn SoundPlayer> = sounds.clone();
    let session = AgentSession::start_with_probe(
        config(),
        snapshot_source,
        sound_player,
        Arc::new(SilentDesktop),
        Arc::new(AlwaysReachable),
    );
    (session, snapshots, sounds)
}

#[tokio::test]
async fn recovery_resyncs_the_queue_from_the_snapshot_source() {
    let fresh = QueueState {
        incoming: vec![visitor("v-new")],
        loading: false,
        ..QueueState::default()
    };
    let (session, snapshots, _sounds) = session_with(fresh.clone());

    // Stale pre-disconnect state.
    session
        .replace_queue(QueueState {
            incoming: vec![visitor("v-old")],
            loading: false,
            ..QueueState::default()
        })
        .await;

    session.network_signal(NetworkSignal::Offline).await;
    session.network_signal(NetworkSignal::Online).await;

    // Wait for the resync wiring to apply the fetched snapshot.
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            if session.queue_state().await == fresh {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("queue must equal the fresh snapshot after recovery");

    assert_eq!(snapshots.fetches.load(Ordering::SeqCst), 1);
    session.shutdown().await;
}

#[tokio::test]
async fn notify_routes_sound_by_active_chat() {
    let (session, _snapshots, sounds) = session_with(QueueState::default());
    session.open_chat("c1").await;

    let in_active = Message {
        id: "m1".into(),
        chat_id: "c1".into(),
        sender_kind: SenderKind::Visitor,
        content: "hello".into(),
        timestamp: Utc::now(),
    };
    let in_background = Message {
        id: "m2".into(),
        chat_id: "c2".into(),
        sender_kind: SenderKind::Visitor,
        content: "anyone there?".into(),
        timestamp: Utc::now(),
    };

    assert!(matches!(
        session.notify(&in_active, false).await,
        Dispatch::Delivered { sound: Some(Sound::Message), .. }
    ));
    assert!(matches!(
        session.notify(&in_background, false).await,
        Dispatch::Delivered { sound: Some(Sound::Alert), .. }
    ));
    assert_eq!(
        *sounds.played.lock().expect("lock"),
        vec![Sound::Message, Sound::Alert]
    );

    session.shutdown().await;
}

#[tokio::test]
async fn widget_messages_flow_into_the_referrer_cell() {
    let (session, _snapshots, _sounds) = session_with(QueueState::default());

    let accepted = session
        .accept_widget_message(
            r#"{"type":"widget:referrer-update","payload":{"url":"https://example.com"}}"#,
        )
        .await;
    assert!(accepted);
    assert!(session.referrer().await.is_some());

    assert!(!session.accept_widget_message("junk").await);

    session.shutdown().await;
}

#[tokio::test]
async fn presence_clock_is_torn_down_with_the_session() {
    let (session, _snapshots, _sounds) = session_with(QueueState::default());
    let created = Utc::now() - chrono::Duration::seconds(90);
    let clock = session.presence_clock(created, chrono::Duration::zero());
    assert_eq!(clock.text(), "1m");

    session.shutdown().await;
    clock.await_completion().await;
}

#[tokio::test]
async fn move_visitor_surfaces_desync_through_the_session() {
    let (session, _snapshots, _sounds) = session_with(QueueState::default());
    session
        .replace_queue(QueueState {
            incoming: vec![visitor("v1")],
            loading: false,
            ..QueueState::default()
        })
        .await;

    use livedesk_core::models::visitor::Bucket;
    assert!(session
        .move_visitor("v1", Bucket::Incoming, Bucket::CurrentlyServed)
        .await
        .is_ok());
    assert!(session
        .move_visitor("v1", Bucket::Incoming, Bucket::CurrentlyServed)
        .await
        .is_err());

    session.shutdown().await;
}
