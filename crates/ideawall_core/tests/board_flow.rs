use ideawall_core::{
    Board, DocumentStore, InMemoryDocumentStore, ManualClock, Note, NoteClickIntent, NoteDefaults,
    NoteDocument, NoteDraft, NoteFactory, NotePatch, NotePersistence, Position, ShootingMode,
    SyncStatus, WallConfig,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct RecordingPersistence {
    initial: Vec<Note>,
    saves: Rc<RefCell<Vec<Vec<Note>>>>,
}

impl NotePersistence for RecordingPersistence {
    fn save(&self, notes: &[Note]) {
        self.saves.borrow_mut().push(notes.to_vec());
    }

    fn load(&self) -> Vec<Note> {
        self.initial.clone()
    }
}

fn factory(seed: u64) -> NoteFactory {
    NoteFactory::seeded(
        Arc::new(ManualClock::new(1_700_000_000_000 + seed as i64)),
        seed,
        NoteDefaults::default(),
    )
}

fn local_board(persistence: RecordingPersistence) -> Board {
    Board::new(factory(1), Box::new(persistence))
}

fn synced_board(documents: &InMemoryDocumentStore) -> (Board, RecordingPersistence) {
    let persistence = RecordingPersistence::default();
    let board = local_board(persistence.clone()).with_remote(Arc::new(documents.clone()));
    (board, persistence)
}

fn foreign_note(seed: u64, title: &str) -> Note {
    factory(seed).build(NoteDraft::new(title, "")).unwrap()
}

fn titles(board: &Board) -> Vec<String> {
    board.notes().map(|note| note.title.clone()).collect()
}

#[test]
fn board_hydrates_from_persistence() {
    let saved = vec![foreign_note(7, "saved")];
    let persistence = RecordingPersistence {
        initial: saved.clone(),
        ..RecordingPersistence::default()
    };

    let board = local_board(persistence.clone());

    assert_eq!(board.notes().cloned().collect::<Vec<_>>(), saved);
    assert!(persistence.saves.borrow().is_empty());
}

#[test]
fn every_local_mutation_persists_the_collection() {
    let persistence = RecordingPersistence::default();
    let mut board = local_board(persistence.clone());

    let first = board.add_note(NoteDraft::new("first", "")).unwrap();
    let second = board.add_note(NoteDraft::new("second", "")).unwrap();
    board.move_note(first.id, Position::new(10.0, 20.0)).unwrap();
    board
        .update_note(second.id, NotePatch::default().content("more"))
        .unwrap();
    board.delete_note(first.id).unwrap();

    assert!(board.add_note(NoteDraft::new("  ", "")).is_none());
    assert!(board.delete_note(first.id).is_none());

    let saves = persistence.saves.borrow();
    assert_eq!(saves.len(), 5);
    let last = saves.last().unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].id, second.id);
    assert_eq!(last[0].content, "more");
}

#[test]
fn click_deletes_only_in_targeting_mode() {
    let mut board = local_board(RecordingPersistence::default());
    let note = board.add_note(NoteDraft::new("target", "")).unwrap();

    assert_eq!(board.click_note(note.id), NoteClickIntent::BeginDrag);
    assert_eq!(board.len(), 1);

    assert_eq!(board.toggle_shooting_mode(), ShootingMode::Targeting);
    assert_eq!(board.click_note(note.id), NoteClickIntent::Delete);
    assert!(board.is_empty());

    board.set_shooting_mode(false);
    assert_eq!(board.shooting_mode(), ShootingMode::Normal);
}

#[test]
fn reset_leaves_targeting_mode() {
    let mut board = local_board(RecordingPersistence::default());
    board.add_note(NoteDraft::new("target", "")).unwrap();
    assert_eq!(board.toggle_shooting_mode(), ShootingMode::Targeting);

    board.reset();

    assert!(board.is_empty());
    assert_eq!(board.shooting_mode(), ShootingMode::Normal);
}

#[test]
fn board_without_remote_stays_offline() {
    let mut board = local_board(RecordingPersistence::default());
    assert!(!board.sign_in("alice"));
    assert_eq!(board.sync_status(), SyncStatus::Offline);
    assert_eq!(board.sync_all(), 0);
    assert!(!board.refresh());
}

#[test]
fn open_uses_configured_storage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = WallConfig::default();
    config.storage.db_path = Some(dir.path().join("wall.db"));

    {
        let mut board = Board::open(&config).unwrap();
        board.add_note(NoteDraft::new("kept", "across runs")).unwrap();
    }

    let board = Board::open(&config).unwrap();
    assert_eq!(titles(&board), vec!["kept".to_string()]);
}

#[tokio::test]
async fn remote_snapshot_replaces_local_collection() {
    let documents = InMemoryDocumentStore::new();
    let remote_note = foreign_note(9, "noteA");
    documents
        .create(NoteDocument::from_note("alice", &remote_note))
        .await
        .unwrap();

    let (mut board, persistence) = synced_board(&documents);
    board.add_note(NoteDraft::new("noteB", "")).unwrap();
    board.settle().await;
    assert_eq!(board.sync_status(), SyncStatus::Offline);

    assert!(board.sign_in("alice"));

    assert_eq!(board.notes().cloned().collect::<Vec<_>>(), vec![remote_note.clone()]);
    assert_eq!(board.sync_status(), SyncStatus::Synced);
    assert_eq!(board.identity(), Some("alice"));
    assert_eq!(persistence.saves.borrow().last().unwrap(), &vec![remote_note]);
}

#[tokio::test]
async fn local_writes_reach_remote_and_status_tracks_them() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    assert_eq!(board.sync_status(), SyncStatus::Synced);

    let note = board.add_note(NoteDraft::new("Idea", "Test")).unwrap();
    assert_eq!(board.sync_status(), SyncStatus::Syncing);
    board.settle().await;
    assert_eq!(board.sync_status(), SyncStatus::Synced);
    assert_eq!(documents.snapshot("alice").len(), 1);

    board.move_note(note.id, Position::new(10.0, 20.0)).unwrap();
    board.settle().await;
    let stored = documents.get(&note.id.to_string()).unwrap();
    assert_eq!(stored.fields.position, Position::new(10.0, 20.0));
    assert_eq!(stored.owner_id, "alice");

    board.delete_note(note.id).unwrap();
    board.settle().await;
    assert!(documents.is_empty());
    assert!(board.is_empty());
}

#[tokio::test]
async fn snapshot_does_not_resurrect_unacknowledged_delete() {
    let device = InMemoryDocumentStore::new();
    let slow = device.clone().with_latency(Duration::from_millis(50));
    let (mut board, _) = synced_board(&slow);
    board.sign_in("alice");

    let doomed = board.add_note(NoteDraft::new("doomed", "")).unwrap();
    board.settle().await;
    board.delete_note(doomed.id).unwrap();

    let other = foreign_note(21, "from another device");
    device
        .create(NoteDocument::from_note("alice", &other))
        .await
        .unwrap();
    assert!(device.get(&doomed.id.to_string()).is_some());
    board.pump();

    assert!(board.get(doomed.id).is_none());
    assert!(board.get(other.id).is_some());

    board.settle().await;
    assert_eq!(titles(&board), vec!["from another device".to_string()]);
    assert!(device.get(&doomed.id.to_string()).is_none());
}

#[tokio::test]
async fn snapshot_does_not_drop_unacknowledged_create() {
    let device = InMemoryDocumentStore::new();
    let slow = device.clone().with_latency(Duration::from_millis(50));
    let (mut board, _) = synced_board(&slow);
    board.sign_in("alice");

    let fresh = board.add_note(NoteDraft::new("fresh", "")).unwrap();
    let other = foreign_note(22, "remote");
    device
        .create(NoteDocument::from_note("alice", &other))
        .await
        .unwrap();
    board.pump();

    assert_eq!(board.notes().next().map(|note| note.id), Some(fresh.id));
    assert!(board.get(other.id).is_some());
    assert_eq!(board.sync_status(), SyncStatus::Syncing);

    board.settle().await;
    assert_eq!(board.len(), 2);
    assert_eq!(board.sync_status(), SyncStatus::Synced);
}

#[tokio::test]
async fn remote_failure_sets_error_and_keeps_local_notes() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, persistence) = synced_board(&documents);
    board.sign_in("alice");
    documents.set_offline(true);

    let note = board.add_note(NoteDraft::new("offline idea", "")).unwrap();
    board.settle().await;

    assert!(matches!(board.sync_status(), SyncStatus::Error(_)));
    assert!(board.sync_status().label().starts_with("Sync error:"));
    assert_eq!(board.get(note.id), Some(&note));
    assert_eq!(persistence.saves.borrow().last().unwrap(), &vec![note.clone()]);

    documents.set_offline(false);
    assert_eq!(board.sync_all(), 1);
    board.settle().await;

    assert_eq!(board.sync_status(), SyncStatus::Synced);
    assert!(documents.get(&note.id.to_string()).is_some());
}

#[tokio::test]
async fn failed_create_survives_later_snapshots_until_pushed() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    documents.set_offline(true);

    let note = board.add_note(NoteDraft::new("offline idea", "")).unwrap();
    board.settle().await;
    assert!(matches!(board.sync_status(), SyncStatus::Error(_)));

    documents.set_offline(false);
    let other = foreign_note(41, "from another device");
    documents
        .create(NoteDocument::from_note("alice", &other))
        .await
        .unwrap();
    board.pump();

    assert_eq!(board.get(note.id), Some(&note));
    assert!(board.get(other.id).is_some());
    assert!(documents.get(&note.id.to_string()).is_none());

    assert_eq!(board.sync_all(), 2);
    board.settle().await;
    assert_eq!(board.sync_status(), SyncStatus::Synced);
    assert!(documents.get(&note.id.to_string()).is_some());
    assert_eq!(board.len(), 2);
}

#[tokio::test]
async fn failed_delete_is_not_resurrected_and_is_retried() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    let doomed = board.add_note(NoteDraft::new("doomed", "")).unwrap();
    board.settle().await;

    documents.set_offline(true);
    board.delete_note(doomed.id).unwrap();
    board.settle().await;
    assert!(matches!(board.sync_status(), SyncStatus::Error(_)));

    documents.set_offline(false);
    let other = foreign_note(42, "from another device");
    documents
        .create(NoteDocument::from_note("alice", &other))
        .await
        .unwrap();
    board.pump();

    assert!(board.get(doomed.id).is_none());
    assert!(board.get(other.id).is_some());
    assert!(documents.get(&doomed.id.to_string()).is_some());

    assert_eq!(board.sync_all(), 2);
    board.settle().await;
    assert!(documents.get(&doomed.id.to_string()).is_none());
    assert_eq!(titles(&board), vec!["from another device".to_string()]);
    assert_eq!(board.sync_status(), SyncStatus::Synced);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rapid_moves_of_one_note_land_in_issue_order() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    let last = Position::new(20.0, 5.0);

    for round in 0..25 {
        let note = board.add_note(NoteDraft::new(format!("dragged {round}"), "")).unwrap();
        board.settle().await;

        for step in 1..=20 {
            board.move_note(note.id, Position::new(step as f64, 5.0)).unwrap();
        }
        board.settle().await;

        let stored = documents.get(&note.id.to_string()).unwrap();
        assert_eq!(stored.fields.position, last);
        assert_eq!(board.get(note.id).map(|note| note.position), Some(last));

        assert!(board.refresh());
        board.settle().await;
        assert_eq!(board.get(note.id).map(|note| note.position), Some(last));
        assert_eq!(board.sync_status(), SyncStatus::Synced);

        board.delete_note(note.id).unwrap();
        board.settle().await;
    }
    assert!(documents.is_empty());
}

#[tokio::test]
async fn identity_switch_follows_new_owner_only() {
    let documents = InMemoryDocumentStore::new();
    let alice_note = foreign_note(31, "alice's");
    let bob_note = foreign_note(32, "bob's");
    documents
        .create(NoteDocument::from_note("alice", &alice_note))
        .await
        .unwrap();
    documents
        .create(NoteDocument::from_note("bob", &bob_note))
        .await
        .unwrap();

    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    assert_eq!(titles(&board), vec!["alice's".to_string()]);
    assert!(!board.sign_in("alice"));

    board.sign_in("bob");
    assert_eq!(titles(&board), vec!["bob's".to_string()]);
    assert_eq!(documents.listener_count(), 1);

    let late = foreign_note(33, "late alice note");
    documents
        .create(NoteDocument::from_note("alice", &late))
        .await
        .unwrap();
    board.pump();
    assert_eq!(titles(&board), vec!["bob's".to_string()]);
}

#[tokio::test]
async fn sign_out_keeps_notes_and_goes_offline() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    board.add_note(NoteDraft::new("Idea", "")).unwrap();
    board.settle().await;

    board.sign_out();

    assert_eq!(board.sync_status(), SyncStatus::Offline);
    assert_eq!(board.identity(), None);
    assert_eq!(documents.listener_count(), 0);
    assert_eq!(board.len(), 1);

    board.add_note(NoteDraft::new("local only", "")).unwrap();
    board.settle().await;
    assert_eq!(documents.len(), 1);
}

#[tokio::test]
async fn reset_is_local_only_and_refresh_restores() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    board.add_note(NoteDraft::new("Idea", "")).unwrap();
    board.settle().await;

    board.reset();
    assert!(board.is_empty());
    assert_eq!(documents.len(), 1);

    assert!(board.refresh());
    board.settle().await;
    assert_eq!(titles(&board), vec!["Idea".to_string()]);
}

#[tokio::test]
async fn shutdown_drops_subscription() {
    let documents = InMemoryDocumentStore::new();
    let (mut board, _) = synced_board(&documents);
    board.sign_in("alice");
    assert_eq!(documents.listener_count(), 1);

    drop(board);
    assert_eq!(documents.listener_count(), 0);
}
