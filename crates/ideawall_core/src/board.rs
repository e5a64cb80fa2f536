//! Application root for one idea wall.
//!
//! # Responsibility
//! - Own the note store, local persistence, remote sync and shooting mode.
//! - Route every UI-facing action through the store, then persist the full
//!   collection and dispatch the matching remote write.
//! - Apply queued remote events on the owner's thread.
//!
//! # Invariants
//! - Every effective note mutation is followed by one full-collection save.
//! - Remote outcomes only reach the store through `pump`/`settle`.
//! - `reset` is local-only and never deletes remote documents. It also
//!   returns the shooting mode to normal.

use crate::config::WallConfig;
use crate::db::DbResult;
use crate::model::color::NoteColor;
use crate::model::mode::{NoteClickIntent, ShootingMode};
use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, Position};
use crate::persistence::{NotePersistence, SqliteNoteStorage};
use crate::remote::{DocumentStore, RemoteSync, SyncEvent, SyncResolution, SyncTask};
use crate::store::{NoteFactory, NoteStore, ObserverId, StoreAction, StoreChange, SyncStatus};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub struct Board {
    store: NoteStore,
    persistence: Box<dyn NotePersistence>,
    remote: Option<RemoteSync>,
    mode: ShootingMode,
    events_tx: UnboundedSender<SyncEvent>,
    events: UnboundedReceiver<SyncEvent>,
    in_flight: Vec<SyncTask>,
}

impl Board {
    /// Builds a board and hydrates it from `persistence`.
    pub fn new(factory: NoteFactory, persistence: Box<dyn NotePersistence>) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let mut store = NoteStore::new(factory);
        let change = store.apply(StoreAction::Hydrate(persistence.load()));
        info!(
            "event=board_open module=board status=ok hydrated={}",
            match change {
                StoreChange::Replaced { count } => count,
                _ => 0,
            }
        );
        Self {
            store,
            persistence,
            remote: None,
            mode: ShootingMode::default(),
            events_tx,
            events,
            in_flight: Vec::new(),
        }
    }

    /// Opens the configured SQLite storage and hydrates from it.
    ///
    /// # Errors
    /// - Returns `DbError` when the database cannot be opened or migrated.
    pub fn open(config: &WallConfig) -> DbResult<Self> {
        let storage = SqliteNoteStorage::open(&config.storage)?;
        Ok(Self::new(
            NoteFactory::with_defaults(config.notes.clone()),
            Box::new(storage),
        ))
    }

    /// Enables cloud sync through `documents`. Sync starts at `sign_in`.
    pub fn with_remote(mut self, documents: Arc<dyn DocumentStore>) -> Self {
        self.remote = Some(RemoteSync::new(documents, self.events_tx.clone()));
        self
    }

    /// Applies one action, persisting and syncing its effect.
    pub fn dispatch(&mut self, action: StoreAction) -> StoreChange {
        let change = self.store.apply(action);
        self.propagate(&change);
        change
    }

    fn propagate(&mut self, change: &StoreChange) {
        if change.touches_notes() {
            self.persistence.save(&self.store.to_vec());
        }
        let Some(remote) = self.remote.as_mut() else {
            return;
        };
        let task = match change {
            StoreChange::Inserted(note) | StoreChange::Updated(note) => remote.upsert(note),
            StoreChange::Removed(note) => remote.remove(note.id),
            _ => None,
        };
        if let Some(task) = task {
            self.in_flight.retain(|task| !task.is_finished());
            self.in_flight.push(task);
        }
    }

    /// Creates a note. Returns `None` when the title is blank.
    pub fn add_note(&mut self, draft: NoteDraft) -> Option<Note> {
        let note = self.store.prepare(draft)?;
        match self.dispatch(StoreAction::Add(note)) {
            StoreChange::Inserted(note) => Some(note),
            _ => None,
        }
    }

    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> Option<Note> {
        match self.dispatch(StoreAction::Update { id, patch }) {
            StoreChange::Updated(note) => Some(note),
            _ => None,
        }
    }

    pub fn move_note(&mut self, id: NoteId, position: Position) -> Option<Note> {
        match self.dispatch(StoreAction::Move { id, position }) {
            StoreChange::Updated(note) => Some(note),
            _ => None,
        }
    }

    pub fn recolor_note(&mut self, id: NoteId, color: NoteColor) -> Option<Note> {
        self.update_note(id, NotePatch::default().color(color))
    }

    pub fn delete_note(&mut self, id: NoteId) -> Option<Note> {
        match self.dispatch(StoreAction::Delete(id)) {
            StoreChange::Removed(note) => Some(note),
            _ => None,
        }
    }

    /// Resolves a click on a note under the current mode. In targeting mode
    /// the note is deleted.
    pub fn click_note(&mut self, id: NoteId) -> NoteClickIntent {
        let intent = self.mode.click_intent();
        if intent == NoteClickIntent::Delete && self.delete_note(id).is_some() {
            debug!("event=note_shot module=board status=ok note_id={id}");
        }
        intent
    }

    pub fn toggle_shooting_mode(&mut self) -> ShootingMode {
        self.mode.toggle()
    }

    pub fn set_shooting_mode(&mut self, targeting: bool) {
        self.mode.set(targeting);
    }

    /// Clears every local note and leaves targeting mode. Remote documents
    /// are left alone.
    pub fn reset(&mut self) {
        self.dispatch(StoreAction::Reset);
        self.mode.set(false);
    }

    /// Starts syncing with `user_id`'s remote collection.
    ///
    /// Returns `false` when no remote is configured or `user_id` is already
    /// the active identity.
    pub fn sign_in(&mut self, user_id: &str) -> bool {
        let Some(remote) = self.remote.as_mut() else {
            warn!("event=sign_in module=board status=error reason=no_remote");
            return false;
        };
        if !remote.attach(user_id) {
            return false;
        }
        self.store.apply(StoreAction::SetCloudSynced(false));
        self.store.apply(StoreAction::ClearSyncError);
        self.pump();
        true
    }

    /// Stops syncing. Local notes stay as they are.
    pub fn sign_out(&mut self) {
        let Some(remote) = self.remote.as_mut() else {
            return;
        };
        remote.detach();
        self.store.apply(StoreAction::SetCloudSynced(false));
        self.store.apply(StoreAction::ClearSyncError);
    }

    /// Pushes every local note to the remote collection and retries failed
    /// deletes. Returns the number of writes dispatched.
    pub fn sync_all(&mut self) -> usize {
        let Some(remote) = self.remote.as_mut() else {
            return 0;
        };
        let tasks = remote.push_all(&self.store.to_vec());
        let count = tasks.len();
        self.in_flight.extend(tasks);
        count
    }

    /// Requests a one-time fetch of the remote collection.
    pub fn refresh(&mut self) -> bool {
        let Some(task) = self.remote.as_mut().and_then(RemoteSync::refresh) else {
            return false;
        };
        self.in_flight.push(task);
        true
    }

    /// Applies every queued remote event without waiting. Returns how many
    /// events were processed.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        self.in_flight.retain(|task| !task.is_finished());
        processed
    }

    /// Waits for every in-flight remote task, then applies queued events.
    pub async fn settle(&mut self) -> usize {
        for task in std::mem::take(&mut self.in_flight) {
            task.wait().await;
        }
        self.pump()
    }

    fn handle_event(&mut self, event: SyncEvent) {
        let Some(remote) = self.remote.as_mut() else {
            return;
        };
        let local = self.store.to_vec();
        match remote.resolve(event, &local) {
            SyncResolution::Replace(notes) => {
                self.dispatch(StoreAction::ReplaceAll(notes));
            }
            SyncResolution::Error(message) => {
                self.store.apply(StoreAction::SetSyncError(message));
            }
            SyncResolution::Acknowledged => {
                self.store.apply(StoreAction::ClearSyncError);
            }
            SyncResolution::Ignored => {}
        }
    }

    /// Detaches the remote subscription. Local state is kept.
    pub fn shutdown(&mut self) {
        if let Some(remote) = self.remote.as_mut() {
            if remote.identity().is_some() {
                remote.detach();
                info!("event=board_shutdown module=board status=ok");
            }
        }
    }

    pub fn sync_status(&self) -> SyncStatus {
        match &self.remote {
            Some(remote) => SyncStatus::derive(
                remote.identity().is_some(),
                self.store.cloud_synced(),
                self.store.sync_error(),
                remote.pending_writes(),
            ),
            None => SyncStatus::Offline,
        }
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> + '_ {
        self.store.notes()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn shooting_mode(&self) -> ShootingMode {
        self.mode
    }

    pub fn identity(&self) -> Option<&str> {
        self.remote.as_ref().and_then(RemoteSync::identity)
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&StoreChange) + 'static) -> ObserverId {
        self.store.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.store.unsubscribe(id)
    }
}

impl Drop for Board {
    fn drop(&mut self) {
        self.shutdown();
    }
}
