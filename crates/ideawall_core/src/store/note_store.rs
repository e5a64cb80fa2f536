use super::action::{StoreAction, StoreChange};
use super::factory::NoteFactory;
use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, Position};
use indexmap::IndexMap;
use log::{debug, warn};

/// Handle returned by `NoteStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&StoreChange)>;

/// Authoritative in-memory note collection.
///
/// Constructed explicitly by the application root; there is no shared
/// instance.
pub struct NoteStore {
    notes: IndexMap<NoteId, Note>,
    cloud_synced: bool,
    sync_error: Option<String>,
    factory: NoteFactory,
    observers: Vec<(ObserverId, Observer)>,
    next_observer_id: u64,
}

impl NoteStore {
    pub fn new(factory: NoteFactory) -> Self {
        Self {
            notes: IndexMap::new(),
            cloud_synced: false,
            sync_error: None,
            factory,
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    /// Builds a note from `draft` without inserting it.
    ///
    /// Returns `None` for a blank title.
    pub fn prepare(&mut self, draft: NoteDraft) -> Option<Note> {
        self.factory.build(draft)
    }

    /// Applies one action and notifies observers when something changed.
    pub fn apply(&mut self, action: StoreAction) -> StoreChange {
        let change = self.reduce(action);
        if !change.is_unchanged() {
            for (_, observer) in self.observers.iter_mut() {
                observer(&change);
            }
        }
        change
    }

    fn reduce(&mut self, action: StoreAction) -> StoreChange {
        match action {
            StoreAction::Add(note) => {
                if let Err(err) = note.validate() {
                    warn!(
                        "event=note_add module=store status=rejected note_id={} error={}",
                        note.id, err
                    );
                    return StoreChange::Unchanged;
                }
                if self.notes.contains_key(&note.id) {
                    warn!(
                        "event=note_add module=store status=rejected reason=duplicate_id note_id={}",
                        note.id
                    );
                    return StoreChange::Unchanged;
                }
                debug!("event=note_add module=store status=ok note_id={}", note.id);
                self.notes.insert(note.id, note.clone());
                StoreChange::Inserted(note)
            }
            StoreAction::Update { id, patch } => self.patch_note(id, patch),
            StoreAction::Move { id, position } => {
                self.patch_note(id, NotePatch::default().position(position))
            }
            StoreAction::Delete(id) => match self.notes.shift_remove(&id) {
                Some(note) => {
                    debug!("event=note_delete module=store status=ok note_id={id}");
                    StoreChange::Removed(note)
                }
                None => StoreChange::Unchanged,
            },
            StoreAction::ReplaceAll(notes) => {
                let count = self.replace_notes(notes);
                self.cloud_synced = true;
                self.sync_error = None;
                StoreChange::Replaced { count }
            }
            StoreAction::Hydrate(notes) => StoreChange::Replaced {
                count: self.replace_notes(notes),
            },
            StoreAction::SetSyncError(message) => {
                self.sync_error = Some(message);
                self.cloud_synced = false;
                StoreChange::SyncStateChanged
            }
            StoreAction::ClearSyncError => match self.sync_error.take() {
                Some(_) => StoreChange::SyncStateChanged,
                None => StoreChange::Unchanged,
            },
            StoreAction::SetCloudSynced(synced) => {
                if self.cloud_synced == synced {
                    StoreChange::Unchanged
                } else {
                    self.cloud_synced = synced;
                    StoreChange::SyncStateChanged
                }
            }
            StoreAction::Reset => {
                if self.notes.is_empty() {
                    StoreChange::Unchanged
                } else {
                    self.notes.clear();
                    StoreChange::Cleared
                }
            }
        }
    }

    fn patch_note(&mut self, id: NoteId, patch: NotePatch) -> StoreChange {
        let now = self.factory.now_ms();
        let Some(note) = self.notes.get_mut(&id) else {
            return StoreChange::Unchanged;
        };
        if note.apply_patch(patch, now) {
            StoreChange::Updated(note.clone())
        } else {
            StoreChange::Unchanged
        }
    }

    /// Replaces the collection in the given order. A repeated id overwrites
    /// the earlier entry's value and keeps the earlier position.
    fn replace_notes(&mut self, notes: Vec<Note>) -> usize {
        self.notes = notes.into_iter().map(|note| (note.id, note)).collect();
        self.notes.len()
    }

    /// Builds and inserts a note. Returns `None` when the title is blank.
    pub fn add(&mut self, draft: NoteDraft) -> Option<Note> {
        let note = self.prepare(draft)?;
        match self.apply(StoreAction::Add(note)) {
            StoreChange::Inserted(note) => Some(note),
            _ => None,
        }
    }

    /// Merges `patch` into an existing note. Returns the updated note.
    pub fn update(&mut self, id: NoteId, patch: NotePatch) -> Option<Note> {
        match self.apply(StoreAction::Update { id, patch }) {
            StoreChange::Updated(note) => Some(note),
            _ => None,
        }
    }

    pub fn move_note(&mut self, id: NoteId, position: Position) -> Option<Note> {
        match self.apply(StoreAction::Move { id, position }) {
            StoreChange::Updated(note) => Some(note),
            _ => None,
        }
    }

    /// Removes a note. Returns the removed note, `None` when absent.
    pub fn delete(&mut self, id: NoteId) -> Option<Note> {
        match self.apply(StoreAction::Delete(id)) {
            StoreChange::Removed(note) => Some(note),
            _ => None,
        }
    }

    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.apply(StoreAction::ReplaceAll(notes));
    }

    pub fn set_sync_error(&mut self, message: impl Into<String>) {
        self.apply(StoreAction::SetSyncError(message.into()));
    }

    pub fn clear_sync_error(&mut self) {
        self.apply(StoreAction::ClearSyncError);
    }

    pub fn reset(&mut self) {
        self.apply(StoreAction::Reset);
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.contains_key(&id)
    }

    /// Notes in collection order.
    pub fn notes(&self) -> impl Iterator<Item = &Note> + '_ {
        self.notes.values()
    }

    pub fn to_vec(&self) -> Vec<Note> {
        self.notes.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn cloud_synced(&self) -> bool {
        self.cloud_synced
    }

    pub fn sync_error(&self) -> Option<&str> {
        self.sync_error.as_deref()
    }

    /// Registers an observer called after every effective change.
    pub fn subscribe(&mut self, observer: impl FnMut(&StoreChange) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` for an unknown id.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }
}
