use crate::model::note::{Note, NoteId, NotePatch, Position};

/// Every state transition the store understands.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// Insert a fully built note.
    Add(Note),
    Update { id: NoteId, patch: NotePatch },
    Delete(NoteId),
    Move { id: NoteId, position: Position },
    /// Wholesale replace from a remote snapshot; marks the store synced.
    ReplaceAll(Vec<Note>),
    /// Wholesale replace from local persistence; sync flags untouched.
    Hydrate(Vec<Note>),
    SetSyncError(String),
    ClearSyncError,
    SetCloudSynced(bool),
    /// Drop every note.
    Reset,
}

/// Effect of one applied action.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Inserted(Note),
    Updated(Note),
    Removed(Note),
    Replaced { count: usize },
    Cleared,
    SyncStateChanged,
    Unchanged,
}

impl StoreChange {
    /// Whether the note collection itself changed.
    pub fn touches_notes(&self) -> bool {
        matches!(
            self,
            Self::Inserted(_)
                | Self::Updated(_)
                | Self::Removed(_)
                | Self::Replaced { .. }
                | Self::Cleared
        )
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}
