//! Core of the idea wall: sticky notes on a shared board.
//! This crate owns the note model, local persistence, cloud sync and the
//! interaction mode; UI layers only call into `Board`.

pub mod board;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod remote;
pub mod store;

pub use board::Board;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LoggingConfig, NoteDefaults, Placement, StorageConfig, WallConfig};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::color::{NoteColor, DEFAULT_NOTE_COLOR, PALETTE};
pub use model::mode::{NoteClickIntent, ShootingMode};
pub use model::note::{Note, NoteDraft, NoteId, NotePatch, NoteValidationError, Position, Size};
pub use persistence::{NotePersistence, PersistError, SqliteNoteStorage};
pub use remote::{
    DocumentStore, InMemoryDocumentStore, NoteDocument, RemoteError, RemoteSync, SyncEvent,
};
pub use store::{NoteFactory, NoteStore, StoreAction, StoreChange, SyncStatus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
