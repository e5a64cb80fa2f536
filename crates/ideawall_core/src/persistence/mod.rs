//! Local persistence of the full note collection.
//!
//! # Responsibility
//! - Mirror the whole collection into a durable key-value store after every
//!   note mutation.
//! - Hydrate the collection at startup.
//!
//! # Invariants
//! - `NotePersistence::save` and `NotePersistence::load` never fail outward;
//!   failures are logged and degrade to in-memory-only behavior.
//! - Concurrent writers are not coordinated: last writer wins.

use crate::db::DbError;
use crate::model::note::Note;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod record;
mod sqlite;

pub use sqlite::SqliteNoteStorage;

pub type PersistResult<T> = Result<T, PersistError>;

#[derive(Debug)]
pub enum PersistError {
    Db(DbError),
    Serialize(serde_json::Error),
    /// Serialized payload does not fit the configured quota.
    QuotaExceeded { needed: usize, quota: usize },
    /// Stored value is not a JSON array.
    Corrupt(String),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize notes: {err}"),
            Self::QuotaExceeded { needed, quota } => write!(
                f,
                "local storage quota exceeded: {needed} bytes needed, {quota} allowed"
            ),
            Self::Corrupt(message) => write!(f, "stored notes are corrupt: {message}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Corrupt(_) => None,
        }
    }
}

impl From<DbError> for PersistError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable mirror of the note collection.
pub trait NotePersistence {
    /// Writes the whole collection. Failures are logged, never returned.
    fn save(&self, notes: &[Note]);
    /// Reads the collection. Absent or unreadable data yields an empty list.
    fn load(&self) -> Vec<Note>;
}
