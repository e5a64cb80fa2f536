//! Remote document-store sync.
//!
//! # Responsibility
//! - Define the document-store client contract (`DocumentStore`).
//! - Bridge the local collection to a per-user remote collection
//!   (`RemoteSync`): live subscription, upserts, deletes.
//! - Ship an in-process `DocumentStore` used by tests and local tooling.
//!
//! # Invariants
//! - Remote failures never escape as panics or returned errors from write
//!   dispatch; they surface as `SyncEvent::Failed`.
//! - Local state is never rolled back because of a remote outcome.
//! - Remote timestamps are `chrono` values; conversion to epoch
//!   milliseconds happens only in `document`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod document;
mod memory;
mod store;
mod sync;

pub use document::{NoteDocument, NoteFields};
pub use memory::InMemoryDocumentStore;
pub use store::{DocumentStore, SnapshotListener, Subscription};
pub use sync::{
    reconcile_snapshot, RemoteSync, SyncEvent, SyncOp, SyncOutcome, SyncResolution, SyncTask,
};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure reported by a document-store client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Network down or service unreachable.
    Unavailable(String),
    NotFound(String),
    PermissionDenied(String),
    /// Document cannot be mapped to a note.
    InvalidDocument(String),
    /// Any other backend failure.
    Backend(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "remote store unavailable: {message}"),
            Self::NotFound(id) => write!(f, "remote document not found: {id}"),
            Self::PermissionDenied(message) => write!(f, "permission denied: {message}"),
            Self::InvalidDocument(message) => write!(f, "invalid remote document: {message}"),
            Self::Backend(message) => write!(f, "remote store error: {message}"),
        }
    }
}

impl Error for RemoteError {}

impl RemoteError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied(_) => "permission_denied",
            Self::InvalidDocument(_) => "invalid_document",
            Self::Backend(_) => "backend",
        }
    }
}
