use super::document::{NoteDocument, NoteFields};
use super::RemoteResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Receives the full, ordered document list of one owner on every change.
pub type SnapshotListener = Arc<dyn Fn(Vec<NoteDocument>) + Send + Sync>;

/// Client contract of a remote note document database.
///
/// Implementations order snapshots by `created_at` descending.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Starts a live query over documents owned by `owner_id`.
    ///
    /// The listener receives the current snapshot immediately and again after
    /// every change. Dropping the returned `Subscription` stops delivery.
    fn subscribe(&self, owner_id: &str, listener: SnapshotListener) -> RemoteResult<Subscription>;

    /// Creates the document under its own id (overwriting a document with
    /// the same id and owner). Returns the document id.
    async fn create(&self, document: NoteDocument) -> RemoteResult<String>;

    /// Replaces the mutable fields and refreshes the remote updated time.
    async fn update(&self, id: &str, fields: NoteFields) -> RemoteResult<()>;

    /// Deletes a document. Deleting an absent document succeeds.
    async fn delete(&self, id: &str) -> RemoteResult<()>;

    /// One-time fetch of all documents owned by `owner_id`.
    async fn fetch_owned(&self, owner_id: &str) -> RemoteResult<Vec<NoteDocument>>;
}

/// Live-query handle; unsubscribes when cancelled or dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
