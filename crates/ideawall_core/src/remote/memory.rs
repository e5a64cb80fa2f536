//! In-process `DocumentStore`.
//!
//! # Invariants
//! - Listeners are invoked outside the state lock, but snapshots reach them
//!   in mutation order. Listeners must not call back into the store.
//! - Every listener sees the full owner snapshot, newest first.
//! - While offline, every call fails with `RemoteError::Unavailable`.

use super::document::{NoteDocument, NoteFields};
use super::store::{DocumentStore, SnapshotListener, Subscription};
use super::{RemoteError, RemoteResult};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Inner {
    documents: HashMap<String, NoteDocument>,
    listeners: Vec<ListenerEntry>,
    next_listener_id: u64,
    offline: bool,
}

struct ListenerEntry {
    id: u64,
    owner_id: String,
    listener: SnapshotListener,
}

/// Cloneable handle; clones share the same documents and listeners.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    inner: Arc<Mutex<Inner>>,
    delivery: Arc<Mutex<()>>,
    latency: Option<Duration>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every async operation by `latency` before it takes effect.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulates loss of connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
        debug!("event=remote_connectivity module=remote status=ok offline={offline}");
    }

    pub fn is_offline(&self) -> bool {
        self.inner.lock().offline
    }

    /// Current documents of `owner_id`, newest first.
    pub fn snapshot(&self, owner_id: &str) -> Vec<NoteDocument> {
        owner_snapshot(&self.inner.lock(), owner_id)
    }

    pub fn get(&self, id: &str) -> Option<NoteDocument> {
        self.inner.lock().documents.get(id).cloned()
    }

    /// Total documents across all owners.
    pub fn len(&self) -> usize {
        self.inner.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    async fn delay(&self) {
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
    }

    fn ensure_online(inner: &Inner) -> RemoteResult<()> {
        if inner.offline {
            Err(RemoteError::Unavailable("client is offline".to_string()))
        } else {
            Ok(())
        }
    }

    /// Runs `mutate` under the lock, then notifies listeners of the owners it
    /// touched after the lock is released.
    fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut Inner) -> RemoteResult<(T, Vec<String>)>,
    ) -> RemoteResult<T> {
        let _delivery = self.delivery.lock();
        let (value, deliveries) = {
            let mut inner = self.inner.lock();
            Self::ensure_online(&inner)?;
            let (value, owners) = mutate(&mut *inner)?;
            let deliveries: Vec<(SnapshotListener, Vec<NoteDocument>)> = inner
                .listeners
                .iter()
                .filter(|entry| owners.contains(&entry.owner_id))
                .map(|entry| {
                    (
                        Arc::clone(&entry.listener),
                        owner_snapshot(&inner, &entry.owner_id),
                    )
                })
                .collect();
            (value, deliveries)
        };
        for (listener, snapshot) in deliveries {
            listener(snapshot);
        }
        Ok(value)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn subscribe(&self, owner_id: &str, listener: SnapshotListener) -> RemoteResult<Subscription> {
        let _delivery = self.delivery.lock();
        let (id, initial) = {
            let mut inner = self.inner.lock();
            Self::ensure_online(&inner)?;
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push(ListenerEntry {
                id,
                owner_id: owner_id.to_string(),
                listener: Arc::clone(&listener),
            });
            (id, owner_snapshot(&inner, owner_id))
        };
        listener(initial);

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.lock().listeners.retain(|entry| entry.id != id);
            }
        }))
    }

    async fn create(&self, document: NoteDocument) -> RemoteResult<String> {
        self.delay().await;
        self.mutate(|inner| {
            if let Some(existing) = inner.documents.get(&document.id) {
                if existing.owner_id != document.owner_id {
                    return Err(RemoteError::PermissionDenied(format!(
                        "document {} belongs to another owner",
                        document.id
                    )));
                }
            }
            let id = document.id.clone();
            let owner = document.owner_id.clone();
            inner.documents.insert(id.clone(), document);
            Ok((id, vec![owner]))
        })
    }

    async fn update(&self, id: &str, fields: NoteFields) -> RemoteResult<()> {
        self.delay().await;
        self.mutate(|inner| {
            let document = inner
                .documents
                .get_mut(id)
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
            document.fields = fields;
            document.updated_at = Utc::now().max(document.created_at);
            Ok(((), vec![document.owner_id.clone()]))
        })
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        self.delay().await;
        self.mutate(|inner| {
            let owners = inner
                .documents
                .remove(id)
                .map(|document| vec![document.owner_id])
                .unwrap_or_default();
            Ok(((), owners))
        })
    }

    async fn fetch_owned(&self, owner_id: &str) -> RemoteResult<Vec<NoteDocument>> {
        self.delay().await;
        let inner = self.inner.lock();
        Self::ensure_online(&inner)?;
        Ok(owner_snapshot(&inner, owner_id))
    }
}

fn owner_snapshot(inner: &Inner, owner_id: &str) -> Vec<NoteDocument> {
    let mut documents: Vec<NoteDocument> = inner
        .documents
        .values()
        .filter(|document| document.owner_id == owner_id)
        .cloned()
        .collect();
    documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    documents
}
