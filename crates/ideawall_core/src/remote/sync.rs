//! Per-identity bridge between the local collection and a `DocumentStore`.
//!
//! # Responsibility
//! - Keep one live subscription for the signed-in identity.
//! - Dispatch note writes as background tasks.
//! - Turn queued `SyncEvent`s into store-level resolutions.
//!
//! # Invariants
//! - Events tagged with an older generation are ignored.
//! - Tasks never touch the note store; they only post events.
//! - Writes to one note reach the document store in the order they were
//!   issued.
//! - While a write for a note is unsettled or has failed, snapshots cannot
//!   drop, revert or resurrect that note. A later successful write lifts this.

use super::document::NoteDocument;
use super::store::{DocumentStore, SnapshotListener, Subscription};
use super::RemoteResult;
use crate::logging::sanitize_message;
use crate::model::note::{Note, NoteId};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

const MAX_ERROR_CHARS: usize = 200;

/// Remote operation carried by a task or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Create(NoteId),
    Update(NoteId),
    Delete(NoteId),
    Fetch,
    Subscribe,
}

impl SyncOp {
    pub fn note_id(&self) -> Option<NoteId> {
        match self {
            Self::Create(id) | Self::Update(id) | Self::Delete(id) => Some(*id),
            Self::Fetch | Self::Subscribe => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Fetch => "fetch",
            Self::Subscribe => "subscribe",
        }
    }
}

/// Message posted by listeners and tasks to the owner of the note store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Snapshot {
        generation: u64,
        documents: Vec<NoteDocument>,
    },
    Acked {
        generation: u64,
        op: SyncOp,
    },
    Failed {
        generation: u64,
        op: SyncOp,
        message: String,
    },
}

impl SyncEvent {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Snapshot { generation, .. }
            | Self::Acked { generation, .. }
            | Self::Failed { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Acked,
    Failed(String),
}

/// Handle to one in-flight remote write.
#[derive(Debug)]
pub struct SyncTask {
    op: SyncOp,
    handle: JoinHandle<SyncOutcome>,
}

impl SyncTask {
    pub fn op(&self) -> SyncOp {
        self.op
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for completion. The task's event has been posted by then.
    pub async fn wait(self) -> SyncOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) => SyncOutcome::Failed(format!("sync task did not complete: {err}")),
        }
    }
}

/// What the owner should do with the note store after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncResolution {
    /// Replace the collection with this reconciled list.
    Replace(Vec<Note>),
    /// Record this sync error.
    Error(String),
    /// A write landed; nothing to apply.
    Acknowledged,
    /// Stale event.
    Ignored,
}

pub struct RemoteSync {
    store: Arc<dyn DocumentStore>,
    events: UnboundedSender<SyncEvent>,
    identity: Option<String>,
    generation: u64,
    subscription: Option<Subscription>,
    known_remote: HashSet<NoteId>,
    pending: HashMap<NoteId, u32>,
    unsynced: HashSet<NoteId>,
    tombstones: HashSet<NoteId>,
    write_tails: HashMap<NoteId, oneshot::Receiver<()>>,
}

impl RemoteSync {
    pub fn new(store: Arc<dyn DocumentStore>, events: UnboundedSender<SyncEvent>) -> Self {
        Self {
            store,
            events,
            identity: None,
            generation: 0,
            subscription: None,
            known_remote: HashSet::new(),
            pending: HashMap::new(),
            unsynced: HashSet::new(),
            tombstones: HashSet::new(),
            write_tails: HashMap::new(),
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Unsettled note writes for the current identity.
    pub fn pending_writes(&self) -> usize {
        self.pending.values().map(|count| *count as usize).sum()
    }

    /// Subscribes to `user_id`'s documents, replacing any previous identity.
    ///
    /// Returns `false` when already attached to `user_id`. A subscribe
    /// failure keeps the identity and posts `SyncEvent::Failed`.
    pub fn attach(&mut self, user_id: &str) -> bool {
        if self.identity.as_deref() == Some(user_id) && self.subscription.is_some() {
            return false;
        }
        self.detach();
        self.identity = Some(user_id.to_string());

        let generation = self.generation;
        let sender = self.events.clone();
        let listener: SnapshotListener = Arc::new(move |documents: Vec<NoteDocument>| {
            let _ = sender.send(SyncEvent::Snapshot {
                generation,
                documents,
            });
        });

        match self.store.subscribe(user_id, listener) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                info!("event=remote_attach module=remote status=ok generation={generation}");
            }
            Err(err) => {
                warn!(
                    "event=remote_attach module=remote status=error generation={} code={}",
                    generation,
                    err.code()
                );
                let _ = self.events.send(SyncEvent::Failed {
                    generation,
                    op: SyncOp::Subscribe,
                    message: err.to_string(),
                });
            }
        }
        true
    }

    /// Drops the subscription and identity. Events from earlier tasks become
    /// stale.
    pub fn detach(&mut self) {
        let was_attached = self.subscription.take().is_some();
        self.identity = None;
        self.generation += 1;
        self.known_remote.clear();
        self.pending.clear();
        self.unsynced.clear();
        self.tombstones.clear();
        self.write_tails.clear();
        if was_attached {
            info!(
                "event=remote_detach module=remote status=ok generation={}",
                self.generation
            );
        }
    }

    /// Creates the note remotely when unknown there, else updates its fields.
    ///
    /// Returns `None` when no identity is attached.
    pub fn upsert(&mut self, note: &Note) -> Option<SyncTask> {
        let owner = self.identity.clone()?;
        let op = if self.known_remote.contains(&note.id) {
            SyncOp::Update(note.id)
        } else {
            SyncOp::Create(note.id)
        };
        let document = NoteDocument::from_note(&owner, note);
        let store = Arc::clone(&self.store);
        self.spawn(op, async move {
            match op {
                SyncOp::Update(_) => store.update(&document.id, document.fields).await,
                _ => store.create(document).await.map(|_| ()),
            }
        })
    }

    /// Deletes the note remotely. Until the delete lands, snapshots that
    /// still contain it are filtered.
    pub fn remove(&mut self, id: NoteId) -> Option<SyncTask> {
        self.identity.as_ref()?;
        self.unsynced.remove(&id);
        self.tombstones.insert(id);
        let store = Arc::clone(&self.store);
        self.spawn(SyncOp::Delete(id), async move {
            store.delete(&id.to_string()).await
        })
    }

    /// Writes every note to the remote collection and retries failed deletes.
    pub fn push_all(&mut self, notes: &[Note]) -> Vec<SyncTask> {
        let failed_deletes: Vec<NoteId> = self
            .tombstones
            .iter()
            .filter(|id| !self.pending.contains_key(id))
            .copied()
            .collect();
        let mut tasks: Vec<SyncTask> = notes.iter().filter_map(|note| self.upsert(note)).collect();
        tasks.extend(failed_deletes.into_iter().filter_map(|id| self.remove(id)));
        if !tasks.is_empty() {
            info!(
                "event=remote_push_all module=remote status=ok count={}",
                tasks.len()
            );
        }
        tasks
    }

    /// One-time fetch, delivered as a regular snapshot event.
    pub fn refresh(&mut self) -> Option<SyncTask> {
        let owner = self.identity.clone()?;
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let generation = self.generation;
        self.spawn(SyncOp::Fetch, async move {
            let documents = store.fetch_owned(&owner).await?;
            let _ = events.send(SyncEvent::Snapshot {
                generation,
                documents,
            });
            Ok(())
        })
    }

    /// Applies bookkeeping for `event` and tells the owner what to do.
    ///
    /// `local` is the current collection, used to keep unsettled writes.
    pub fn resolve(&mut self, event: SyncEvent, local: &[Note]) -> SyncResolution {
        if event.generation() != self.generation {
            debug!(
                "event=sync_event module=remote status=ignored reason=stale_generation generation={} current={}",
                event.generation(),
                self.generation
            );
            return SyncResolution::Ignored;
        }

        match event {
            SyncEvent::Snapshot { documents, .. } => {
                let remote = self.accept_documents(documents);
                let pending = &self.pending;
                let known_remote = &self.known_remote;
                self.tombstones.retain(|id| pending.contains_key(id) || known_remote.contains(id));
                self.unsynced.retain(|id| local.iter().any(|note| note.id == *id));
                let local_wins: HashSet<NoteId> = self
                    .pending
                    .keys()
                    .chain(self.unsynced.iter())
                    .copied()
                    .collect();
                SyncResolution::Replace(reconcile_snapshot(
                    local,
                    remote,
                    &local_wins,
                    &self.tombstones,
                ))
            }
            SyncEvent::Acked { op, .. } => {
                self.settle(op);
                match op {
                    SyncOp::Create(id) | SyncOp::Update(id) => {
                        self.known_remote.insert(id);
                        self.unsynced.remove(&id);
                    }
                    SyncOp::Delete(id) => {
                        self.known_remote.remove(&id);
                        self.tombstones.remove(&id);
                    }
                    SyncOp::Fetch | SyncOp::Subscribe => {}
                }
                SyncResolution::Acknowledged
            }
            SyncEvent::Failed { op, message, .. } => {
                self.settle(op);
                if let SyncOp::Create(id) | SyncOp::Update(id) = op {
                    if !self.tombstones.contains(&id) {
                        self.unsynced.insert(id);
                    }
                }
                SyncResolution::Error(message)
            }
        }
    }

    fn accept_documents(&mut self, documents: Vec<NoteDocument>) -> Vec<Note> {
        self.known_remote.clear();
        let mut notes = Vec::with_capacity(documents.len());
        for document in documents {
            match document.to_note() {
                Ok(note) => {
                    self.known_remote.insert(note.id);
                    notes.push(note);
                }
                Err(err) => warn!(
                    "event=remote_snapshot module=remote status=skip reason=invalid_document error={}",
                    err
                ),
            }
        }
        notes
    }

    fn settle(&mut self, op: SyncOp) {
        let Some(id) = op.note_id() else {
            return;
        };
        if let Some(count) = self.pending.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.pending.remove(&id);
            }
        }
    }

    /// Returns the completion signal of the previous write to `id`, if it
    /// may still be running, and registers `done` as the new tail.
    fn chain_write(
        &mut self,
        id: NoteId,
        done: oneshot::Receiver<()>,
    ) -> Option<oneshot::Receiver<()>> {
        self.write_tails
            .retain(|_, tail| matches!(tail.try_recv(), Err(TryRecvError::Empty)));
        self.write_tails.insert(id, done)
    }

    fn spawn<F>(&mut self, op: SyncOp, work: F) -> Option<SyncTask>
    where
        F: Future<Output = RemoteResult<()>> + Send + 'static,
    {
        if let Some(id) = op.note_id() {
            *self.pending.entry(id).or_insert(0) += 1;
        }
        let generation = self.generation;
        let events = self.events.clone();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(
                    "event=remote_write module=remote status=error op={} reason=no_runtime",
                    op.name()
                );
                let _ = events.send(SyncEvent::Failed {
                    generation,
                    op,
                    message: format!("remote sync unavailable: {err}"),
                });
                return None;
            }
        };

        let (done_tx, done_rx) = oneshot::channel();
        let previous = op.note_id().and_then(|id| self.chain_write(id, done_rx));

        let handle = runtime.spawn(async move {
            if let Some(previous) = previous {
                // Resolves on completion or when the earlier task is dropped.
                let _ = previous.await;
            }
            let outcome = match work.await {
                Ok(()) => {
                    debug!(
                        "event=remote_write module=remote status=ok op={}",
                        op.name()
                    );
                    let _ = events.send(SyncEvent::Acked { generation, op });
                    SyncOutcome::Acked
                }
                Err(err) => {
                    let message = sanitize_message(&err.to_string(), MAX_ERROR_CHARS);
                    warn!(
                        "event=remote_write module=remote status=error op={} code={}",
                        op.name(),
                        err.code()
                    );
                    let _ = events.send(SyncEvent::Failed {
                        generation,
                        op,
                        message: message.clone(),
                    });
                    SyncOutcome::Failed(message)
                }
            };
            let _ = done_tx.send(());
            outcome
        });
        Some(SyncTask { op, handle })
    }
}

/// Merges a remote snapshot with local notes that have unsettled writes.
///
/// - Ids in `tombstones` are dropped.
/// - Ids in `local_wins` keep their local version; those missing remotely
///   are placed first, in local order.
/// - Everything else follows the remote snapshot verbatim.
pub fn reconcile_snapshot(
    local: &[Note],
    remote: Vec<Note>,
    local_wins: &HashSet<NoteId>,
    tombstones: &HashSet<NoteId>,
) -> Vec<Note> {
    let local_by_id: HashMap<NoteId, &Note> = local.iter().map(|note| (note.id, note)).collect();
    let remote_ids: HashSet<NoteId> = remote.iter().map(|note| note.id).collect();

    let mut merged: Vec<Note> = local
        .iter()
        .filter(|note| {
            local_wins.contains(&note.id)
                && !remote_ids.contains(&note.id)
                && !tombstones.contains(&note.id)
        })
        .cloned()
        .collect();

    for note in remote {
        if tombstones.contains(&note.id) {
            continue;
        }
        match local_by_id.get(&note.id) {
            Some(local_note) if local_wins.contains(&note.id) => merged.push((*local_note).clone()),
            _ => merged.push(note),
        }
    }
    merged
}
