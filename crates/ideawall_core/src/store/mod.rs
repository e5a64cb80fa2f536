//! In-memory note collection state.
//!
//! # Responsibility
//! - Hold the authoritative, insertion-ordered note collection and the
//!   sync flags shown by the status indicator.
//! - Apply the closed `StoreAction` set deterministically and notify
//!   observers of each effective change.
//!
//! # Invariants
//! - Note ids are unique within the collection.
//! - The store performs no I/O; callers drive persistence and remote writes
//!   from the returned `StoreChange`.

mod action;
mod factory;
mod note_store;
mod sync_status;

pub use action::{StoreAction, StoreChange};
pub use factory::NoteFactory;
pub use note_store::{NoteStore, ObserverId};
pub use sync_status::SyncStatus;
