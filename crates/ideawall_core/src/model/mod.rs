//! Sticky-note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its value types.
//! - Define the interaction mode consumed by board dispatch logic.
//!
//! # Invariants
//! - Every note is identified by a stable, client-generated `NoteId`.
//! - Note text is carried by one canonical `content` field.

pub mod color;
pub mod mode;
pub mod note;
