//! Boundary conversion from stored JSON records to `Note`.
//!
//! Older builds wrote the body twice, under `content` and `description`.
//! Records are read through `StoredNote` so both shapes hydrate into the one
//! canonical `content` field; writes only ever emit `content`.

use crate::model::color::NoteColor;
use crate::model::note::{Note, NoteValidationError, Position, Size};
use log::warn;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredNote {
    id: String,
    title: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    size: Option<Size>,
    #[serde(default)]
    rotation: f64,
    #[serde(default)]
    color: Option<String>,
    created_at: i64,
    #[serde(default)]
    updated_at: Option<i64>,
}

impl StoredNote {
    /// Converts into a validated note.
    ///
    /// `content` wins over `description`; an unreadable color falls back to
    /// the default color; a missing or earlier `updatedAt` is lifted to
    /// `createdAt`.
    pub(crate) fn into_note(self) -> Result<Note, NoteValidationError> {
        let id = Uuid::parse_str(self.id.trim())
            .map_err(|_| NoteValidationError::InvalidId(self.id.clone()))?;
        let color = match self.color.as_deref().map(NoteColor::parse) {
            Some(Ok(color)) => color,
            Some(Err(_)) => {
                warn!("event=note_hydrate module=persistence status=fallback field=color note_id={id}");
                NoteColor::default()
            }
            None => NoteColor::default(),
        };

        let note = Note {
            id,
            title: self.title.trim().to_string(),
            content: self.content.or(self.description).unwrap_or_default(),
            position: self.position,
            size: self.size.unwrap_or_default(),
            rotation: self.rotation,
            color,
            created_at: self.created_at,
            updated_at: self
                .updated_at
                .unwrap_or(self.created_at)
                .max(self.created_at),
        };
        note.validate()?;
        Ok(note)
    }
}
