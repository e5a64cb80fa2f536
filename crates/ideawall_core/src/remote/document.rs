use crate::model::color::NoteColor;
use crate::model::note::{Note, NoteId, NoteValidationError, Position, Size};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutable note fields as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFields {
    pub title: String,
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub rotation: f64,
    pub color: String,
}

/// One remote note document, tagged with its owning identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDocument {
    pub id: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub fields: NoteFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NoteFields {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            position: note.position,
            size: note.size,
            rotation: note.rotation,
            color: note.color.as_str().to_string(),
        }
    }
}

impl NoteDocument {
    pub fn from_note(owner_id: &str, note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            owner_id: owner_id.to_string(),
            fields: NoteFields::from_note(note),
            created_at: millis_to_datetime(note.created_at),
            updated_at: millis_to_datetime(note.updated_at),
        }
    }

    pub fn note_id(&self) -> Result<NoteId, NoteValidationError> {
        Uuid::parse_str(&self.id).map_err(|_| NoteValidationError::InvalidId(self.id.clone()))
    }

    /// Converts into a validated local note.
    pub fn to_note(&self) -> Result<Note, NoteValidationError> {
        let created_at = self.created_at.timestamp_millis();
        let note = Note {
            id: self.note_id()?,
            title: self.fields.title.trim().to_string(),
            content: self.fields.content.clone(),
            position: self.fields.position,
            size: self.fields.size,
            rotation: self.fields.rotation,
            color: NoteColor::parse(&self.fields.color)?,
            created_at,
            updated_at: self.updated_at.timestamp_millis().max(created_at),
        };
        note.validate()?;
        Ok(note)
    }
}

pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}
