//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical sticky-note record and its geometry value types.
//! - Describe user input for creation (`NoteDraft`) and edits (`NotePatch`).
//! - Enforce field-level invariants through `Note::validate()`.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `title` is non-empty after trimming.
//! - `updated_at >= created_at`, and `updated_at` never moves backward.
//! - `rotation` is chosen at creation and is not patchable afterwards.

use crate::model::color::NoteColor;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one note, generated on the client at creation time.
pub type NoteId = Uuid;

pub const DEFAULT_NOTE_WIDTH: f64 = 250.0;
pub const DEFAULT_NOTE_HEIGHT: f64 = 200.0;

/// Board coordinate in pixels, measured from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(DEFAULT_NOTE_WIDTH, DEFAULT_NOTE_HEIGHT)
    }
}

/// Field-level validation failure for notes and note input.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// Color string is not an accepted color form.
    InvalidColor(String),
    /// Identifier is not a UUID.
    InvalidId(String),
    /// `updated_at` is earlier than `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
    /// A geometry field holds NaN/infinite or non-positive size values.
    InvalidGeometry(&'static str),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::InvalidColor(value) => write!(f, "invalid note color: `{value}`"),
            Self::InvalidId(value) => write!(f, "invalid note id: `{value}`"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "note updated_at {updated_at} is earlier than created_at {created_at}"
            ),
            Self::InvalidGeometry(field) => write!(f, "invalid note geometry: {field}"),
        }
    }
}

impl Error for NoteValidationError {}

/// Canonical sticky-note record.
///
/// Serialized with camelCase keys; this is the shape written to local
/// storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    /// Tilt in degrees. Fixed for the lifetime of the note.
    #[serde(default)]
    pub rotation: f64,
    pub color: NoteColor,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed by every mutation.
    pub updated_at: i64,
}

impl Note {
    /// Validates field invariants.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is blank.
    /// - `TimestampOrder` when `updated_at < created_at`.
    /// - `InvalidGeometry` for non-finite coordinates or invalid size.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::EmptyTitle);
        }
        if self.updated_at < self.created_at {
            return Err(NoteValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        if !self.position.is_finite() {
            return Err(NoteValidationError::InvalidGeometry("position"));
        }
        if !self.size.is_valid() {
            return Err(NoteValidationError::InvalidGeometry("size"));
        }
        if !self.rotation.is_finite() {
            return Err(NoteValidationError::InvalidGeometry("rotation"));
        }
        Ok(())
    }

    /// Merges present patch fields into this note and refreshes `updated_at`.
    ///
    /// Returns `false` (and leaves the note untouched) when the patch carries
    /// nothing applicable after normalization.
    pub fn apply_patch(&mut self, patch: NotePatch, now_ms: i64) -> bool {
        let patch = patch.normalized();
        if patch.is_empty() {
            return false;
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        self.touch(now_ms);
        true
    }

    /// Refreshes `updated_at` without letting it move backward.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms.max(self.updated_at).max(self.created_at);
    }
}

/// User input for creating a note.
///
/// Anything left unset is filled by the store's note factory.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub color: Option<NoteColor>,
    pub position: Option<Position>,
    pub rotation: Option<f64>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Returns the trimmed title, or `None` when it is blank.
    pub fn normalized_title(&self) -> Option<&str> {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Partial edit of a note's mutable fields.
///
/// `id`, timestamps and `rotation` are intentionally absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub color: Option<NoteColor>,
}

impl NotePatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.position.is_none()
            && self.size.is_none()
            && self.color.is_none()
    }

    /// Drops fields that would break note invariants.
    ///
    /// Blank titles and non-finite geometry are discarded; titles are trimmed.
    pub fn normalized(self) -> Self {
        Self {
            title: self
                .title
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            content: self.content,
            position: self.position.filter(Position::is_finite),
            size: self.size.filter(Size::is_valid),
            color: self.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteDraft, NotePatch, NoteValidationError, Position, Size};
    use crate::model::color::NoteColor;
    use uuid::Uuid;

    fn sample_note() -> Note {
        Note {
            id: Uuid::new_v4(),
            title: "Idea".to_string(),
            content: "Body".to_string(),
            position: Position::new(50.0, 50.0),
            size: Size::default(),
            rotation: 2.0,
            color: NoteColor::default(),
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn validate_rejects_blank_title_and_reversed_timestamps() {
        let mut note = sample_note();
        note.title = "   ".to_string();
        assert_eq!(note.validate(), Err(NoteValidationError::EmptyTitle));

        let mut note = sample_note();
        note.updated_at = 999;
        assert!(matches!(
            note.validate(),
            Err(NoteValidationError::TimestampOrder { .. })
        ));
    }

    #[test]
    fn apply_patch_changes_only_present_fields() {
        let mut note = sample_note();
        let before = note.clone();
        let changed = note.apply_patch(NotePatch::default().content("New body"), 2_000);

        assert!(changed);
        assert_eq!(note.content, "New body");
        assert_eq!(note.title, before.title);
        assert_eq!(note.position, before.position);
        assert_eq!(note.rotation, before.rotation);
        assert_eq!(note.updated_at, 2_000);
    }

    #[test]
    fn apply_patch_ignores_blank_title_and_empty_patch() {
        let mut note = sample_note();
        assert!(!note.apply_patch(NotePatch::default().title("  "), 2_000));
        assert_eq!(note.title, "Idea");
        assert_eq!(note.updated_at, 1_000);

        assert!(!note.apply_patch(NotePatch::default(), 3_000));
        assert_eq!(note.updated_at, 1_000);
    }

    #[test]
    fn touch_never_moves_updated_at_backward() {
        let mut note = sample_note();
        note.touch(5_000);
        note.touch(4_000);
        assert_eq!(note.updated_at, 5_000);
    }

    #[test]
    fn patch_normalization_drops_non_finite_geometry() {
        let patch = NotePatch::default()
            .position(Position::new(f64::NAN, 1.0))
            .size(Size::new(0.0, 10.0))
            .title("  Trimmed  ")
            .normalized();
        assert!(patch.position.is_none());
        assert!(patch.size.is_none());
        assert_eq!(patch.title.as_deref(), Some("Trimmed"));
    }

    #[test]
    fn draft_title_is_trimmed() {
        assert_eq!(NoteDraft::new("  Idea ", "").normalized_title(), Some("Idea"));
        assert_eq!(NoteDraft::new(" \t ", "x").normalized_title(), None);
    }

    #[test]
    fn note_serializes_with_camel_case_keys() {
        let note = sample_note();
        let json = serde_json::to_value(&note).expect("note should serialize");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("description").is_none());
        assert_eq!(json["size"]["width"], 250.0);
    }
}
