//! Note color value type and fixed picker palette.
//!
//! # Invariants
//! - A `NoteColor` always holds an accepted, normalized color string.
//! - Hex colors are stored lowercase.

use crate::model::note::NoteValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});
static HSL_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsl\(\s*\d{1,3}(?:\.\d+)?\s*,\s*\d{1,3}(?:\.\d+)?%\s*,\s*\d{1,3}(?:\.\d+)?%\s*\)$")
        .expect("valid hsl color regex")
});

/// Color used by the note form when the user picks nothing.
pub const DEFAULT_NOTE_COLOR: &str = "#fffacd";

/// Colors offered by the note color picker.
pub const PALETTE: [&str; 12] = [
    "#ff9aa2", // light red
    "#ffb7b2", // light orange
    "#ffdac1", // peach
    "#e2f0cb", // light green
    "#b5ead7", // mint
    "#c7ceea", // light purple
    "#f8b195", // salmon
    "#f67280", // coral
    "#c06c84", // dusty rose
    "#6c5b7b", // muted purple
    "#355c7d", // navy
    "#2a363b", // dark gray
];

/// Validated note color: a palette entry or any free-picker hex/hsl value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NoteColor(String);

impl NoteColor {
    /// Parses and normalizes a color string.
    ///
    /// Accepted forms: `#rgb`, `#rrggbb`, `hsl(h, s%, l%)`.
    ///
    /// # Errors
    /// - Returns `InvalidColor` for anything else.
    pub fn parse(value: &str) -> Result<Self, NoteValidationError> {
        let trimmed = value.trim();
        if HEX_COLOR_RE.is_match(trimmed) {
            return Ok(Self(trimmed.to_ascii_lowercase()));
        }
        if HSL_COLOR_RE.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Err(NoteValidationError::InvalidColor(trimmed.to_string()))
    }

    /// Returns the palette entry at `index`, wrapping around.
    pub fn from_palette(index: usize) -> Self {
        Self(PALETTE[index % PALETTE.len()].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_palette_color(&self) -> bool {
        PALETTE.contains(&self.0.as_str())
    }
}

impl Default for NoteColor {
    fn default() -> Self {
        Self(DEFAULT_NOTE_COLOR.to_string())
    }
}

impl Display for NoteColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NoteColor {
    type Error = NoteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NoteColor> for String {
    fn from(value: NoteColor) -> Self {
        value.0
    }
}
