//! Shooting-mode controller.
//!
//! A two-state flag deciding what a click on a note means. It only changes
//! through explicit toggles; there is no timeout.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShootingMode {
    /// Clicking a note starts a drag.
    #[default]
    Normal,
    /// Clicking a note deletes it.
    Targeting,
}

/// What a click on a note should do under the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteClickIntent {
    BeginDrag,
    Delete,
}

impl ShootingMode {
    /// Flips between `Normal` and `Targeting`, returning the new mode.
    pub fn toggle(&mut self) -> Self {
        *self = match self {
            Self::Normal => Self::Targeting,
            Self::Targeting => Self::Normal,
        };
        *self
    }

    pub fn set(&mut self, targeting: bool) {
        *self = if targeting {
            Self::Targeting
        } else {
            Self::Normal
        };
    }

    pub fn is_targeting(self) -> bool {
        self == Self::Targeting
    }

    pub fn click_intent(self) -> NoteClickIntent {
        match self {
            Self::Normal => NoteClickIntent::BeginDrag,
            Self::Targeting => NoteClickIntent::Delete,
        }
    }
}
