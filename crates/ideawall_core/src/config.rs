//! Runtime configuration for the idea wall core.
//!
//! # Responsibility
//! - Describe storage, note-creation and logging settings.
//! - Load settings from an optional JSON file, filling gaps with defaults.
//!
//! # Invariants
//! - A returned `WallConfig` has passed `validate()`.
//! - A missing config file is not an error; it yields defaults.

use crate::logging::default_log_level;
use crate::model::color::NoteColor;
use crate::model::note::Size;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Key under which the note collection is stored locally.
pub const DEFAULT_STORAGE_KEY: &str = "idea-wall-notes";
/// Browser local storage budget the collection is held to.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_MAX_ROTATION_DEG: f64 = 5.0;
const MAX_ALLOWED_ROTATION_DEG: f64 = 45.0;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    pub storage: StorageConfig,
    pub notes: NoteDefaults,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding the local key-value store. `None` keeps data in
    /// memory for the lifetime of the process.
    pub db_path: Option<PathBuf>,
    pub storage_key: String,
    /// Serialized collection size limit. `None` disables the check.
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

/// Where new notes land when the caller gives no explicit position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    /// Always at the same spot, near the top-left corner.
    Fixed { x: f64, y: f64 },
    /// Uniformly inside the given rectangle.
    Scatter {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
}

impl Default for Placement {
    fn default() -> Self {
        Self::Fixed { x: 50.0, y: 50.0 }
    }
}

/// Defaults applied by the note factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteDefaults {
    pub size: Size,
    /// New notes get a random tilt in `[-max_rotation_deg, max_rotation_deg]`.
    pub max_rotation_deg: f64,
    pub placement: Placement,
    pub color: NoteColor,
}

impl Default for NoteDefaults {
    fn default() -> Self {
        Self {
            size: Size::default(),
            max_rotation_deg: DEFAULT_MAX_ROTATION_DEG,
            placement: Placement::default(),
            color: NoteColor::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. `None` logs to stderr.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

impl WallConfig {
    /// Loads config from `path`, returning defaults when the file is absent.
    ///
    /// # Errors
    /// - `Io` when the file exists but cannot be read.
    /// - `Parse` for malformed JSON.
    /// - `Invalid` when values violate constraints.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "event=config_load module=config status=ok source=defaults path={}",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        log::info!(
            "event=config_load module=config status=ok source=file path={}",
            path.display()
        );
        Ok(config)
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.storage_key cannot be empty".to_string(),
            ));
        }
        if self.storage.quota_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "storage.quota_bytes must be positive".to_string(),
            ));
        }
        self.notes.validate()
    }
}

impl NoteDefaults {
    pub fn validate(&self) -> ConfigResult<()> {
        let rotation = self.max_rotation_deg;
        if !rotation.is_finite() || !(0.0..=MAX_ALLOWED_ROTATION_DEG).contains(&rotation) {
            return Err(ConfigError::Invalid(format!(
                "notes.max_rotation_deg must be within 0..={MAX_ALLOWED_ROTATION_DEG}, got {rotation}"
            )));
        }
        if !(self.size.width.is_finite() && self.size.width > 0.0)
            || !(self.size.height.is_finite() && self.size.height > 0.0)
        {
            return Err(ConfigError::Invalid(
                "notes.size must have positive width and height".to_string(),
            ));
        }
        match self.placement {
            Placement::Fixed { x, y } if !(x.is_finite() && y.is_finite()) => Err(
                ConfigError::Invalid("notes.placement coordinates must be finite".to_string()),
            ),
            Placement::Scatter {
                min_x,
                min_y,
                max_x,
                max_y,
            } if !(min_x.is_finite()
                && min_y.is_finite()
                && max_x.is_finite()
                && max_y.is_finite()
                && min_x <= max_x
                && min_y <= max_y) =>
            {
                Err(ConfigError::Invalid(
                    "notes.placement scatter bounds must be finite with min <= max".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}
