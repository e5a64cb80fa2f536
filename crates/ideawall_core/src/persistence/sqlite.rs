//! SQLite-backed key-value implementation of `NotePersistence`.
//!
//! # Invariants
//! - The collection lives under exactly one key as a JSON array.
//! - A rejected write leaves the previously stored value untouched.
//! - Hydration never returns two notes with the same id.

use super::record::StoredNote;
use super::{NotePersistence, PersistError, PersistResult};
use crate::config::StorageConfig;
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::note::{Note, NoteId};
use chrono::Utc;
use log::{debug, error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;

pub struct SqliteNoteStorage {
    conn: Connection,
    key: String,
    quota_bytes: Option<usize>,
}

impl SqliteNoteStorage {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
            quota_bytes: None,
        }
    }

    /// Opens the store described by `config` (file or in-memory).
    pub fn open(config: &StorageConfig) -> DbResult<Self> {
        let conn = match &config.db_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        Ok(Self::new(conn, config.storage_key.clone()).with_quota(config.quota_bytes))
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serializes and stores the whole collection.
    ///
    /// # Errors
    /// - `QuotaExceeded` when the payload is larger than the quota.
    /// - `Serialize` / `Db` on encoding or SQLite failure.
    pub fn try_save(&self, notes: &[Note]) -> PersistResult<()> {
        let payload = serde_json::to_string(notes).map_err(PersistError::Serialize)?;
        if let Some(quota) = self.quota_bytes {
            if payload.len() > quota {
                return Err(PersistError::QuotaExceeded {
                    needed: payload.len(),
                    quota,
                });
            }
        }
        self.write_raw(&payload)
    }

    /// Reads and converts the stored collection.
    ///
    /// Absent key yields an empty list. Elements that fail conversion are
    /// skipped; later duplicates of an id are dropped.
    ///
    /// # Errors
    /// - `Corrupt` when the value is not a JSON array.
    /// - `Db` on SQLite failure.
    pub fn try_load(&self) -> PersistResult<Vec<Note>> {
        let Some(raw) = self.read_raw()? else {
            return Ok(Vec::new());
        };

        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|err| PersistError::Corrupt(err.to_string()))?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(PersistError::Corrupt(format!(
                    "expected array, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut seen: HashSet<NoteId> = HashSet::with_capacity(items.len());
        let mut notes = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let converted = serde_json::from_value::<StoredNote>(item)
                .map_err(|err| err.to_string())
                .and_then(|record| record.into_note().map_err(|err| err.to_string()));
            match converted {
                Ok(note) if seen.insert(note.id) => notes.push(note),
                Ok(note) => warn!(
                    "event=notes_load module=persistence status=skip reason=duplicate_id index={} note_id={}",
                    index, note.id
                ),
                Err(err) => warn!(
                    "event=notes_load module=persistence status=skip reason=invalid_record index={} error={}",
                    index, err
                ),
            }
        }
        Ok(notes)
    }

    /// Returns the raw stored value for this storage key.
    pub fn read_raw(&self) -> PersistResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrites the raw stored value for this storage key.
    pub fn write_raw(&self, value: &str) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at;",
            params![self.key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    /// Removes the stored collection.
    pub fn clear(&self) -> PersistResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", params![self.key])?;
        Ok(())
    }
}

impl NotePersistence for SqliteNoteStorage {
    fn save(&self, notes: &[Note]) {
        match self.try_save(notes) {
            Ok(()) => debug!(
                "event=notes_save module=persistence status=ok count={}",
                notes.len()
            ),
            Err(err) => error!(
                "event=notes_save module=persistence status=error count={} error={}",
                notes.len(),
                err
            ),
        }
    }

    fn load(&self) -> Vec<Note> {
        match self.try_load() {
            Ok(notes) => {
                info!(
                    "event=notes_load module=persistence status=ok count={}",
                    notes.len()
                );
                notes
            }
            Err(err) => {
                error!(
                    "event=notes_load module=persistence status=error error={}",
                    err
                );
                Vec::new()
            }
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
