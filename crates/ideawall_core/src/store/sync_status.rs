use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Cloud sync indicator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SyncStatus {
    Offline,
    Syncing,
    Synced,
    Error(String),
}

impl SyncStatus {
    /// Derives the indicator from identity presence and store sync flags.
    ///
    /// Precedence: no identity, then error, then in-flight writes or a
    /// missing first snapshot, then synced.
    pub fn derive(
        signed_in: bool,
        cloud_synced: bool,
        sync_error: Option<&str>,
        pending_writes: usize,
    ) -> Self {
        if !signed_in {
            return Self::Offline;
        }
        if let Some(message) = sync_error {
            return Self::Error(message.to_string());
        }
        if cloud_synced && pending_writes == 0 {
            Self::Synced
        } else {
            Self::Syncing
        }
    }

    /// Short user-facing label.
    pub fn label(&self) -> String {
        match self {
            Self::Offline => "Sign in to sync across devices".to_string(),
            Self::Syncing => "Syncing...".to_string(),
            Self::Synced => "Synced to cloud".to_string(),
            Self::Error(message) => format!("Sync error: {message}"),
        }
    }
}

impl Display for SyncStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => f.write_str("offline"),
            Self::Syncing => f.write_str("syncing"),
            Self::Synced => f.write_str("synced"),
            Self::Error(_) => f.write_str("error"),
        }
    }
}
