//! Save/load for interrogation sessions.
//!
//! Sessions are serialized verbatim inside a versioned wrapper; a whole-file
//! version gate is the only schema policy.

use crate::state::SessionState;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// Saved interrogation progress for every live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedInterrogation {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created.
    pub saved_at: String,

    /// Complete per-suspect session records, verbatim.
    pub sessions: Vec<SessionState>,
}

impl SavedInterrogation {
    /// Wrap session snapshots for saving.
    pub fn new(sessions: Vec<SessionState>) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now().to_rfc3339(),
            sessions,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}
