use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::coordinator::RecordingState;

/// Everything that survives a process restart.
///
/// The transcript is persisted in its rendered newline-delimited form so
/// other contexts (and the user) can read it as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub recording_state: RecordingState,
    #[serde(default)]
    pub transcript: String,
}

/// JSON-file key-value store for [`PersistedState`].
///
/// Owned exclusively by the coordinator; everyone else reads through the
/// coordinator's request interface (or the file itself, as the reconciliation
/// fallback when a best-effort notification was missed).
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted state, falling back to defaults when the file is
    /// missing or unreadable (a corrupt state file must not block startup).
    pub async fn load(&self) -> PersistedState {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No persisted state at {:?}, starting fresh", self.path);
                return PersistedState::default();
            }
            Err(e) => {
                warn!("Failed to read state file {:?}: {}", self.path, e);
                return PersistedState::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "Corrupt state file {:?} ({}), starting fresh",
                    self.path, e
                );
                PersistedState::default()
            }
        }
    }

    /// Persist state via temp-file-and-rename so a crash mid-write never
    /// leaves a truncated file behind
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create state dir {:?}", parent))?;
        }

        let json = serde_json::to_vec_pretty(state).context("Failed to serialize state")?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .with_context(|| format!("Failed to write state file {:?}", tmp_path))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to move state file into place at {:?}", self.path))?;

        Ok(())
    }
}
