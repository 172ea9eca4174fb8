//! Local persistence of timeline state.
//!
//! Goals, notification preferences and the alert collection are saved
//! together as one JSON document. Loading and saving happen only at explicit
//! call sites; nothing here watches the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use recon_core::goals::TimelineGoals;
use recon_core::preferences::NotificationPreferences;
use serde::{Deserialize, Serialize};

use crate::store::AlertStore;

/// Error type for state file failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the timeline engine keeps between restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineState {
    pub goals: TimelineGoals,
    pub preferences: NotificationPreferences,
    pub alerts: AlertStore,
}

/// A JSON file holding a [`TimelineState`].
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state, or defaults when the file does not exist yet.
    pub async fn load(&self) -> Result<TimelineState, PersistenceError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let state: TimelineState = serde_json::from_slice(&bytes)?;
                tracing::info!(
                    path = %self.path.display(),
                    alerts = state.alerts.len(),
                    "Loaded timeline state"
                );
                Ok(state)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No timeline state yet, using defaults");
                Ok(TimelineState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the state via a temp file and rename, so readers never see a
    /// half-written document.
    pub async fn save(&self, state: &TimelineState) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), alerts = state.alerts.len(), "Saved timeline state");
        Ok(())
    }
}
