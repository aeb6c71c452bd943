use crate::domain::PersistedState;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// JSON file holding the [`PersistedState`] of one monitored account.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_account(dir: impl AsRef<Path>, handle: &str) -> Self {
        Self::new(dir.as_ref().join(format!(".last_{handle}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or corrupt file yields the default state.
    pub async fn load(&self) -> PersistedState {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no state file; starting fresh");
                return PersistedState::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file unreadable; using defaults");
                return PersistedState::default();
            }
        };

        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(doc) => PersistedState::merge_from_json(&doc),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state file is not valid JSON; using defaults");
                PersistedState::default()
            }
        }
    }

    /// Writes a sibling temp file and renames it over the target.
    pub async fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        let body = serde_json::to_vec(state).context("serialize state failed")?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create state dir {} failed", dir.display()))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("write {} failed", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename {} into place failed", tmp.display()))?;

        Ok(())
    }
}
