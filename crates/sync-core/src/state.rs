use crate::model::{GlobalSyncJob, JobStatus, RepoSyncJob};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub repo_jobs: Vec<RepoSyncJob>,
    #[serde(default)]
    pub global_job: Option<GlobalSyncJob>,
    #[serde(default)]
    pub is_widget_visible: bool,
    #[serde(default)]
    pub last_notified: Option<serde_json::Value>,
}

impl PersistedState {
    pub fn new(
        repo_jobs: Vec<RepoSyncJob>,
        global_job: Option<GlobalSyncJob>,
        is_widget_visible: bool,
    ) -> Self {
        Self {
            repo_jobs,
            global_job,
            is_widget_visible,
            last_notified: None,
        }
    }

    /// Drops everything a restart should not resume: terminal repo jobs and
    /// a global job that is no longer running.
    pub fn pruned_for_restore(mut self) -> Self {
        self.repo_jobs.retain(|job| job.status.is_active());
        if self
            .global_job
            .as_ref()
            .is_some_and(|job| job.status != JobStatus::Running)
        {
            self.global_job = None;
        }
        let has_active = !self.repo_jobs.is_empty() || self.global_job.is_some();
        self.is_widget_visible = self.is_widget_visible && has_active;
        self.last_notified = None;
        self
    }
}

/// Durable home of the coordinator snapshot.
///
/// `load` returns `Ok(None)` when nothing was stored yet; an `Err` means the
/// stored snapshot could not be read or parsed.
pub trait StateStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<PersistedState>>;
    fn save(&self, state: &PersistedState) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("read sync state {}", self.path.display()))?;
        let state = serde_json::from_str(&data).context("parse sync state")?;
        Ok(Some(state))
    }

    fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create sync state directory")?;
        }
        let data = serde_json::to_string_pretty(state).context("serialize sync state")?;
        fs::write(&self.path, data)
            .with_context(|| format!("write sync state {}", self.path.display()))?;
        Ok(())
    }
}

/// In-process store; keeps every saved snapshot so callers can inspect the
/// full write history.
#[derive(Debug, Default)]
pub struct MemoryStore {
    initial: Option<PersistedState>,
    saved: Mutex<Vec<PersistedState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            initial: Some(state),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<PersistedState> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }

    pub fn latest(&self) -> Option<PersistedState> {
        self.saved
            .lock()
            .ok()
            .and_then(|saved| saved.last().cloned())
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<PersistedState>> {
        if let Some(latest) = self.latest() {
            return Ok(Some(latest));
        }
        Ok(self.initial.clone())
    }

    fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        saved.push(state.clone());
        Ok(())
    }
}
