use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("job {job_id} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub job_id: String,
    pub from: JobStatus,
    pub to: JobStatus,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    #[default]
    Incremental,
    Full,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::Incremental => "incremental",
            SyncType::Full => "full",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncType::Incremental => "Incremental sync",
            SyncType::Full => "Full sync",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounters {
    pub commits_synced: u64,
    pub prs_synced: u64,
    pub contributors_synced: u64,
}

impl SyncCounters {
    pub fn new(commits_synced: u64, prs_synced: u64, contributors_synced: u64) -> Self {
        Self {
            commits_synced,
            prs_synced,
            contributors_synced,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSyncJob {
    pub id: String,
    pub repository_id: String,
    pub repository_name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: String,
    #[serde(flatten)]
    pub counters: SyncCounters,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl RepoSyncJob {
    pub fn queued(repository_id: impl Into<String>, repository_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            repository_id: repository_id.into(),
            repository_name: repository_name.into(),
            status: JobStatus::Queued,
            progress: "Queued".to_string(),
            counters: SyncCounters::default(),
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                job_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_running(&mut self, now: OffsetDateTime) -> Result<(), TransitionError> {
        self.transition(JobStatus::Running)?;
        self.progress = "Starting sync...".to_string();
        self.started_at = Some(now);
        Ok(())
    }

    pub fn mark_failed(&mut self, error: String, now: OffsetDateTime) -> Result<(), TransitionError> {
        self.transition(JobStatus::Failed)?;
        self.progress = "Sync failed".to_string();
        self.error = Some(error);
        self.completed_at = Some(now);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSyncJob {
    pub id: String,
    #[serde(rename = "type")]
    pub sync_type: SyncType,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub current_repo: Option<String>,
    #[serde(default)]
    pub current_repo_index: u64,
    #[serde(default)]
    pub total_repos: u64,
    #[serde(flatten)]
    pub counters: SyncCounters,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
}

impl GlobalSyncJob {
    pub fn running(sync_type: SyncType, now: OffsetDateTime) -> Self {
        Self {
            id: format!("global-{}", Uuid::new_v4()),
            sync_type,
            status: JobStatus::Running,
            progress: "Starting sync...".to_string(),
            current_repo: None,
            current_repo_index: 0,
            total_repos: 0,
            counters: SyncCounters::default(),
            error: None,
            started_at: Some(now),
            completed_at: None,
        }
    }

    pub fn transition(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                job_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: String, now: OffsetDateTime) -> Result<(), TransitionError> {
        self.transition(JobStatus::Failed)?;
        self.progress = "Sync failed".to_string();
        self.error = Some(error);
        self.completed_at = Some(now);
        Ok(())
    }
}

/// Why a job ended in `failed` without a failed record from the runner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    #[error("{0}")]
    Rejected(String),
    #[error("Network error")]
    Network,
    /// Polling stopped while the job was still running locally.
    #[error("Sync finished without a status record")]
    LostStatus,
}
