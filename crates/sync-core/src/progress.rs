use crate::model::{GlobalSyncJob, JobStatus, RepoSyncJob, SyncCounters};
use crate::tracker::TrackerState;
use serde::Serialize;

/// Single-indicator progress for callers that do not care about the job list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgressView {
    pub message: String,
    pub current_repo: Option<String>,
    pub current_repo_index: u64,
    pub total_repos: u64,
    #[serde(flatten)]
    pub counters: SyncCounters,
}

impl SyncProgressView {
    fn from_global(job: &GlobalSyncJob) -> Self {
        Self {
            message: job.progress.clone(),
            current_repo: job.current_repo.clone(),
            current_repo_index: job.current_repo_index,
            total_repos: job.total_repos,
            counters: job.counters,
        }
    }

    fn from_repo(job: &RepoSyncJob) -> Self {
        Self {
            message: job.progress.clone(),
            current_repo: Some(job.repository_name.clone()),
            current_repo_index: 1,
            total_repos: 1,
            counters: job.counters,
        }
    }
}

/// Point-in-time copy of everything the coordinator tracks.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorSnapshot {
    pub repo_jobs: Vec<RepoSyncJob>,
    pub global_job: Option<GlobalSyncJob>,
    pub is_widget_visible: bool,
    pub processing: Option<String>,
}

impl CoordinatorSnapshot {
    pub fn from_state(state: &TrackerState) -> Self {
        Self {
            repo_jobs: state.repo_jobs.clone(),
            global_job: state.global_job.clone(),
            is_widget_visible: state.widget_visible,
            processing: state.processing.clone(),
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.global_job
            .as_ref()
            .is_some_and(|job| job.status == JobStatus::Running)
            || self.repo_jobs.iter().any(|job| job.status.is_active())
    }

    pub fn progress(&self) -> Option<SyncProgressView> {
        if let Some(global) = self
            .global_job
            .as_ref()
            .filter(|job| job.status == JobStatus::Running)
        {
            return Some(SyncProgressView::from_global(global));
        }
        self.repo_jobs
            .iter()
            .find(|job| job.status == JobStatus::Running)
            .map(SyncProgressView::from_repo)
    }

    pub fn error(&self) -> Option<&str> {
        self.global_job
            .as_ref()
            .and_then(|job| job.error.as_deref())
            .into_iter()
            .chain(self.repo_jobs.iter().filter_map(|job| job.error.as_deref()))
            .find(|error| !error.is_empty())
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.repo_jobs
            .iter()
            .filter(|job| job.status == status)
            .count()
    }
}
