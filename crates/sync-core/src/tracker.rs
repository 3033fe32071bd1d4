use crate::model::{GlobalSyncJob, JobStatus, RepoSyncJob, SyncCounters};
use crate::state::PersistedState;
use std::collections::HashSet;

/// Alert produced by a job reaching a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn completed(name: &str, counters: SyncCounters) -> Self {
        Self {
            title: "Sync completed".to_string(),
            body: format!(
                "{name}: {} commits, {} PRs, {} contributors",
                counters.commits_synced, counters.prs_synced, counters.contributors_synced
            ),
        }
    }

    pub fn failed(name: &str, error: &str) -> Self {
        Self {
            title: "Sync failed".to_string(),
            body: format!("{name}: {error}"),
        }
    }
}

/// In-memory job bookkeeping shared by the queue worker, the poller and the
/// public API.
#[derive(Debug, Default, Clone)]
pub struct TrackerState {
    pub repo_jobs: Vec<RepoSyncJob>,
    pub global_job: Option<GlobalSyncJob>,
    pub widget_visible: bool,
    pub processing: Option<String>,
    pub(crate) notified: HashSet<String>,
}

impl TrackerState {
    pub fn from_persisted(state: PersistedState) -> Self {
        Self {
            repo_jobs: state.repo_jobs,
            global_job: state.global_job,
            widget_visible: state.is_widget_visible,
            processing: None,
            notified: HashSet::new(),
        }
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState::new(
            self.repo_jobs.clone(),
            self.global_job.clone(),
            self.widget_visible,
        )
    }

    pub fn job(&self, job_id: &str) -> Option<&RepoSyncJob> {
        self.repo_jobs.iter().find(|job| job.id == job_id)
    }

    pub fn job_mut(&mut self, job_id: &str) -> Option<&mut RepoSyncJob> {
        self.repo_jobs.iter_mut().find(|job| job.id == job_id)
    }

    pub fn running_job_for_repo_mut(&mut self, repository_id: &str) -> Option<&mut RepoSyncJob> {
        self.repo_jobs
            .iter_mut()
            .find(|job| job.status == JobStatus::Running && job.repository_id == repository_id)
    }

    pub fn running_global_mut(&mut self) -> Option<&mut GlobalSyncJob> {
        self.global_job
            .as_mut()
            .filter(|job| job.status == JobStatus::Running)
    }

    /// Returns the notice only the first time it is requested for `job_id`.
    pub fn notice_once(&mut self, job_id: &str, notice: Notice) -> Option<Notice> {
        if self.notified.insert(job_id.to_string()) {
            Some(notice)
        } else {
            None
        }
    }

    pub fn was_notified(&self, job_id: &str) -> bool {
        self.notified.contains(job_id)
    }

    pub fn dismiss_widget(&mut self) {
        self.widget_visible = false;
        self.repo_jobs.retain(|job| job.status.is_active());
        if self
            .global_job
            .as_ref()
            .is_some_and(|job| job.status.is_terminal())
        {
            self.global_job = None;
        }
    }

    pub fn dismiss_job(&mut self, job_id: &str) -> bool {
        if self.global_job.as_ref().is_some_and(|job| job.id == job_id) {
            self.global_job = None;
            return true;
        }
        let before = self.repo_jobs.len();
        self.repo_jobs.retain(|job| job.id != job_id);
        self.repo_jobs.len() != before
    }

    pub fn clear_completed(&mut self) -> usize {
        let before = self.repo_jobs.len();
        self.repo_jobs.retain(|job| job.status.is_active());
        let mut removed = before - self.repo_jobs.len();
        if self
            .global_job
            .as_ref()
            .is_some_and(|job| job.status.is_terminal())
        {
            self.global_job = None;
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SyncType;
    use time::OffsetDateTime;

    fn job(name: &str, status: JobStatus) -> RepoSyncJob {
        let mut job = RepoSyncJob::queued(format!("repo-{name}"), name);
        job.status = status;
        job
    }

    #[test]
    fn dismiss_widget_keeps_active_jobs() {
        let mut global = GlobalSyncJob::running(SyncType::Full, OffsetDateTime::UNIX_EPOCH);
        global.status = JobStatus::Running;
        let mut state = TrackerState {
            repo_jobs: vec![
                job("alpha", JobStatus::Completed),
                job("beta", JobStatus::Running),
                job("gamma", JobStatus::Queued),
                job("delta", JobStatus::Failed),
            ],
            global_job: Some(global),
            widget_visible: true,
            ..TrackerState::default()
        };
        state.dismiss_widget();
        assert!(!state.widget_visible);
        assert_eq!(state.repo_jobs.len(), 2);
        assert!(state.global_job.is_some());
    }

    #[test]
    fn dismiss_job_leaves_others_untouched() {
        let done = job("alpha", JobStatus::Completed);
        let running = job("beta", JobStatus::Running);
        let done_id = done.id.clone();
        let running_id = running.id.clone();
        let mut state = TrackerState {
            repo_jobs: vec![done, running],
            ..TrackerState::default()
        };
        assert!(state.dismiss_job(&done_id));
        assert!(!state.dismiss_job(&done_id));
        assert_eq!(state.repo_jobs.len(), 1);
        assert_eq!(state.repo_jobs[0].id, running_id);
        assert_eq!(state.repo_jobs[0].status, JobStatus::Running);
    }

    #[test]
    fn clear_completed_counts_terminal_jobs() {
        let mut global = GlobalSyncJob::running(SyncType::Full, OffsetDateTime::UNIX_EPOCH);
        global.status = JobStatus::Failed;
        let mut state = TrackerState {
            repo_jobs: vec![
                job("alpha", JobStatus::Completed),
                job("beta", JobStatus::Failed),
                job("gamma", JobStatus::Queued),
            ],
            global_job: Some(global),
            ..TrackerState::default()
        };
        assert_eq!(state.clear_completed(), 3);
        assert_eq!(state.repo_jobs.len(), 1);
        assert!(state.global_job.is_none());
    }

    #[test]
    fn notice_once_deduplicates_by_job_id() {
        let mut state = TrackerState::default();
        let notice = Notice::failed("alpha", "boom");
        assert!(state.notice_once("job-1", notice.clone()).is_some());
        assert!(state.notice_once("job-1", notice.clone()).is_none());
        assert!(state.notice_once("job-2", notice).is_some());
        assert!(state.was_notified("job-1"));
    }
}
