use crate::model::JobStatus;
use crate::runner::{RemoteStatus, SyncHistoryRecord, SyncStatusResponse};
use crate::tracker::{Notice, TrackerState};
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub still_running: bool,
    pub changed: bool,
    pub notices: Vec<Notice>,
}

/// Folds one status response into local job state.
///
/// Counters are copied from the remote record, never accumulated.
pub fn reconcile(
    state: &mut TrackerState,
    status: &SyncStatusResponse,
    now: OffsetDateTime,
) -> PollOutcome {
    if let Some(record) = status
        .history
        .iter()
        .find(|record| record.status == RemoteStatus::Running)
    {
        let changed = refresh_running(state, record);
        return PollOutcome {
            still_running: true,
            changed,
            notices: Vec::new(),
        };
    }

    let Some(latest) = status.history.first() else {
        return PollOutcome::default();
    };
    finish_from_record(state, latest, now)
}

fn refresh_running(state: &mut TrackerState, record: &SyncHistoryRecord) -> bool {
    let message = record.progress_message.clone().unwrap_or_default();
    match record.repository_id.as_deref() {
        Some(repository_id) => {
            let Some(job) = state.running_job_for_repo_mut(repository_id) else {
                debug!(repository_id, "running record has no tracked job");
                return false;
            };
            job.progress = message;
            job.counters = record.counters();
            true
        }
        None => {
            let Some(job) = state.running_global_mut() else {
                debug!("running sweep record has no tracked global job");
                return false;
            };
            job.progress = message;
            job.current_repo = record.current_repo_name.clone();
            job.current_repo_index = record.current_repo_index.unwrap_or_default();
            job.total_repos = record.total_repos.unwrap_or_default();
            job.counters = record.counters();
            true
        }
    }
}

fn finish_from_record(
    state: &mut TrackerState,
    record: &SyncHistoryRecord,
    now: OffsetDateTime,
) -> PollOutcome {
    let next = match record.status {
        RemoteStatus::Completed => JobStatus::Completed,
        RemoteStatus::Failed => JobStatus::Failed,
        RemoteStatus::Running => return PollOutcome::default(),
    };
    let error = record
        .error_message
        .clone()
        .filter(|_| next == JobStatus::Failed);

    let finished = match record.repository_id.as_deref() {
        Some(repository_id) => state
            .running_job_for_repo_mut(repository_id)
            .and_then(|job| {
                job.transition(next).ok()?;
                job.counters = record.counters();
                job.error = error.clone();
                job.progress = final_message(record, next);
                job.completed_at = Some(now);
                Some((job.id.clone(), job.repository_name.clone(), job.counters))
            }),
        None => state.running_global_mut().and_then(|job| {
            job.transition(next).ok()?;
            job.counters = record.counters();
            job.error = error.clone();
            job.progress = final_message(record, next);
            job.current_repo = None;
            job.completed_at = Some(now);
            Some((job.id.clone(), job.sync_type.label().to_string(), job.counters))
        }),
    };

    let Some((job_id, name, counters)) = finished else {
        return PollOutcome::default();
    };
    debug!(job_id = %job_id, status = %next, "job reached terminal state");
    let notice = match next {
        JobStatus::Failed => Notice::failed(&name, error.as_deref().unwrap_or("Sync failed")),
        _ => Notice::completed(&name, counters),
    };
    PollOutcome {
        still_running: false,
        changed: true,
        notices: state.notice_once(&job_id, notice).into_iter().collect(),
    }
}

fn final_message(record: &SyncHistoryRecord, status: JobStatus) -> String {
    match record.progress_message.as_deref() {
        Some(message) if !message.is_empty() => message.to_string(),
        _ if status == JobStatus::Failed => "Sync failed".to_string(),
        _ => "Sync completed".to_string(),
    }
}
