use crate::model::{SyncCounters, SyncType};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

pub type RunnerFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// Remote job runner the coordinator drives.
///
/// An `Err` from either call is a transport failure; a rejection is an `Ok`
/// response carrying an error text.
pub trait SyncRunner: Send + Sync {
    fn start_sync<'a>(&'a self, request: &'a StartSyncRequest) -> RunnerFuture<'a, StartSyncResponse>;
    fn sync_status(&self) -> RunnerFuture<'_, SyncStatusResponse>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSyncRequest {
    #[serde(rename = "type")]
    pub sync_type: SyncType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<String>,
}

impl StartSyncRequest {
    pub fn repository(sync_type: SyncType, repository_id: impl Into<String>) -> Self {
        Self {
            sync_type,
            repository_id: Some(repository_id.into()),
        }
    }

    pub fn sweep(sync_type: SyncType) -> Self {
        Self {
            sync_type,
            repository_id: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSyncResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StartSyncResponse {
    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            message: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    Running,
    Completed,
    Failed,
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteStatus::Running)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncHistoryRecord {
    pub status: RemoteStatus,
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub progress_message: Option<String>,
    #[serde(default)]
    pub current_repo_name: Option<String>,
    #[serde(default)]
    pub current_repo_index: Option<u64>,
    #[serde(default)]
    pub total_repos: Option<u64>,
    #[serde(default)]
    pub commits_synced: u64,
    #[serde(default)]
    pub prs_synced: u64,
    #[serde(default)]
    pub contributors_synced: u64,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl SyncHistoryRecord {
    pub fn new(status: RemoteStatus, repository_id: Option<&str>) -> Self {
        Self {
            status,
            repository_id: repository_id.map(|value| value.to_string()),
            progress_message: None,
            current_repo_name: None,
            current_repo_index: None,
            total_repos: None,
            commits_synced: 0,
            prs_synced: 0,
            contributors_synced: 0,
            error_message: None,
        }
    }

    pub fn counters(&self) -> SyncCounters {
        SyncCounters::new(self.commits_synced, self.prs_synced, self.contributors_synced)
    }

    pub fn with_counters(mut self, counters: SyncCounters) -> Self {
        self.commits_synced = counters.commits_synced;
        self.prs_synced = counters.prs_synced;
        self.contributors_synced = counters.contributors_synced;
        self
    }
}

/// Job history as reported by the runner, newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    #[serde(default)]
    pub history: Vec<SyncHistoryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_omits_missing_repository() {
        let sweep = serde_json::to_value(StartSyncRequest::sweep(SyncType::Full)).unwrap();
        assert_eq!(sweep, serde_json::json!({"type": "full"}));
        let repo = serde_json::to_value(StartSyncRequest::repository(SyncType::Incremental, "7"))
            .unwrap();
        assert_eq!(
            repo,
            serde_json::json!({"type": "incremental", "repositoryId": "7"})
        );
    }

    #[test]
    fn status_response_tolerates_sparse_records() {
        let payload = r#"{
            "history": [
                {"status": "running", "repository_id": "7", "commits_synced": 3, "extra": true},
                {"status": "completed"}
            ]
        }"#;
        let parsed: SyncStatusResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.history.len(), 2);
        assert_eq!(parsed.history[0].repository_id.as_deref(), Some("7"));
        assert_eq!(parsed.history[0].counters(), SyncCounters::new(3, 0, 0));
        assert!(parsed.history[1].status.is_terminal());
        assert_eq!(parsed.history[1].repository_id, None);
    }
}
