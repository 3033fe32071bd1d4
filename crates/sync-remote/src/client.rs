use crate::http::{send_with_retry, send_with_retry_allow_statuses};
use anyhow::Context;
use reqwest::{Client, RequestBuilder, StatusCode};
use sync_core::runner::{
    RunnerFuture, StartSyncRequest, StartSyncResponse, SyncRunner, SyncStatusResponse,
};
use tracing::debug;

const SYNC_PATH: &str = "/api/github/sync";
const USER_AGENT: &str = "backoffice-sync";

/// Statuses whose body may carry a rejection reason from the runner.
const REJECTION_STATUSES: &[StatusCode] = &[
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::CONFLICT,
    StatusCode::UNPROCESSABLE_ENTITY,
    StatusCode::INTERNAL_SERVER_ERROR,
];

/// Runner backed by the backoffice HTTP API.
pub struct HttpSyncRunner {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpSyncRunner {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}{SYNC_PATH}", base_url.trim_end_matches('/')),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_start(&self, request: &StartSyncRequest) -> anyhow::Result<StartSyncResponse> {
        let response = send_with_retry_allow_statuses(
            || {
                Ok(self.authorized(
                    self.client
                        .post(&self.endpoint)
                        .header("Accept", "application/json")
                        .json(request),
                ))
            },
            REJECTION_STATUSES,
        )
        .await?;
        let status = response.status();
        let body = response.bytes().await.context("read start sync response")?;
        let parsed = serde_json::from_slice::<StartSyncResponse>(&body);
        if status.is_success() {
            return Ok(match parsed {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(error = %err, status = %status, "start sync body is not json; treating as accepted");
                    StartSyncResponse::accepted()
                }
            });
        }
        match parsed {
            Ok(parsed) if parsed.error.is_some() => Ok(parsed),
            _ => anyhow::bail!("start sync failed with status {status}"),
        }
    }

    async fn get_status(&self) -> anyhow::Result<SyncStatusResponse> {
        let response = send_with_retry(|| {
            Ok(self.authorized(
                self.client
                    .get(&self.endpoint)
                    .header("Accept", "application/json"),
            ))
        })
        .await?;
        response
            .json::<SyncStatusResponse>()
            .await
            .context("decode sync status")
    }
}

impl SyncRunner for HttpSyncRunner {
    fn start_sync<'a>(
        &'a self,
        request: &'a StartSyncRequest,
    ) -> RunnerFuture<'a, StartSyncResponse> {
        Box::pin(self.post_start(request))
    }

    fn sync_status(&self) -> RunnerFuture<'_, SyncStatusResponse> {
        Box::pin(self.get_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sync_core::model::{SyncCounters, SyncType};
    use sync_core::runner::RemoteStatus;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn start_posts_type_and_repository() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .and(body_json(json!({"type": "full", "repositoryId": "42"})))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "message": "Sync started"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let runner = HttpSyncRunner::new(&server.uri(), Some("secret".into())).unwrap();
        let response = runner
            .start_sync(&StartSyncRequest::repository(SyncType::Full, "42"))
            .await
            .unwrap();
        assert_eq!(response.error, None);
        assert_eq!(response.message.as_deref(), Some("Sync started"));
    }

    #[tokio::test]
    async fn error_body_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "Sync already running"})),
            )
            .mount(&server)
            .await;

        let runner = HttpSyncRunner::new(&server.uri(), None).unwrap();
        let response = runner
            .start_sync(&StartSyncRequest::sweep(SyncType::Incremental))
            .await
            .unwrap();
        assert_eq!(response.error.as_deref(), Some("Sync already running"));
    }

    #[tokio::test]
    async fn non_success_with_error_field_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"error": "Repository busy"})),
            )
            .mount(&server)
            .await;

        let runner = HttpSyncRunner::new(&format!("{}/", server.uri()), None).unwrap();
        let response = runner
            .start_sync(&StartSyncRequest::repository(SyncType::Incremental, "1"))
            .await
            .unwrap();
        assert_eq!(response.error.as_deref(), Some("Repository busy"));
    }

    #[tokio::test]
    async fn non_success_without_error_field_is_a_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let runner = HttpSyncRunner::new(&server.uri(), None).unwrap();
        let result = runner
            .start_sync(&StartSyncRequest::repository(SyncType::Incremental, "1"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn status_decodes_history_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "history": [
                    {
                        "status": "running",
                        "repository_id": "42",
                        "progress_message": "Fetching commits",
                        "commits_synced": 12
                    },
                    {
                        "status": "failed",
                        "error_message": "rate limited",
                        "total_repos": 3
                    }
                ]
            })))
            .mount(&server)
            .await;

        let runner = HttpSyncRunner::new(&server.uri(), None).unwrap();
        let status = runner.sync_status().await.unwrap();
        assert_eq!(status.history.len(), 2);
        let newest = &status.history[0];
        assert_eq!(newest.status, RemoteStatus::Running);
        assert_eq!(newest.repository_id.as_deref(), Some("42"));
        assert_eq!(newest.counters(), SyncCounters::new(12, 0, 0));
        assert_eq!(status.history[1].error_message.as_deref(), Some("rate limited"));
        assert_eq!(status.history[1].total_repos, Some(3));
    }

    #[tokio::test]
    async fn throttled_status_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SYNC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"history": []})))
            .mount(&server)
            .await;

        let runner = HttpSyncRunner::new(&server.uri(), None).unwrap();
        let status = runner.sync_status().await.unwrap();
        assert!(status.history.is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let runner = HttpSyncRunner::new("http://127.0.0.1:9", None).unwrap();
        assert!(runner.sync_status().await.is_err());
    }
}
