use crate::config::PollTimings;
use crate::model::{GlobalSyncJob, JobStatus, RepoSyncJob, SyncFailure, SyncType};
use crate::notify::{NotificationGate, Notifier};
use crate::poller::reconcile;
use crate::progress::{CoordinatorSnapshot, SyncProgressView};
use crate::runner::{StartSyncRequest, SyncRunner};
use crate::scheduler::TaskScheduler;
use crate::state::{PersistedState, StateStore};
use crate::tracker::{Notice, TrackerState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One unit of work for the queue worker.
#[derive(Clone, Debug)]
struct QueueItem {
    job_id: String,
    repository_id: String,
    sync_type: SyncType,
    resume: bool,
}

enum Begin {
    Start,
    Resume,
    Skip,
}

/// Drives sync jobs against a [`SyncRunner`].
///
/// Per-repository jobs go through a single worker task, so at most one of
/// them is ever in flight. Every state change is persisted through the
/// [`StateStore`] and published to [`Coordinator::subscribe`] receivers.
pub struct Coordinator {
    shared: Arc<Shared>,
    scheduler: TaskScheduler,
    queue: mpsc::UnboundedSender<QueueItem>,
}

struct Shared {
    state: Mutex<TrackerState>,
    runner: Arc<dyn SyncRunner>,
    store: Arc<dyn StateStore>,
    notifications: NotificationGate,
    timings: PollTimings,
    updates: watch::Sender<CoordinatorSnapshot>,
}

impl Coordinator {
    /// Restores persisted work and spawns the background tasks. Must be
    /// called from within a tokio runtime.
    pub fn start(
        runner: Arc<dyn SyncRunner>,
        store: Arc<dyn StateStore>,
        notifier: Arc<dyn Notifier>,
        timings: PollTimings,
    ) -> Self {
        let restored = match store.load() {
            Ok(Some(persisted)) => persisted.pruned_for_restore(),
            Ok(None) => PersistedState::default(),
            Err(err) => {
                warn!(error = %err, "failed to load sync state; starting empty");
                PersistedState::default()
            }
        };
        let state = TrackerState::from_persisted(restored);
        let (updates, _) = watch::channel(CoordinatorSnapshot::from_state(&state));
        let notifications = NotificationGate::new(notifier);
        notifications.request_if_undecided();

        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            runner,
            store,
            notifications,
            timings,
            updates,
        });
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            shared,
            scheduler: TaskScheduler::new(),
            queue,
        };
        coordinator.resume_restored();
        let worker = Arc::clone(&coordinator.shared);
        coordinator
            .scheduler
            .spawn("queue-worker", run_queue(worker, queue_rx));
        coordinator
    }

    fn resume_restored(&self) {
        let (items, global_id) = self.shared.mutate(|state| {
            let mut items: Vec<QueueItem> = state
                .repo_jobs
                .iter()
                .filter(|job| job.status == JobStatus::Running)
                .map(|job| QueueItem {
                    job_id: job.id.clone(),
                    repository_id: job.repository_id.clone(),
                    sync_type: SyncType::Incremental,
                    resume: true,
                })
                .collect();
            items.extend(
                state
                    .repo_jobs
                    .iter()
                    .filter(|job| job.status == JobStatus::Queued)
                    .map(|job| QueueItem {
                        job_id: job.id.clone(),
                        repository_id: job.repository_id.clone(),
                        sync_type: SyncType::Incremental,
                        resume: false,
                    }),
            );
            let global_id = state
                .global_job
                .as_ref()
                .filter(|job| job.status == JobStatus::Running)
                .map(|job| job.id.clone());
            (items, global_id)
        });
        if !items.is_empty() || global_id.is_some() {
            info!(
                repo_jobs = items.len(),
                global = global_id.is_some(),
                "resuming persisted sync work"
            );
        }
        for item in items {
            self.push(item);
        }
        if let Some(job_id) = global_id {
            self.spawn_global_poll(job_id);
        }
    }

    /// Adds a queued job for the repository. Returns the new job id without
    /// waiting for the job to start.
    pub fn enqueue(&self, repository_id: &str, repository_name: &str) -> String {
        self.enqueue_typed(SyncType::Incremental, repository_id, repository_name)
    }

    fn enqueue_typed(
        &self,
        sync_type: SyncType,
        repository_id: &str,
        repository_name: &str,
    ) -> String {
        let job = RepoSyncJob::queued(repository_id, repository_name);
        let item = QueueItem {
            job_id: job.id.clone(),
            repository_id: job.repository_id.clone(),
            sync_type,
            resume: false,
        };
        info!(
            job_id = %job.id,
            repository_id,
            repository_name,
            sync_type = %sync_type,
            "enqueued repository sync"
        );
        self.shared.mutate(|state| state.repo_jobs.push(job));
        self.push(item.clone());
        item.job_id
    }

    fn push(&self, item: QueueItem) {
        if self.queue.send(item).is_err() {
            warn!("queue worker stopped; job will stay queued");
        }
    }

    pub fn start_repo_sync(&self, repository_id: &str, repository_name: &str) -> String {
        self.start_repo_sync_typed(SyncType::Incremental, repository_id, repository_name)
    }

    fn start_repo_sync_typed(
        &self,
        sync_type: SyncType,
        repository_id: &str,
        repository_name: &str,
    ) -> String {
        let job_id = self.enqueue_typed(sync_type, repository_id, repository_name);
        self.shared.mutate(|state| state.widget_visible = true);
        job_id
    }

    /// Starts a repository job when `repository_id` is given, otherwise a
    /// global sweep. Returns the id of the tracked job.
    pub async fn start_sync(
        &self,
        sync_type: SyncType,
        repository_id: Option<&str>,
        repository_name: Option<&str>,
    ) -> String {
        if let Some(repository_id) = repository_id {
            let name = repository_name.unwrap_or(repository_id);
            return self.start_repo_sync_typed(sync_type, repository_id, name);
        }

        let job = GlobalSyncJob::running(sync_type, now());
        let job_id = job.id.clone();
        info!(job_id = %job_id, sync_type = %sync_type, "starting global sync");
        self.shared.mutate(|state| {
            state.global_job = Some(job);
            state.widget_visible = true;
        });

        let request = StartSyncRequest::sweep(sync_type);
        let failure = match self.shared.runner.start_sync(&request).await {
            Ok(response) => response.error.map(SyncFailure::Rejected),
            Err(err) => {
                warn!(error = %err, job_id = %job_id, "global sync start request failed");
                Some(SyncFailure::Network)
            }
        };
        match failure {
            Some(failure) => self.shared.fail_global(&job_id, &failure),
            None => self.spawn_global_poll(job_id.clone()),
        }
        job_id
    }

    fn spawn_global_poll(&self, job_id: String) {
        let shared = Arc::clone(&self.shared);
        self.scheduler
            .spawn("global-poll", run_global_poll(shared, job_id));
    }

    /// Queries the runner once and folds the answer into local state.
    /// Returns whether the runner still reports work in progress.
    pub async fn poll_sync_progress(&self) -> bool {
        self.shared.poll_sync_progress().await
    }

    pub fn dismiss_widget(&self) {
        self.shared.mutate(TrackerState::dismiss_widget);
    }

    pub fn dismiss_job(&self, job_id: &str) -> bool {
        let removed = self.shared.mutate(|state| state.dismiss_job(job_id));
        debug!(job_id, removed, "dismissed job");
        removed
    }

    pub fn clear_completed_jobs(&self) -> usize {
        self.shared.mutate(TrackerState::clear_completed)
    }

    pub fn snapshot(&self) -> CoordinatorSnapshot {
        self.shared.updates.borrow().clone()
    }

    pub fn progress(&self) -> Option<SyncProgressView> {
        self.snapshot().progress()
    }

    pub fn error(&self) -> Option<String> {
        self.snapshot().error().map(|error| error.to_string())
    }

    pub fn is_syncing(&self) -> bool {
        self.snapshot().is_syncing()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Resolves once nothing is queued or running.
    pub async fn wait_idle(&self) {
        let mut updates = self.subscribe();
        loop {
            let syncing = updates.borrow_and_update().is_syncing();
            if !syncing || updates.changed().await.is_err() {
                return;
            }
        }
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut TrackerState) -> R) -> R {
        let mut state = self.lock();
        let result = apply(&mut state);
        self.commit(&state);
        result
    }

    /// Persists and publishes `state`. Called with the state lock held so
    /// saves land in mutation order. The store write blocks the worker; state
    /// snapshots are a few kilobytes, so it stays inline rather than going
    /// through `spawn_blocking`, which would give up that ordering.
    fn commit(&self, state: &TrackerState) {
        if let Err(err) = self.store.save(&state.to_persisted()) {
            warn!(error = %err, "failed to persist sync state");
        }
        self.updates
            .send_replace(CoordinatorSnapshot::from_state(state));
    }

    fn deliver(&self, notices: Vec<Notice>) {
        for notice in notices {
            self.notifications.send(&notice.title, &notice.body);
        }
    }

    async fn poll_sync_progress(&self) -> bool {
        let status = match self.runner.sync_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "sync status request failed");
                return true;
            }
        };
        let outcome = {
            let mut state = self.lock();
            let outcome = reconcile(&mut state, &status, now());
            if outcome.changed {
                self.commit(&state);
            }
            outcome
        };
        debug!(still_running = outcome.still_running, "polled sync status");
        let still_running = outcome.still_running;
        self.deliver(outcome.notices);
        still_running
    }

    async fn process(&self, item: QueueItem) {
        let begin = self.mutate(|state| {
            let Some(job) = state.job_mut(&item.job_id) else {
                return Begin::Skip;
            };
            let begin = match (item.resume, job.status) {
                (false, JobStatus::Queued) => match job.mark_running(now()) {
                    Ok(()) => Begin::Start,
                    Err(_) => Begin::Skip,
                },
                (true, JobStatus::Running) => Begin::Resume,
                _ => Begin::Skip,
            };
            if !matches!(begin, Begin::Skip) {
                state.processing = Some(item.job_id.clone());
            }
            begin
        });

        match begin {
            Begin::Skip => {
                debug!(job_id = %item.job_id, "queue item no longer pending; skipped");
                return;
            }
            Begin::Resume => {
                info!(job_id = %item.job_id, repository_id = %item.repository_id, "resuming repository sync");
            }
            Begin::Start => {
                info!(job_id = %item.job_id, repository_id = %item.repository_id, "starting repository sync");
                let request = StartSyncRequest::repository(item.sync_type, &item.repository_id);
                let failure = match self.runner.start_sync(&request).await {
                    Ok(response) => response.error.map(SyncFailure::Rejected),
                    Err(err) => {
                        warn!(
                            error = %err,
                            job_id = %item.job_id,
                            "repository sync start request failed"
                        );
                        Some(SyncFailure::Network)
                    }
                };
                if let Some(failure) = failure {
                    self.fail_repo_job(&item.job_id, &failure.to_string());
                    return;
                }
            }
        }

        loop {
            tokio::time::sleep(self.timings.repo_poll_interval).await;
            if !self.poll_sync_progress().await {
                break;
            }
        }
        self.finish_processing(&item.job_id);
    }

    fn fail_repo_job(&self, job_id: &str, error: &str) {
        let notice = self.mutate(|state| {
            state.processing = None;
            let job = state.job_mut(job_id)?;
            job.mark_failed(error.to_string(), now()).ok()?;
            let notice = Notice::failed(&job.repository_name, error);
            state.notice_once(job_id, notice)
        });
        warn!(job_id, error, "repository sync failed");
        self.deliver(notice.into_iter().collect());
    }

    fn fail_global(&self, job_id: &str, failure: &SyncFailure) {
        let error = failure.to_string();
        let notice = self.mutate(|state| {
            let job = state.global_job.as_mut().filter(|job| job.id == job_id)?;
            job.mark_failed(error.clone(), now()).ok()?;
            let notice = Notice::failed(job.sync_type.label(), &error);
            state.notice_once(job_id, notice)
        });
        warn!(job_id, error = %error, "global sync failed");
        self.deliver(notice.into_iter().collect());
    }

    /// Releases the worker after the poll loop ends. A job the runner never
    /// reported a terminal record for is failed so the next one can start.
    fn finish_processing(&self, job_id: &str) {
        let still_running = self.lock().job(job_id).map(|job| job.status) == Some(JobStatus::Running);
        if still_running {
            self.fail_repo_job(job_id, &SyncFailure::LostStatus.to_string());
            return;
        }
        self.mutate(|state| state.processing = None);
        debug!(job_id, "queue worker released");
    }
}

async fn run_queue(shared: Arc<Shared>, mut queue: mpsc::UnboundedReceiver<QueueItem>) {
    while let Some(item) = queue.recv().await {
        shared.process(item).await;
    }
    debug!("queue worker exiting");
}

async fn run_global_poll(shared: Arc<Shared>, job_id: String) {
    let period = shared.timings.global_poll_interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if !shared.poll_sync_progress().await {
            break;
        }
    }
    let still_running = shared
        .lock()
        .global_job
        .as_ref()
        .is_some_and(|job| job.id == job_id && job.status == JobStatus::Running);
    if still_running {
        shared.fail_global(&job_id, &SyncFailure::LostStatus);
    }
    debug!(job_id = %job_id, "global poll loop finished");
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}
