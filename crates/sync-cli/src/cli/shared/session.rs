use super::*;
use sync_core::config::default_notification_dir;
use sync_core::notify::{DisabledNotifier, JournalNotifier, LogNotifier, Notifier};
use sync_remote::HttpSyncRunner;

/// Resolved config plus the path overrides given on the command line.
pub(in crate::cli) struct CliContext {
    pub(in crate::cli) config_path: PathBuf,
    pub(in crate::cli) config: CoordinatorConfig,
    state_override: Option<PathBuf>,
}

impl CliContext {
    pub(in crate::cli) fn load(
        config_path: PathBuf,
        state_override: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config = CoordinatorConfig::load(&config_path)
            .with_context(|| format!("load config {}", config_path.display()))?;
        Ok(Self {
            config_path,
            config,
            state_override,
        })
    }

    pub(in crate::cli) fn state_path(&self) -> anyhow::Result<PathBuf> {
        match &self.state_override {
            Some(path) => Ok(path.clone()),
            None => self.config.resolved_state_path(),
        }
    }

    pub(in crate::cli) fn store(&self) -> anyhow::Result<JsonFileStore> {
        Ok(JsonFileStore::new(self.state_path()?))
    }

    /// Persisted jobs as last written, without resuming any polling.
    pub(in crate::cli) fn load_tracker(&self) -> anyhow::Result<TrackerState> {
        let persisted = self.store()?.load()?.unwrap_or_default();
        Ok(TrackerState::from_persisted(persisted))
    }

    pub(in crate::cli) fn save_tracker(&self, state: &TrackerState) -> anyhow::Result<()> {
        self.store()?.save(&state.to_persisted())
    }
}

pub(in crate::cli) fn open_coordinator(ctx: &CliContext) -> anyhow::Result<Coordinator> {
    let token = auth::resolve_token(&ctx.config.base_url, ctx.config.token_env());
    if token.is_none() {
        info!(base_url = %ctx.config.base_url, "no API token configured; sending unauthenticated requests");
    }
    let runner = HttpSyncRunner::new(&ctx.config.base_url, token)?;
    let store = ctx.store()?;
    info!(
        endpoint = runner.endpoint(),
        state = %store.path().display(),
        "opening sync coordinator"
    );
    let notifier = build_notifier(ctx.config.notifications)?;
    Ok(Coordinator::start(
        Arc::new(runner),
        Arc::new(store),
        notifier,
        ctx.config.timings(),
    ))
}

fn build_notifier(mode: NotificationMode) -> anyhow::Result<Arc<dyn Notifier>> {
    Ok(match mode {
        NotificationMode::Journal => Arc::new(JournalNotifier::new(default_notification_dir()?)),
        NotificationMode::Log => Arc::new(LogNotifier),
        NotificationMode::Off => Arc::new(DisabledNotifier),
    })
}
