use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOKEN_ENV: &str = "BACKOFFICE_SYNC_TOKEN";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    #[default]
    Journal,
    Log,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub base_url: String,
    pub repo_poll_interval_ms: u64,
    pub global_poll_interval_ms: u64,
    pub notifications: NotificationMode,
    pub state_path: Option<PathBuf>,
    pub token_env: Option<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            repo_poll_interval_ms: 2_000,
            global_poll_interval_ms: 3_000,
            notifications: NotificationMode::Journal,
            state_path: None,
            token_env: None,
        }
    }
}

impl CoordinatorConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).context("read config")?;
        let config = serde_json::from_str(&data).context("parse config")?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create config directory")?;
        }
        let data = serde_json::to_string_pretty(self).context("serialize config")?;
        fs::write(path, data).context("write config")?;
        Ok(())
    }

    pub fn timings(&self) -> PollTimings {
        PollTimings {
            repo_poll_interval: Duration::from_millis(self.repo_poll_interval_ms.max(1)),
            global_poll_interval: Duration::from_millis(self.global_poll_interval_ms.max(1)),
        }
    }

    pub fn token_env(&self) -> &str {
        self.token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV)
    }

    pub fn resolved_state_path(&self) -> anyhow::Result<PathBuf> {
        match &self.state_path {
            Some(path) => Ok(path.clone()),
            None => default_state_path(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollTimings {
    pub repo_poll_interval: Duration,
    pub global_poll_interval: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        CoordinatorConfig::default().timings()
    }
}

fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("com", "backoffice-sync", "backoffice-sync").context("resolve project dirs")
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.json"))
}

pub fn default_state_path() -> anyhow::Result<PathBuf> {
    let project = project_dirs()?;
    let dir = project.state_dir().unwrap_or(project.data_local_dir());
    Ok(dir.join("sync-state.json"))
}

pub fn default_notification_dir() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join("notifications"))
}
