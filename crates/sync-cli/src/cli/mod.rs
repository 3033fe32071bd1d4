use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use sync_core::Coordinator;
use sync_core::config::{CoordinatorConfig, NotificationMode, default_config_path};
use sync_core::model::{GlobalSyncJob, JobStatus, RepoSyncJob, SyncType};
use sync_core::progress::CoordinatorSnapshot;
use sync_core::state::{JsonFileStore, StateStore};
use sync_core::tracker::TrackerState;
use sync_remote::auth;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod app;
mod args;
mod config_cmd;
mod jobs_cmd;
mod shared;
mod sync_cmd;
mod token_cmd;

use args::*;

use config_cmd::handle_config;
use jobs_cmd::{handle_clear_completed, handle_dismiss, handle_hide, handle_jobs};
use shared::{CliContext, follow_until_idle, open_coordinator};
use sync_cmd::{handle_repo, handle_sync, handle_watch};
use token_cmd::handle_token;

pub async fn run() -> anyhow::Result<()> {
    app::run().await
}
