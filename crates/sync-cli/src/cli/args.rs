use super::*;
#[derive(Parser)]
#[command(author, version, about)]
pub(super) struct Cli {
    #[arg(long, global = true, help = "Path to the config file")]
    pub(super) config: Option<PathBuf>,
    #[arg(long, global = true, help = "Path to the persisted sync state")]
    pub(super) state: Option<PathBuf>,
    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(clap::Subcommand)]
pub(super) enum Commands {
    #[command(about = "Manage config")]
    Config(ConfigArgs),
    #[command(about = "Manage the API token")]
    Token(TokenArgs),
    #[command(about = "Start a global or single-repository sync")]
    Sync(SyncArgs),
    #[command(about = "Queue several repository syncs and run them in order")]
    Repo(RepoArgs),
    #[command(about = "Resume persisted sync work and wait until idle")]
    Watch,
    #[command(about = "List tracked sync jobs")]
    Jobs(JobsArgs),
    #[command(about = "Stop tracking a job")]
    Dismiss(DismissArgs),
    #[command(about = "Remove completed and failed jobs")]
    ClearCompleted,
    #[command(about = "Hide the sync widget and drop finished jobs")]
    Hide,
}

#[derive(Parser)]
pub(super) struct ConfigArgs {
    #[command(subcommand)]
    pub(super) command: ConfigCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum ConfigCommands {
    #[command(about = "Write the config file")]
    Init(InitArgs),
    #[command(about = "Print the effective config")]
    Show,
}

#[derive(Parser)]
pub(super) struct InitArgs {
    #[arg(long)]
    pub(super) base_url: String,
    #[arg(long)]
    pub(super) repo_poll_ms: Option<u64>,
    #[arg(long)]
    pub(super) global_poll_ms: Option<u64>,
    #[arg(long, value_enum)]
    pub(super) notifications: Option<NotificationValue>,
}

#[derive(Parser)]
pub(super) struct TokenArgs {
    #[command(subcommand)]
    pub(super) command: TokenCommands,
}

#[derive(clap::Subcommand)]
pub(super) enum TokenCommands {
    #[command(about = "Store the API token in the OS keyring")]
    Set(SetTokenArgs),
    #[command(about = "Remove the API token from the OS keyring")]
    Clear,
}

#[derive(Parser)]
pub(super) struct SetTokenArgs {
    #[arg(long)]
    pub(super) token: String,
}

#[derive(Parser)]
pub(super) struct SyncArgs {
    #[arg(long = "type", value_enum, default_value_t = SyncTypeValue::Incremental)]
    pub(super) sync_type: SyncTypeValue,
    #[arg(long)]
    pub(super) repo_id: Option<String>,
    #[arg(long, requires = "repo_id")]
    pub(super) repo_name: Option<String>,
    #[arg(long, help = "Return after starting instead of waiting for completion")]
    pub(super) detach: bool,
}

#[derive(Parser)]
pub(super) struct RepoArgs {
    #[arg(
        long = "repo",
        required = true,
        value_parser = parse_repo_spec,
        help = "Repository as ID or ID=NAME; repeat to queue several"
    )]
    pub(super) repos: Vec<RepoSpec>,
    #[arg(long)]
    pub(super) detach: bool,
}

#[derive(Parser)]
pub(super) struct JobsArgs {
    #[arg(long)]
    pub(super) json: bool,
}

#[derive(Parser)]
pub(super) struct DismissArgs {
    #[arg(long)]
    pub(super) job_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct RepoSpec {
    pub(super) id: String,
    pub(super) name: String,
}

pub(super) fn parse_repo_spec(value: &str) -> Result<RepoSpec, String> {
    let (id, name) = match value.split_once('=') {
        Some((id, name)) => (id.trim(), name.trim()),
        None => (value.trim(), value.trim()),
    };
    if id.is_empty() {
        return Err("repository id must not be empty".to_string());
    }
    let name = if name.is_empty() { id } else { name };
    Ok(RepoSpec {
        id: id.to_string(),
        name: name.to_string(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum SyncTypeValue {
    Incremental,
    Full,
}

impl From<SyncTypeValue> for SyncType {
    fn from(value: SyncTypeValue) -> Self {
        match value {
            SyncTypeValue::Incremental => SyncType::Incremental,
            SyncTypeValue::Full => SyncType::Full,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(super) enum NotificationValue {
    Journal,
    Log,
    Off,
}

impl From<NotificationValue> for NotificationMode {
    fn from(value: NotificationValue) -> Self {
        match value {
            NotificationValue::Journal => NotificationMode::Journal,
            NotificationValue::Log => NotificationMode::Log,
            NotificationValue::Off => NotificationMode::Off,
        }
    }
}

pub(super) fn command_label(command: &Commands) -> &'static str {
    match command {
        Commands::Config(_) => "config",
        Commands::Token(_) => "token",
        Commands::Sync(_) => "sync",
        Commands::Repo(_) => "repo",
        Commands::Watch => "watch",
        Commands::Jobs(_) => "jobs",
        Commands::Dismiss(_) => "dismiss",
        Commands::ClearCompleted => "clear-completed",
        Commands::Hide => "hide",
    }
}
