use super::*;
pub async fn run() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    info!(command = command_label(&cli.command), "Running command");

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let ctx = CliContext::load(config_path, cli.state)?;

    match cli.command {
        Commands::Config(args) => handle_config(args, &ctx),
        Commands::Token(args) => handle_token(args, &ctx),
        Commands::Sync(args) => handle_sync(args, &ctx).await,
        Commands::Repo(args) => handle_repo(args, &ctx).await,
        Commands::Watch => handle_watch(&ctx).await,
        Commands::Jobs(args) => handle_jobs(args, &ctx),
        Commands::Dismiss(args) => handle_dismiss(args, &ctx),
        Commands::ClearCompleted => handle_clear_completed(&ctx),
        Commands::Hide => handle_hide(&ctx),
    }
}
