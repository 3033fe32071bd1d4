use super::*;
pub(super) fn handle_config(args: ConfigArgs, ctx: &CliContext) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Init(args) => handle_init(args, ctx),
        ConfigCommands::Show => handle_show(ctx),
    }
}

fn handle_init(args: InitArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let config = apply_init(ctx.config.clone(), args)?;
    config.save(&ctx.config_path)?;
    info!(path = %ctx.config_path.display(), base_url = %config.base_url, "config saved");
    println!("Config saved to {}", ctx.config_path.display());
    Ok(())
}

pub(super) fn apply_init(
    mut config: CoordinatorConfig,
    args: InitArgs,
) -> anyhow::Result<CoordinatorConfig> {
    let base_url = args.base_url.trim().trim_end_matches('/').to_string();
    auth::account_for_base_url(&base_url).context("validate base url")?;
    config.base_url = base_url;
    if let Some(ms) = args.repo_poll_ms {
        config.repo_poll_interval_ms = ms;
    }
    if let Some(ms) = args.global_poll_ms {
        config.global_poll_interval_ms = ms;
    }
    if let Some(mode) = args.notifications {
        config.notifications = mode.into();
    }
    Ok(config)
}

fn handle_show(ctx: &CliContext) -> anyhow::Result<()> {
    let data = serde_json::to_string_pretty(&ctx.config).context("serialize config")?;
    println!("# {}", ctx.config_path.display());
    println!("{data}");
    Ok(())
}
