use super::*;
use super::shared::print_snapshot;

pub(super) fn handle_jobs(args: JobsArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let state = ctx.load_tracker()?;
    let snapshot = CoordinatorSnapshot::from_state(&state);
    if args.json {
        let data = serde_json::to_string_pretty(&snapshot).context("serialize jobs")?;
        println!("{data}");
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

pub(super) fn handle_dismiss(args: DismissArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let mut state = ctx.load_tracker()?;
    if !state.dismiss_job(&args.job_id) {
        anyhow::bail!("no tracked job with id {}", args.job_id);
    }
    ctx.save_tracker(&state)?;
    info!(job_id = %args.job_id, "job dismissed");
    println!("Dismissed {}", args.job_id);
    Ok(())
}

pub(super) fn handle_clear_completed(ctx: &CliContext) -> anyhow::Result<()> {
    let mut state = ctx.load_tracker()?;
    let removed = state.clear_completed();
    if removed > 0 {
        ctx.save_tracker(&state)?;
    }
    println!("Removed {removed} finished job(s)");
    Ok(())
}

pub(super) fn handle_hide(ctx: &CliContext) -> anyhow::Result<()> {
    let mut state = ctx.load_tracker()?;
    state.dismiss_widget();
    ctx.save_tracker(&state)?;
    println!("Sync widget hidden");
    Ok(())
}
