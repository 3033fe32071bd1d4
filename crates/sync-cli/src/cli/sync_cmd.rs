use super::*;
use super::shared::job_outcome;

pub(super) async fn handle_sync(args: SyncArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let coordinator = open_coordinator(ctx)?;
    let sync_type: SyncType = args.sync_type.into();
    let job_id = coordinator
        .start_sync(sync_type, args.repo_id.as_deref(), args.repo_name.as_deref())
        .await;
    match args.repo_id.as_deref() {
        Some(repo_id) => println!("{} queued for {repo_id} ({job_id})", sync_type.label()),
        None => println!("{} started ({job_id})", sync_type.label()),
    }
    finish(coordinator, vec![job_id], args.detach).await
}

pub(super) async fn handle_repo(args: RepoArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let coordinator = open_coordinator(ctx)?;
    let mut job_ids = Vec::with_capacity(args.repos.len());
    for repo in &args.repos {
        let job_id = coordinator.start_repo_sync(&repo.id, &repo.name);
        println!("Queued {} ({job_id})", repo.name);
        job_ids.push(job_id);
    }
    finish(coordinator, job_ids, args.detach).await
}

pub(super) async fn handle_watch(ctx: &CliContext) -> anyhow::Result<()> {
    let coordinator = open_coordinator(ctx)?;
    let snapshot = coordinator.snapshot();
    if !snapshot.is_syncing() {
        println!("No sync in progress");
        coordinator.shutdown();
        return Ok(());
    }
    let job_ids = active_job_ids(&snapshot);
    println!("Resuming {} tracked job(s)", job_ids.len());
    finish(coordinator, job_ids, false).await
}

pub(super) fn active_job_ids(snapshot: &CoordinatorSnapshot) -> Vec<String> {
    snapshot
        .global_job
        .iter()
        .filter(|job| job.status.is_active())
        .map(|job| job.id.clone())
        .chain(
            snapshot
                .repo_jobs
                .iter()
                .filter(|job| job.status.is_active())
                .map(|job| job.id.clone()),
        )
        .collect()
}

async fn finish(
    coordinator: Coordinator,
    job_ids: Vec<String>,
    detach: bool,
) -> anyhow::Result<()> {
    if detach {
        coordinator.shutdown();
        println!("Detached; run `backoffice-sync watch` to follow progress");
        return Ok(());
    }
    let snapshot = follow_until_idle(&coordinator).await;
    coordinator.shutdown();
    report_outcomes(&snapshot, &job_ids)
}

pub(super) fn report_outcomes(
    snapshot: &CoordinatorSnapshot,
    job_ids: &[String],
) -> anyhow::Result<()> {
    let mut failures = Vec::new();
    for job_id in job_ids {
        match job_outcome(snapshot, job_id) {
            Some((JobStatus::Completed, _)) => println!("{job_id}: completed"),
            Some((JobStatus::Failed, error)) => {
                let error = error.unwrap_or_else(|| "unknown error".to_string());
                println!("{job_id}: failed: {error}");
                failures.push(error);
            }
            Some((status, _)) => println!("{job_id}: {status}"),
            None => {
                warn!(job_id = %job_id, "job no longer tracked");
                println!("{job_id}: dismissed");
            }
        }
    }
    match failures.first() {
        Some(first) if failures.len() == 1 => anyhow::bail!("sync failed: {first}"),
        Some(first) => anyhow::bail!("{} syncs failed; first error: {first}", failures.len()),
        None => Ok(()),
    }
}
