use super::*;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(in crate::cli) fn render_progress_bar(step: u64, total: u64, width: usize) -> String {
    if total == 0 || width == 0 {
        return "[]".to_string();
    }
    let filled = ((step as f32 / total as f32) * width as f32).round() as usize;
    let filled = filled.min(width);
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(empty))
}

/// One-line summary of what is currently running, if anything.
pub(in crate::cli) fn progress_line(snapshot: &CoordinatorSnapshot) -> Option<String> {
    let progress = snapshot.progress()?;
    let index = progress.current_repo_index.min(progress.total_repos);
    let bar = render_progress_bar(index, progress.total_repos, 20);
    let repo = progress.current_repo.as_deref().unwrap_or("-");
    let mut line = format!(
        "{}/{} {} repo={} {} | {} commits, {} PRs, {} contributors",
        index,
        progress.total_repos,
        bar,
        repo,
        progress.message,
        progress.counters.commits_synced,
        progress.counters.prs_synced,
        progress.counters.contributors_synced
    );
    let queued = snapshot.count(JobStatus::Queued);
    if queued > 0 {
        line.push_str(&format!(" queued={queued}"));
    }
    Some(line)
}

fn render_line(last_len: &mut usize, line: &str) {
    if line.len() < *last_len {
        print!("\r{line}{}", " ".repeat(*last_len - line.len()));
    } else {
        print!("\r{line}");
    }
    let _ = io::stdout().flush();
    *last_len = line.len();
}

/// Prints progress as the coordinator publishes it and returns the snapshot
/// taken once nothing is queued or running.
pub(in crate::cli) async fn follow_until_idle(coordinator: &Coordinator) -> CoordinatorSnapshot {
    let mut updates = coordinator.subscribe();
    let mut last_len = 0;
    loop {
        let (line, syncing) = {
            let snapshot = updates.borrow_and_update();
            (progress_line(&snapshot), snapshot.is_syncing())
        };
        if let Some(line) = line {
            render_line(&mut last_len, &line);
        }
        if !syncing || updates.changed().await.is_err() {
            break;
        }
    }
    if last_len > 0 {
        println!();
    }
    coordinator.snapshot()
}

pub(in crate::cli) fn format_timestamp(value: Option<OffsetDateTime>) -> String {
    value
        .and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}

pub(in crate::cli) fn format_job_line(job: &RepoSyncJob) -> String {
    format!(
        "{:<36}  {:<9}  {} ({})  {}  started={} finished={}",
        job.id,
        job.status.as_str(),
        job.repository_name,
        job.repository_id,
        job.progress,
        format_timestamp(job.started_at),
        format_timestamp(job.completed_at)
    )
}

pub(in crate::cli) fn format_global_line(job: &GlobalSyncJob) -> String {
    format!(
        "{:<36}  {:<9}  {} {}/{}  {}  started={} finished={}",
        job.id,
        job.status.as_str(),
        job.sync_type.label(),
        job.current_repo_index,
        job.total_repos,
        job.progress,
        format_timestamp(job.started_at),
        format_timestamp(job.completed_at)
    )
}

pub(in crate::cli) fn print_snapshot(snapshot: &CoordinatorSnapshot) {
    if snapshot.global_job.is_none() && snapshot.repo_jobs.is_empty() {
        println!("No tracked sync jobs");
        return;
    }
    if let Some(job) = &snapshot.global_job {
        println!("{}", format_global_line(job));
    }
    for job in &snapshot.repo_jobs {
        println!("{}", format_job_line(job));
    }
    if let Some(line) = progress_line(snapshot) {
        println!("Progress: {line}");
    }
    if let Some(error) = snapshot.error() {
        println!("Error: {error}");
    }
}

/// Final status and error text of a tracked job, global or per repository.
pub(in crate::cli) fn job_outcome(
    snapshot: &CoordinatorSnapshot,
    job_id: &str,
) -> Option<(JobStatus, Option<String>)> {
    if let Some(job) = snapshot.global_job.as_ref().filter(|job| job.id == job_id) {
        return Some((job.status, job.error.clone()));
    }
    snapshot
        .repo_jobs
        .iter()
        .find(|job| job.id == job_id)
        .map(|job| (job.status, job.error.clone()))
}
