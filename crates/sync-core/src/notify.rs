use anyhow::Context;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

const MAX_JOURNAL_BYTES: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotificationPermission {
    Default,
    Granted,
    Denied,
}

pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;
    fn request_permission(&self) -> NotificationPermission;
    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

/// Best-effort front for a [`Notifier`]: asks for permission once and only
/// dispatches when it was granted. Delivery errors never reach the caller.
#[derive(Clone)]
pub struct NotificationGate {
    notifier: Arc<dyn Notifier>,
}

impl NotificationGate {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn request_if_undecided(&self) -> NotificationPermission {
        match self.notifier.permission() {
            NotificationPermission::Default => {
                let decided = self.notifier.request_permission();
                debug!(permission = ?decided, "notification permission requested");
                decided
            }
            decided => decided,
        }
    }

    pub fn send(&self, title: &str, body: &str) {
        if self.notifier.permission() != NotificationPermission::Granted {
            return;
        }
        if let Err(err) = self.notifier.notify(title, body) {
            debug!(error = %err, "notification dropped");
        }
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        info!(title, body, "notification");
        Ok(())
    }
}

pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn notify(&self, _title: &str, _body: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Appends alerts as JSON lines to a daily journal under `base_dir`.
pub struct JournalNotifier {
    base_dir: PathBuf,
    max_bytes: u64,
}

impl JournalNotifier {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            max_bytes: MAX_JOURNAL_BYTES,
        }
    }

    pub fn with_max_bytes(base_dir: PathBuf, max_bytes: u64) -> Self {
        Self {
            base_dir,
            max_bytes,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[derive(Serialize)]
struct JournalEntry<'a> {
    ts: String,
    level: &'static str,
    title: &'a str,
    body: &'a str,
}

impl Notifier for JournalNotifier {
    fn permission(&self) -> NotificationPermission {
        if self.base_dir.is_dir() {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Default
        }
    }

    fn request_permission(&self) -> NotificationPermission {
        match fs::create_dir_all(&self.base_dir) {
            Ok(()) => NotificationPermission::Granted,
            Err(err) => {
                debug!(error = %err, path = %self.base_dir.display(), "notification journal unavailable");
                NotificationPermission::Denied
            }
        }
    }

    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let now = OffsetDateTime::now_utc();
        let entry = JournalEntry {
            ts: now.format(&Rfc3339).context("format timestamp")?,
            level: if title.contains("failed") { "ERROR" } else { "INFO" },
            title,
            body,
        };
        let date = now
            .format(&time::format_description::parse("[year][month][day]")?)
            .context("format date")?;
        let path = next_journal_path(&self.base_dir, &date, self.max_bytes);
        let line = serde_json::to_string(&entry).context("serialize notification")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open notification journal {}", path.display()))?;
        writeln!(file, "{line}").context("write notification")?;
        Ok(())
    }
}

fn next_journal_path(base_dir: &Path, date: &str, max_bytes: u64) -> PathBuf {
    let mut suffix = 0;
    loop {
        let name = if suffix == 0 {
            format!("notifications-{date}.jsonl")
        } else {
            format!("notifications-{date}-{suffix}.jsonl")
        };
        let path = base_dir.join(name);
        if let Ok(metadata) = fs::metadata(&path)
            && metadata.len() >= max_bytes
        {
            suffix += 1;
            continue;
        }
        return path;
    }
}
