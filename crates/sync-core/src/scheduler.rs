use std::future::Future;
use std::sync::Mutex;
use tokio::task::{AbortHandle, JoinSet};
use tracing::debug;

/// Owns every background task the coordinator spawns so that teardown can
/// cancel timers deterministically.
#[derive(Default)]
pub struct TaskScheduler {
    tasks: Mutex<JoinSet<()>>,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, name: &'static str, task: F) -> Option<AbortHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut tasks) = self.tasks.lock() else {
            debug!(task = name, "scheduler closed; task dropped");
            return None;
        };
        while tasks.try_join_next().is_some() {}
        debug!(task = name, "spawning task");
        Some(tasks.spawn(task))
    }

    pub fn active(&self) -> usize {
        self.tasks
            .lock()
            .map(|mut tasks| {
                while tasks.try_join_next().is_some() {}
                tasks.len()
            })
            .unwrap_or(0)
    }

    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.abort_all();
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
