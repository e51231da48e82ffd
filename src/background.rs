//! Tracked background work.
//!
//! Cache stores are scheduled here so the client gets its response without
//! waiting on them. The server drains the tracker during graceful shutdown,
//! so a store scheduled before SIGTERM still runs to completion.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

#[derive(Clone, Debug, Default)]
pub struct Background {
    tasks: TaskTracker,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` on the tokio runtime, tracked until it finishes.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every task spawned so far. The tracker stays usable.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Final drain at shutdown, bounded by `grace`.
    pub async fn shutdown(&self, grace: Duration) {
        self.tasks.close();
        debug!(pending = self.tasks.len(), "waiting for background tasks");
        if timeout(grace, self.tasks.wait()).await.is_err() {
            warn!(remaining = self.tasks.len(), "background tasks did not finish in time");
        }
    }
}
