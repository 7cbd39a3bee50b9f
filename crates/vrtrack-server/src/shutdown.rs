//! Graceful shutdown coordination via `CancellationToken`.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vrtrack_runtime::Registry;

/// Default time to wait for server tasks before giving up on them.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Stops the socket loops, then tears down every actor.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Token observed by server loops.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for `task` during shutdown.
    pub fn track(&self, task: JoinHandle<()>) {
        self.tasks.lock().push(task);
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Shut everything down.
    ///
    /// 1. Cancel the token so socket loops and feed timers stop.
    /// 2. Wait up to `timeout` for tracked tasks; abort stragglers.
    /// 3. Destroy all registry actors and flush pending configuration.
    pub async fn graceful_shutdown(&self, registry: &Registry, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        self.token.cancel();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        info!(task_count = tasks.len(), timeout_ms = timeout.as_millis(), "waiting for tasks to complete");
        let aborts: Vec<_> = tasks.iter().map(JoinHandle::abort_handle).collect();
        if tokio::time::timeout(timeout, futures::future::join_all(tasks))
            .await
            .is_err()
        {
            warn!("shutdown timed out after {timeout:?}, aborting remaining tasks");
            for abort in aborts {
                abort.abort();
            }
        }

        registry.shutdown().await;
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
