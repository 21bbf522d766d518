//! Graceful shutdown coordination via `CancellationToken`.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Coordinates shutdown between the control loop, the accept loop and the
/// session workers.
///
/// The token replaces a shared "running" flag: it starts un-cancelled, is
/// cancelled at most once and is never reset. Session workers are spawned on
/// the tracker so that shutdown can optionally wait for all of them.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown. Calling it again has no effect.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn a session worker. Workers are never joined individually.
    pub fn spawn_worker<F>(&self, worker: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(worker)
    }

    /// Number of workers that have not finished yet
    pub fn active_workers(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting new workers and wait up to `timeout` for the running ones.
    ///
    /// Returns `false` if some workers were still running at the deadline.
    pub async fn wait_for_workers(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
