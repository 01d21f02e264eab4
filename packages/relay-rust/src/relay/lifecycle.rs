//! Relay task lifecycle: health state and graceful shutdown.
//!
//! Uses `ArcSwap` for lock-free state transitions and a `watch` channel to
//! signal every relay task at once.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Relay state.
///
/// State machine: Starting -> Running -> Stopping -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Subscriptions are being opened.
    Starting,
    /// Command and feed tasks are forwarding.
    Running,
    /// Shutdown was signalled; tasks are finishing.
    Stopping,
    /// Every task has exited.
    Stopped,
}

/// Shared state plus the shutdown signal. Tasks only hold receivers.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    state: Arc<ArcSwap<RelayState>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (shutdown, _rx) = watch::channel(false);
        Self {
            state: Arc::new(ArcSwap::from_pointee(RelayState::Starting)),
            shutdown: Arc::new(shutdown),
        }
    }

    pub(crate) fn set(&self, state: RelayState) {
        self.state.store(Arc::new(state));
    }

    pub(crate) fn state(&self) -> RelayState {
        **self.state.load()
    }

    /// Receiver that flips to `true` on shutdown.
    pub(crate) fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    fn trigger(&self) {
        self.set(RelayState::Stopping);
        // Stored even when every receiver is gone.
        self.shutdown.send_replace(true);
    }
}

/// Handle to a started relay.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// stops the tasks, without waiting for them.
#[derive(Debug)]
pub struct RelayHandle {
    lifecycle: Lifecycle,
    tasks: Vec<JoinHandle<()>>,
}

impl RelayHandle {
    pub(crate) fn new(lifecycle: Lifecycle, tasks: Vec<JoinHandle<()>>) -> Self {
        Self { lifecycle, tasks }
    }

    #[must_use]
    pub fn state(&self) -> RelayState {
        self.lifecycle.state()
    }

    /// Number of spawned tasks: one command task plus one per feed query.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks that have not exited yet. A feed closed by the store drops out
    /// of this count while the others keep running.
    #[must_use]
    pub fn live_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }

    /// Signals every task to stop and waits for them.
    ///
    /// A command already being executed completes first; queued commands
    /// are dropped.
    pub async fn shutdown(self) {
        self.lifecycle.trigger();
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "relay task ended abnormally");
            }
        }
        self.lifecycle.set(RelayState::Stopped);
        info!("relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_starting() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), RelayState::Starting);
    }

    #[test]
    fn clones_share_state() {
        let lifecycle = Lifecycle::new();
        let clone = lifecycle.clone();
        lifecycle.set(RelayState::Running);
        assert_eq!(clone.state(), RelayState::Running);
    }

    #[tokio::test]
    async fn shutdown_signals_and_awaits_tasks() {
        let lifecycle = Lifecycle::new();
        lifecycle.set(RelayState::Running);
        let mut rx = lifecycle.shutdown_receiver();
        let task = tokio::spawn(async move {
            let _ = rx.changed().await;
        });

        let handle = RelayHandle::new(lifecycle.clone(), vec![task]);
        assert_eq!(handle.task_count(), 1);
        assert_eq!(handle.live_tasks(), 1);
        handle.shutdown().await;

        assert_eq!(lifecycle.state(), RelayState::Stopped);
        assert!(*lifecycle.shutdown_receiver().borrow());
    }

    #[tokio::test]
    async fn panicked_task_does_not_block_shutdown() {
        let lifecycle = Lifecycle::new();
        let task = tokio::spawn(async { panic!("boom") });

        RelayHandle::new(lifecycle.clone(), vec![task]).shutdown().await;
        assert_eq!(lifecycle.state(), RelayState::Stopped);
    }
}
