//! Event relay: bridges the lobby UI and the document store.
//!
//! [`EventRelay::start`] opens one store subscription per distinct feed
//! query, then spawns:
//!
//! - one command task, executing UI commands in arrival order through the
//!   [`CommandService`] and emitting exactly one result event for each
//! - one forwarding task per feed, turning store changes into UI events
//!   according to the route table
//!
//! Both kinds of task write into the same UI event channel. No ordering is
//! promised between a command's acknowledgement and the feed events its
//! write causes.

pub mod commands;
pub mod feeds;
pub mod lifecycle;

use std::sync::Arc;

use lobby_core::{Command, PathError, UiEvent};
use tokio::sync::{mpsc, watch};
use tower::ServiceExt;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::gateway::RecordGateway;
use crate::storage::{FeedSubscription, StoreError};
use crate::traits::DocumentStore;

pub use commands::CommandService;
pub use feeds::{default_routes, FeedPlan, FeedRoute, FeedTarget};
pub use lifecycle::{RelayHandle, RelayState};

use lifecycle::Lifecycle;

/// Relay startup and port errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid feed route: {0}")]
    InvalidRoute(#[from] PathError),
    #[error("subscribing to {query} failed: {source}")]
    Subscribe {
        query: String,
        #[source]
        source: StoreError,
    },
    /// The relay no longer accepts commands.
    #[error("relay stopped")]
    Stopped,
}

/// Not yet started relay over one injected store.
pub struct EventRelay {
    gateway: RecordGateway,
    config: RelayConfig,
}

impl EventRelay {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: RelayConfig) -> Self {
        let gateway = RecordGateway::new(store, config.collections.clone());
        Self { gateway, config }
    }

    #[must_use]
    pub fn gateway(&self) -> &RecordGateway {
        &self.gateway
    }

    /// Opens every feed, then spawns the relay tasks.
    ///
    /// Feed subscriptions are opened before any command is accepted, so the
    /// UI sees every game that exists or appears from this point on.
    ///
    /// # Errors
    ///
    /// [`RelayError::InvalidRoute`] for a route with a bad collection path,
    /// [`RelayError::Subscribe`] if the store refuses a subscription. No
    /// task is left running on error.
    pub async fn start(self) -> Result<(RelayHandle, UiPort), RelayError> {
        let lifecycle = Lifecycle::new();
        let plans = feeds::plan(&self.config.feed_routes)?;

        let mut feeds = Vec::with_capacity(plans.len());
        for plan in plans {
            let subscription = self
                .gateway
                .store()
                .subscribe(plan.query.clone())
                .await
                .map_err(|source| RelayError::Subscribe {
                    query: plan.query.to_string(),
                    source,
                })?;
            feeds.push((plan, subscription));
        }

        let (command_tx, command_rx) = mpsc::channel(self.config.command_channel_capacity.max(1));
        let (event_tx, event_rx) = mpsc::channel(self.config.event_channel_capacity.max(1));

        let feed_count = feeds.len();
        let mut tasks = Vec::with_capacity(feed_count + 1);
        for (plan, subscription) in feeds {
            tasks.push(tokio::spawn(forward_feed(
                plan,
                subscription,
                event_tx.clone(),
                lifecycle.shutdown_receiver(),
            )));
        }
        tasks.push(tokio::spawn(run_commands(
            CommandService::new(self.gateway),
            command_rx,
            event_tx,
            lifecycle.shutdown_receiver(),
        )));

        lifecycle.set(RelayState::Running);
        info!(feeds = feed_count, "relay running");

        let port = UiPort {
            commands: command_tx,
            events: event_rx,
        };
        Ok((RelayHandle::new(lifecycle, tasks), port))
    }
}

/// The UI's end of a running relay.
#[derive(Debug)]
pub struct UiPort {
    commands: mpsc::Sender<Command>,
    events: mpsc::Receiver<UiEvent>,
}

impl UiPort {
    /// Queues a command. Waits while the command buffer is full.
    ///
    /// # Errors
    ///
    /// [`RelayError::Stopped`] once the command task has exited.
    pub async fn send(&self, command: Command) -> Result<(), RelayError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RelayError::Stopped)
    }

    /// Next event for the UI; `None` after every relay task has exited.
    pub async fn next_event(&mut self) -> Option<UiEvent> {
        self.events.recv().await
    }

    /// Next event if one is already buffered.
    pub fn try_next_event(&mut self) -> Option<UiEvent> {
        self.events.try_recv().ok()
    }

    /// Splits the port for UIs that drive commands and events separately.
    #[must_use]
    pub fn into_parts(self) -> (mpsc::Sender<Command>, mpsc::Receiver<UiEvent>) {
        (self.commands, self.events)
    }
}

async fn run_commands(
    service: CommandService,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::Sender<UiEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = commands.recv() => match next {
                Some(command) => command,
                None => break,
            },
        };
        let event = match service.clone().oneshot(command).await {
            Ok(event) => event,
            Err(never) => match never {},
        };
        if !deliver(&events, event, &mut shutdown).await {
            break;
        }
    }
    debug!("command task stopped");
}

async fn forward_feed(
    plan: FeedPlan,
    mut feed: FeedSubscription,
    events: mpsc::Sender<UiEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(query = %plan.query, "feed forwarding started");
    loop {
        let change = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = feed.next() => match next {
                Some(change) => change,
                None => {
                    warn!(query = %plan.query, "feed closed by store, forwarding stopped");
                    return;
                }
            },
        };
        for target in plan.targets_for(change.kind) {
            if !deliver(&events, target.build(&change), &mut shutdown).await {
                debug!(query = %plan.query, "feed task stopped");
                return;
            }
        }
    }
    debug!(query = %plan.query, "feed task stopped");
}

/// Sends `event` to the UI. `false` when the UI is gone or shutdown was
/// signalled while waiting for buffer space.
async fn deliver(
    events: &mpsc::Sender<UiEvent>,
    event: UiEvent,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        sent = events.send(event) => sent.is_ok(),
        _ = shutdown.changed() => false,
    }
}
