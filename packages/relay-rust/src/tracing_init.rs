//! Tracing subscriber setup for relay binaries.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "lobby_relay=info";

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_filter`. With `json` set, lines are emitted
/// as structured JSON instead of the human-readable format. Fails if a
/// global subscriber is already installed.
pub fn init_tracing(default_filter: &str, json: bool) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
}
