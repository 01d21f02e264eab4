//! Relay configuration.
//!
//! Connection parameters are fixed when the binary is built: they are read
//! with `option_env!` at compile time and never from the runtime environment.

use std::fmt;
use std::sync::Arc;

use crate::relay::feeds::{default_routes, FeedRoute};
use crate::storage::{MemoryStore, MutationObserver, WriteRules};

/// URL scheme of the in-process backend.
pub const MEMORY_SCHEME: &str = "memory://";

/// Configuration that cannot be turned into a running store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("no store backend for {url:?}: only memory:// is built in")]
    UnsupportedBackend { url: String },
}

/// Hosted store connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub api_key: String,
    pub project_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: option_env!("LOBBY_DATABASE_URL")
                .unwrap_or("memory://lobby")
                .to_string(),
            api_key: option_env!("LOBBY_API_KEY").unwrap_or_default().to_string(),
            project_id: option_env!("LOBBY_PROJECT_ID")
                .unwrap_or("lobby-local")
                .to_string(),
        }
    }
}

impl StoreConfig {
    /// Opens the store `database_url` names.
    ///
    /// Only `memory://` URLs are served from this crate; a hosted backend
    /// implements [`DocumentStore`](crate::traits::DocumentStore) elsewhere
    /// and is constructed by its own client.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnsupportedBackend`] for any other scheme.
    pub fn memory_store(
        &self,
        observers: Vec<Arc<dyn MutationObserver>>,
    ) -> Result<MemoryStore, ConfigError> {
        if !self.database_url.starts_with(MEMORY_SCHEME) {
            return Err(ConfigError::UnsupportedBackend {
                url: self.database_url.clone(),
            });
        }
        Ok(MemoryStore::with_observers(WriteRules::allow_all(), observers))
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &self.database_url)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "" } else { "<redacted>" },
            )
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Names of the top-level collections the gateway writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub games: String,
    pub players: String,
    pub chat: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            games: "games".to_string(),
            players: "players".to_string(),
            chat: "chat".to_string(),
        }
    }
}

/// Top-level configuration for an [`EventRelay`](crate::relay::EventRelay).
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub store: StoreConfig,
    pub collections: CollectionNames,
    /// Buffered commands before [`UiPort::send`](crate::relay::UiPort::send)
    /// waits.
    pub command_channel_capacity: usize,
    /// Buffered UI events before the relay tasks wait on the consumer.
    pub event_channel_capacity: usize,
    /// Change-feed routing table.
    pub feed_routes: Vec<FeedRoute>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let collections = CollectionNames::default();
        Self {
            store: StoreConfig::default(),
            feed_routes: default_routes(&collections),
            collections,
            command_channel_capacity: 64,
            event_channel_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = RelayConfig::default();
        assert_eq!(config.collections.games, "games");
        assert_eq!(config.collections.players, "players");
        assert_eq!(config.collections.chat, "chat");
        assert_eq!(config.command_channel_capacity, 64);
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.feed_routes.len(), 6);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = StoreConfig {
            database_url: "https://lobby.example".to_string(),
            api_key: "secret-key".to_string(),
            project_id: "lobby".to_string(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("https://lobby.example"));
    }

    #[test]
    fn memory_url_opens_memory_store() {
        let config = StoreConfig {
            database_url: "memory://lobby".to_string(),
            ..StoreConfig::default()
        };
        let store = config.memory_store(Vec::new()).unwrap();
        assert_eq!(store.armed_hooks(), 0);
    }

    #[test]
    fn hosted_url_is_rejected() {
        let config = StoreConfig {
            database_url: "https://lobby.example".to_string(),
            ..StoreConfig::default()
        };
        let err = config.memory_store(Vec::new()).err().unwrap();
        assert_eq!(
            err,
            ConfigError::UnsupportedBackend {
                url: "https://lobby.example".to_string()
            }
        );
    }

    #[test]
    fn config_is_cloneable() {
        let config = RelayConfig::default();
        let cloned = config.clone();
        assert_eq!(cloned.store, config.store);
        assert_eq!(cloned.feed_routes, config.feed_routes);
    }
}
