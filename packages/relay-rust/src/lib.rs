//! Lobby relay: bridges a board-game lobby UI and a realtime document store.
//!
//! UI commands become store writes through the [`RecordGateway`]; store
//! change feeds become UI events through the [`EventRelay`]. The store is
//! injected as `Arc<dyn DocumentStore>`; [`MemoryStore`] is the in-process
//! implementation.

pub mod config;
pub mod gateway;
pub mod relay;
pub mod storage;
pub mod tracing_init;
pub mod traits;

pub use config::{CollectionNames, ConfigError, RelayConfig, StoreConfig};
pub use gateway::{GatewayError, RecordGateway};
pub use relay::{CommandService, EventRelay, RelayError, RelayHandle, RelayState, UiPort};
pub use storage::{DisconnectAction, FeedSubscription, MemoryStore, StoreError, WriteRules};
pub use traits::DocumentStore;
