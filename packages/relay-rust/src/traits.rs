use async_trait::async_trait;
use lobby_core::{FeedQuery, StorePath};
use serde_json::Value;

use crate::storage::{DisconnectAction, FeedSubscription, StoreError};

/// Client handle to a realtime document store.
///
/// One instance is constructed at startup and shared as
/// `Arc<dyn DocumentStore>` by the gateway and the relay. Implementations:
/// [`MemoryStore`](crate::storage::MemoryStore) (local/tests); a hosted
/// backend implements the same surface over its SDK.
///
/// No method retries or times out; that belongs to the underlying client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Writes `value` under a new store-generated key below `parent` and
    /// returns that key.
    async fn push(&self, parent: &StorePath, value: Value) -> Result<String, StoreError>;

    /// Replaces the node at `path` with `value`. Nothing of the previous
    /// node survives; `null` deletes.
    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError>;

    /// Reads the node at `path`, `None` if absent.
    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError>;

    /// Deletes the node at `path`. Deleting an absent node succeeds.
    async fn remove(&self, path: &StorePath) -> Result<(), StoreError>;

    /// Opens a standing query. Existing matches arrive first as `Added`.
    async fn subscribe(&self, query: FeedQuery) -> Result<FeedSubscription, StoreError>;

    /// Arms `action` to run at `path` if this client disconnects.
    async fn arm_on_disconnect(
        &self,
        path: &StorePath,
        action: DisconnectAction,
    ) -> Result<(), StoreError>;

    /// Disarms hooks at or below `path`. A no-op if none are armed,
    /// including after they have already fired.
    async fn cancel_on_disconnect(&self, path: &StorePath) -> Result<(), StoreError>;
}
