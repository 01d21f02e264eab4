//! In-memory [`DocumentStore`] implementation.
//!
//! A single JSON tree behind a `parking_lot` lock, with push-id
//! generation, write rules, change feeds and disconnect hooks. Behaves like
//! a hosted realtime tree seen from one client, which makes it both the
//! test double for the gateway/relay and a usable local backend.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use lobby_core::{FeedQuery, PushIdGenerator, StorePath};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info};

use super::disconnect::{DisconnectAction, DisconnectHooks};
use super::error::StoreError;
use super::feed::{FeedRegistry, FeedSubscription};
use super::mutation_observer::{CompositeMutationObserver, Mutation, MutationObserver};
use super::rules::WriteRules;
use super::tree::{get_at, set_at};
use crate::traits::DocumentStore;

/// In-memory realtime document store.
///
/// Observers are notified while the tree lock is held, so every feed sees
/// writes in commit order and a subscription never misses a write that
/// lands between its initial snapshot and its registration.
pub struct MemoryStore {
    tree: RwLock<Value>,
    push_ids: Mutex<PushIdGenerator>,
    observers: CompositeMutationObserver,
    feeds: Arc<FeedRegistry>,
    hooks: Mutex<DisconnectHooks>,
    rules: RwLock<WriteRules>,
}

impl MemoryStore {
    /// Creates an empty, fully writable store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observers(WriteRules::allow_all(), Vec::new())
    }

    /// Creates an empty store with the given rules. `observers` are
    /// notified after the built-in feed registry, in order.
    #[must_use]
    pub fn with_observers(rules: WriteRules, observers: Vec<Arc<dyn MutationObserver>>) -> Self {
        let feeds = Arc::new(FeedRegistry::new());
        let mut composite =
            CompositeMutationObserver::new(vec![Arc::clone(&feeds) as Arc<dyn MutationObserver>]);
        for observer in observers {
            composite.add(observer);
        }
        Self {
            tree: RwLock::new(Value::Object(serde_json::Map::new())),
            push_ids: Mutex::new(PushIdGenerator::new()),
            observers: composite,
            feeds,
            hooks: Mutex::new(DisconnectHooks::new()),
            rules: RwLock::new(rules),
        }
    }

    /// Marks a top-level collection read-only from now on.
    pub fn deny_writes(&self, collection: &str) {
        self.rules.write().deny(collection);
    }

    pub fn allow_writes(&self, collection: &str) {
        self.rules.write().allow(collection);
    }

    /// Simulates losing the connection: fires every armed hook in arming
    /// order, then clears them. Returns how many fired.
    ///
    /// Hooks were checked against the rules when armed and are applied
    /// without a second check, as the server applies them on its side.
    pub fn disconnect(&self) -> usize {
        let fired = self.hooks.lock().take_all();
        for (path, action) in &fired {
            let value = match action {
                DisconnectAction::Set(value) => value.clone(),
                DisconnectAction::Remove => Value::Null,
            };
            self.apply(path, value);
            info!(path = %path, "disconnect hook fired");
        }
        fired.len()
    }

    /// Number of hooks currently armed.
    #[must_use]
    pub fn armed_hooks(&self) -> usize {
        self.hooks.lock().len()
    }

    /// Number of live feeds.
    #[must_use]
    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    /// A copy of the whole tree.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        self.tree.read().clone()
    }

    fn commit(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.rules.read().check(path)?;
        self.apply(path, value);
        Ok(())
    }

    fn apply(&self, path: &StorePath, value: Value) {
        let scope = path.collection();
        let mut tree = self.tree.write();
        let before = get_at(&tree, &scope).cloned();
        set_at(&mut tree, path, value);
        let after = get_at(&tree, &scope);
        if before.as_ref() == after {
            return;
        }
        self.observers.on_mutation(&Mutation {
            path,
            scope: &scope,
            before: before.as_ref(),
            after,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn push(&self, parent: &StorePath, value: Value) -> Result<String, StoreError> {
        self.rules.read().check(parent)?;
        let key = self.push_ids.lock().next_id(now_millis());
        let path = parent.child(&key)?;
        self.commit(&path, value)?;
        Ok(key)
    }

    async fn set(&self, path: &StorePath, value: Value) -> Result<(), StoreError> {
        self.commit(path, value)
    }

    async fn get(&self, path: &StorePath) -> Result<Option<Value>, StoreError> {
        let tree = self.tree.read();
        let node = get_at(&tree, path).filter(|v| !(path.is_root() && is_empty_object(v)));
        Ok(node.cloned())
    }

    async fn remove(&self, path: &StorePath) -> Result<(), StoreError> {
        self.commit(path, Value::Null)
    }

    async fn subscribe(&self, query: FeedQuery) -> Result<FeedSubscription, StoreError> {
        let tree = self.tree.read();
        let current = get_at(&tree, &query.collection);
        Ok(self.feeds.register(query, current))
    }

    async fn arm_on_disconnect(
        &self,
        path: &StorePath,
        action: DisconnectAction,
    ) -> Result<(), StoreError> {
        self.rules.read().check(path)?;
        self.hooks.lock().arm(path.clone(), action);
        debug!(path = %path, "disconnect hook armed");
        Ok(())
    }

    async fn cancel_on_disconnect(&self, path: &StorePath) -> Result<(), StoreError> {
        let cancelled = self.hooks.lock().cancel(path);
        debug!(path = %path, cancelled, "disconnect hooks cancelled");
        Ok(())
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(serde_json::Map::is_empty)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lobby_core::{ChangeKind, FieldFilter, PUSH_ID_LEN};
    use serde_json::json;

    use super::*;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn push_generates_ordered_keys() {
        let store = MemoryStore::new();
        let games = path("games");

        let a = store.push(&games, json!({ "status": "Open" })).await.unwrap();
        let b = store.push(&games, json!({ "status": "Open" })).await.unwrap();

        assert_eq!(a.len(), PUSH_ID_LEN);
        assert!(a < b);
        assert_eq!(
            store.get(&games.child(&a).unwrap()).await.unwrap(),
            Some(json!({ "status": "Open" }))
        );
    }

    #[tokio::test]
    async fn set_is_full_replace() {
        let store = MemoryStore::new();
        let g1 = path("games/g1");
        store
            .set(&g1, json!({ "status": "Open", "joinRequests": { "r": { "id": "p1" } } }))
            .await
            .unwrap();
        store.set(&g1, json!({ "status": "Running" })).await.unwrap();

        assert_eq!(store.get(&g1).await.unwrap(), Some(json!({ "status": "Running" })));
        assert_eq!(store.get(&path("games/g1/joinRequests")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_missing_node_succeeds() {
        let store = MemoryStore::new();
        store.remove(&path("players/nobody")).await.unwrap();
        assert_eq!(store.get(&StorePath::root()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_only_collection_rejects_writes() {
        let store = MemoryStore::new();
        store.deny_writes("chat");

        let err = store.push(&path("chat"), json!({ "text": "hi" })).await.unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
        assert_eq!(store.snapshot(), json!({}));

        store.allow_writes("chat");
        assert!(store.push(&path("chat"), json!({ "text": "hi" })).await.is_ok());
    }

    #[tokio::test]
    async fn subscribe_replays_then_streams() {
        let store = MemoryStore::new();
        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();

        let mut open = store
            .subscribe(FeedQuery::filtered(path("games"), FieldFilter::new("status", "Open")))
            .await
            .unwrap();

        let replay = open.next().await.unwrap();
        assert_eq!((replay.kind, replay.key.as_str()), (ChangeKind::Added, "g1"));

        store.set(&path("games/g1/status"), json!("Running")).await.unwrap();
        let removed = open.next().await.unwrap();
        assert_eq!((removed.kind, removed.key.as_str()), (ChangeKind::Removed, "g1"));
        assert!(open.try_next().is_none());
    }

    #[tokio::test]
    async fn identical_rewrite_notifies_nobody() {
        let store = MemoryStore::new();
        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();
        let mut all = store.subscribe(FeedQuery::all(path("games"))).await.unwrap();
        all.next().await.unwrap();

        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();
        assert!(all.try_next().is_none());
    }

    #[tokio::test]
    async fn disconnect_fires_armed_hooks_through_feeds() {
        let store = MemoryStore::new();
        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();
        store.set(&path("players/p1"), json!({ "name": "Ann" })).await.unwrap();
        store
            .arm_on_disconnect(&path("games/g1/status"), DisconnectAction::Set(json!("Abandoned")))
            .await
            .unwrap();
        store
            .arm_on_disconnect(&path("players/p1"), DisconnectAction::Remove)
            .await
            .unwrap();

        let mut all = store.subscribe(FeedQuery::all(path("games"))).await.unwrap();
        all.next().await.unwrap();

        assert_eq!(store.disconnect(), 2);
        assert_eq!(store.armed_hooks(), 0);
        assert_eq!(
            store.get(&path("games/g1/status")).await.unwrap(),
            Some(json!("Abandoned"))
        );
        assert_eq!(store.get(&path("players/p1")).await.unwrap(), None);

        let changed = all.next().await.unwrap();
        assert_eq!(changed.kind, ChangeKind::Changed);
        assert_eq!(changed.value, json!({ "status": "Abandoned" }));
    }

    #[tokio::test]
    async fn cancelled_hook_does_not_fire() {
        let store = MemoryStore::new();
        store.set(&path("games/g1"), json!({ "status": "Running" })).await.unwrap();
        let status = path("games/g1/status");
        store
            .arm_on_disconnect(&status, DisconnectAction::Set(json!("Abandoned")))
            .await
            .unwrap();
        store.cancel_on_disconnect(&status).await.unwrap();

        assert_eq!(store.disconnect(), 0);
        assert_eq!(store.get(&status).await.unwrap(), Some(json!("Running")));
    }

    #[tokio::test]
    async fn arming_in_read_only_collection_is_denied() {
        let store = MemoryStore::with_observers(WriteRules::read_only(["players"]), Vec::new());
        let err = store
            .arm_on_disconnect(&path("players/p1"), DisconnectAction::Remove)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { .. }));
        assert_eq!(store.armed_hooks(), 0);
    }

    #[tokio::test]
    async fn extra_observers_see_committed_writes() {
        struct Counter(AtomicUsize);
        impl MutationObserver for Counter {
            fn on_mutation(&self, _: &Mutation<'_>) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let store = MemoryStore::with_observers(
            WriteRules::allow_all(),
            vec![Arc::clone(&counter) as Arc<dyn MutationObserver>],
        );

        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();
        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();
        store.remove(&path("games/g1")).await.unwrap();

        assert_eq!(counter.0.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn dropped_feed_is_released() {
        let store = MemoryStore::new();
        let sub = store.subscribe(FeedQuery::all(path("games"))).await.unwrap();
        assert_eq!(store.feed_count(), 1);
        drop(sub);
        store.set(&path("games/g1"), json!({ "status": "Open" })).await.unwrap();
        assert_eq!(store.feed_count(), 0);
    }
}
