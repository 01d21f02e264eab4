//! Change feeds over store collections.
//!
//! A [`FeedRegistry`] is a [`MutationObserver`] that turns committed writes
//! into per-child [`ChangeEvent`]s for every registered [`FeedQuery`].
//! Each subscriber owns an unbounded channel: observers run under the store
//! write lock and must never wait on a slow consumer.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use lobby_core::{ChangeEvent, ChangeKind, FeedQuery, StorePath};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::mutation_observer::{Mutation, MutationObserver};
use super::tree::get_at;

/// Receiving end of a standing query.
///
/// Yields events until the store is dropped. Dropping the subscription
/// unregisters it on the next committed write.
#[derive(Debug)]
pub struct FeedSubscription {
    id: u64,
    query: FeedQuery,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl FeedSubscription {
    /// Builds a subscription around an existing receiver. Lets store
    /// implementations other than [`MemoryStore`](super::MemoryStore)
    /// hand out feeds.
    #[must_use]
    pub fn new(id: u64, query: FeedQuery, rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { id, query, rx }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    /// Next change, or `None` once the feed has closed.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

struct Feed {
    query: FeedQuery,
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

/// Registry of live feeds, fed by store mutations.
#[derive(Default)]
pub struct FeedRegistry {
    feeds: DashMap<u64, Feed>,
    next_id: AtomicU64,
}

impl FeedRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `query` and replays `current` (the collection's present
    /// node) as `Added` events for every matching child, in key order.
    ///
    /// The caller must hold the store lock across reading `current` and
    /// this call so no write slips between snapshot and registration.
    pub fn register(&self, query: FeedQuery, current: Option<&Value>) -> FeedSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        if let Some(Value::Object(children)) = current {
            for (key, value) in children {
                if query.matches(value) {
                    // Receiver is alive: it is returned below.
                    let _ = tx.send(ChangeEvent {
                        kind: ChangeKind::Added,
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        debug!(feed_id = id, query = %query, "feed registered");
        self.feeds.insert(
            id,
            Feed {
                query: query.clone(),
                tx,
            },
        );
        FeedSubscription { id, query, rx }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

impl MutationObserver for FeedRegistry {
    fn on_mutation(&self, mutation: &Mutation<'_>) {
        let mut closed = Vec::new();

        for entry in &self.feeds {
            let feed = entry.value();
            if feed.tx.is_closed() {
                closed.push(*entry.key());
                continue;
            }
            for event in changes_for(&feed.query, mutation) {
                if feed.tx.send(event).is_err() {
                    closed.push(*entry.key());
                    break;
                }
            }
        }

        for id in closed {
            self.feeds.remove(&id);
            debug!(feed_id = id, "feed dropped by subscriber");
        }
    }
}

/// Computes the events one mutation produces for one query.
fn changes_for(query: &FeedQuery, mutation: &Mutation<'_>) -> Vec<ChangeEvent> {
    let collection = &query.collection;
    let (Some(before), Some(after)) = (
        collection_node(collection, mutation.scope, mutation.before),
        collection_node(collection, mutation.scope, mutation.after),
    ) else {
        return Vec::new();
    };

    let keys: BTreeSet<String> = if mutation.path.len() > collection.len()
        && mutation.path.starts_with(collection)
    {
        // Write below one child: only that child can have changed.
        mutation.path.segments()[collection.len()..]
            .first()
            .cloned()
            .into_iter()
            .collect()
    } else if collection.starts_with(mutation.path) {
        // Write at or above the collection: any child may have changed.
        child_keys(before).chain(child_keys(after)).collect()
    } else {
        return Vec::new();
    };

    keys.into_iter()
        .filter_map(|key| {
            let old = child(before, &key);
            let new = child(after, &key);
            let kind = query.classify(old, new)?;
            let value = match kind {
                ChangeKind::Removed => old,
                ChangeKind::Added | ChangeKind::Changed => new,
            }?;
            Some(ChangeEvent {
                kind,
                key,
                value: value.clone(),
            })
        })
        .collect()
}

/// Resolves the collection node inside a scope snapshot.
///
/// Outer `None`: the collection is not inside this mutation's scope.
/// Inner `None`: it is, but the node is absent on that side.
#[allow(clippy::option_option)]
fn collection_node<'a>(
    collection: &StorePath,
    scope: &StorePath,
    snapshot: Option<&'a Value>,
) -> Option<Option<&'a Value>> {
    let relative = collection.strip_prefix(scope)?;
    Some(snapshot.and_then(|node| get_at(node, &relative)))
}

fn child_keys(node: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    node.and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.keys().cloned())
}

fn child<'a>(node: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    node?.as_object()?.get(key)
}
