//! Mutation observer trait and composite implementation.
//!
//! Defines [`MutationObserver`] for reacting to committed writes in a
//! [`MemoryStore`](super::MemoryStore), and [`CompositeMutationObserver`]
//! which fans out notifications to multiple observers.

use std::sync::Arc;

use lobby_core::StorePath;
use serde_json::Value;

/// A committed write, described at collection granularity.
///
/// `scope` is the top-level collection containing `path` (or the root for
/// root writes). `before` and `after` are the scope's node on either side
/// of the write; `None` means the node was absent.
#[derive(Debug, Clone, Copy)]
pub struct Mutation<'a> {
    pub path: &'a StorePath,
    pub scope: &'a StorePath,
    pub before: Option<&'a Value>,
    pub after: Option<&'a Value>,
}

/// Observer for committed writes.
///
/// Called synchronously while the store's write lock is held, so
/// implementations must not block and must not call back into the store.
/// Only invoked when a write actually changed the tree.
///
/// Used as `Arc<dyn MutationObserver>`.
pub trait MutationObserver: Send + Sync {
    fn on_mutation(&self, mutation: &Mutation<'_>);
}

/// Composite observer that fans out to multiple observers in order.
#[derive(Default)]
pub struct CompositeMutationObserver {
    observers: Vec<Arc<dyn MutationObserver>>,
}

impl CompositeMutationObserver {
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn MutationObserver>>) -> Self {
        Self { observers }
    }

    /// Adds an observer after construction.
    pub fn add(&mut self, observer: Arc<dyn MutationObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl MutationObserver for CompositeMutationObserver {
    fn on_mutation(&self, mutation: &Mutation<'_>) {
        for observer in &self.observers {
            observer.on_mutation(mutation);
        }
    }
}

/// Logs every committed write at `debug` level.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl MutationObserver for TracingObserver {
    fn on_mutation(&self, mutation: &Mutation<'_>) {
        tracing::debug!(
            path = %mutation.path,
            created = mutation.before.is_none(),
            deleted = mutation.after.is_none(),
            "store write committed"
        );
    }
}
