//! Change-feed vocabulary shared by stores and the relay.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::StorePath;
use crate::types::with_id;

/// Kind of change a feed reports for one child of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// The child entered the feed's result set (created, or now matches the filter).
    Added,
    /// The child stayed in the result set but its value changed.
    Changed,
    /// The child left the result set (deleted, or no longer matches the filter).
    Removed,
}

/// Equality filter on one top-level field of each child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

impl FieldFilter {
    #[must_use]
    pub fn new(field: &str, equals: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            equals: equals.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, child: &Value) -> bool {
        child.get(&self.field) == Some(&self.equals)
    }
}

/// A standing query over the children of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub collection: StorePath,
    pub filter: Option<FieldFilter>,
}

impl FeedQuery {
    /// Every child of `collection`.
    #[must_use]
    pub fn all(collection: StorePath) -> Self {
        Self {
            collection,
            filter: None,
        }
    }

    /// Children of `collection` whose `filter.field` equals `filter.equals`.
    #[must_use]
    pub fn filtered(collection: StorePath, filter: FieldFilter) -> Self {
        Self {
            collection,
            filter: Some(filter),
        }
    }

    /// Whether a present child value belongs to this query's result set.
    #[must_use]
    pub fn matches(&self, child: &Value) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(child))
    }

    /// Classifies the transition of one child from `before` to `after`.
    ///
    /// Returns `None` when the child is outside the result set on both sides,
    /// or inside on both sides with an identical value.
    #[must_use]
    pub fn classify(&self, before: Option<&Value>, after: Option<&Value>) -> Option<ChangeKind> {
        let was_in = before.is_some_and(|v| self.matches(v));
        let is_in = after.is_some_and(|v| self.matches(v));
        match (was_in, is_in) {
            (false, true) => Some(ChangeKind::Added),
            (true, false) => Some(ChangeKind::Removed),
            (true, true) if before != after => Some(ChangeKind::Changed),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}[{}=={}]", self.collection, filter.field, filter.equals),
            None => write!(f, "{}", self.collection),
        }
    }
}

/// One change delivered by a feed.
///
/// For `Removed`, `value` is the child's last value inside the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub key: String,
    pub value: Value,
}

impl ChangeEvent {
    /// The payload with the child's key merged in as `id`.
    #[must_use]
    pub fn payload_with_id(&self) -> Value {
        with_id(&self.key, self.value.clone())
    }
}
