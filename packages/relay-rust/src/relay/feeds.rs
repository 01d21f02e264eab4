//! Declarative change-feed routing.
//!
//! Each [`FeedRoute`] says: for changes of this kind on this (optionally
//! filtered) collection, emit this UI event. Routes sharing a query share
//! one store subscription.

use lobby_core::{
    status, ChangeEvent, ChangeKind, FeedQuery, FieldFilter, PathError, StorePath, UiEvent,
};

use crate::config::CollectionNames;

/// UI event produced by a feed route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedTarget {
    GameAdded,
    GameChanged,
    OpenGameAdded,
    OpenGameRemoved,
    RunningGameAdded,
    RunningGameRemoved,
}

impl FeedTarget {
    /// Builds the UI event for `change`.
    ///
    /// Record-carrying targets get the stored payload, untouched apart
    /// from its key merged in as `id`; removal targets carry the key alone.
    #[must_use]
    pub fn build(self, change: &ChangeEvent) -> UiEvent {
        match self {
            Self::GameAdded => UiEvent::GameAdded(change.payload_with_id()),
            Self::GameChanged => UiEvent::GameChanged(change.payload_with_id()),
            Self::OpenGameAdded => UiEvent::OpenGameAdded(change.payload_with_id()),
            Self::OpenGameRemoved => UiEvent::OpenGameRemoved(change.key.clone()),
            Self::RunningGameAdded => UiEvent::RunningGameAdded(change.payload_with_id()),
            Self::RunningGameRemoved => UiEvent::RunningGameRemoved(change.key.clone()),
        }
    }
}

/// One row of the change-feed table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRoute {
    /// Collection path, e.g. `"games"`.
    pub collection: String,
    pub filter: Option<FieldFilter>,
    pub kind: ChangeKind,
    pub target: FeedTarget,
}

impl FeedRoute {
    /// Route on every child of `collection`.
    #[must_use]
    pub fn all(collection: &str, kind: ChangeKind, target: FeedTarget) -> Self {
        Self {
            collection: collection.to_string(),
            filter: None,
            kind,
            target,
        }
    }

    /// Route on children of `collection` whose `status` equals `value`.
    #[must_use]
    pub fn by_status(collection: &str, value: &str, kind: ChangeKind, target: FeedTarget) -> Self {
        Self {
            collection: collection.to_string(),
            filter: Some(FieldFilter::new("status", value)),
            kind,
            target,
        }
    }

    /// The store query this route listens on.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if `collection` is not a valid store path.
    pub fn query(&self) -> Result<FeedQuery, PathError> {
        Ok(FeedQuery {
            collection: StorePath::parse(&self.collection)?,
            filter: self.filter.clone(),
        })
    }
}

/// The standard lobby routes: all additions and changes on games, plus
/// additions and removals for open and running games.
#[must_use]
pub fn default_routes(collections: &CollectionNames) -> Vec<FeedRoute> {
    let games = collections.games.as_str();
    vec![
        FeedRoute::all(games, ChangeKind::Added, FeedTarget::GameAdded),
        FeedRoute::all(games, ChangeKind::Changed, FeedTarget::GameChanged),
        FeedRoute::by_status(games, status::OPEN, ChangeKind::Added, FeedTarget::OpenGameAdded),
        FeedRoute::by_status(games, status::OPEN, ChangeKind::Removed, FeedTarget::OpenGameRemoved),
        FeedRoute::by_status(
            games,
            status::RUNNING,
            ChangeKind::Added,
            FeedTarget::RunningGameAdded,
        ),
        FeedRoute::by_status(
            games,
            status::RUNNING,
            ChangeKind::Removed,
            FeedTarget::RunningGameRemoved,
        ),
    ]
}

/// Routes grouped under the one query they share.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPlan {
    pub query: FeedQuery,
    pub targets: Vec<(ChangeKind, FeedTarget)>,
}

impl FeedPlan {
    /// Targets that fire for a change of `kind`, in table order.
    pub fn targets_for(&self, kind: ChangeKind) -> impl Iterator<Item = FeedTarget> + '_ {
        self.targets
            .iter()
            .filter(move |(k, _)| *k == kind)
            .map(|(_, target)| *target)
    }
}

/// Groups `routes` by query, keeping first-seen order.
///
/// # Errors
///
/// Returns [`PathError`] for the first route with an invalid collection.
pub fn plan(routes: &[FeedRoute]) -> Result<Vec<FeedPlan>, PathError> {
    let mut plans: Vec<FeedPlan> = Vec::new();
    for route in routes {
        let query = route.query()?;
        let entry = (route.kind, route.target);
        match plans.iter_mut().find(|p| p.query == query) {
            Some(existing) => existing.targets.push(entry),
            None => plans.push(FeedPlan {
                query,
                targets: vec![entry],
            }),
        }
    }
    Ok(plans)
}
