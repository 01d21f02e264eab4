//! Writes armed to run when the client connection drops.

use lobby_core::StorePath;
use serde_json::Value;

/// What an armed hook does to its path.
#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectAction {
    Set(Value),
    Remove,
}

/// Ordered set of armed hooks, at most one per path.
#[derive(Debug, Default)]
pub struct DisconnectHooks {
    armed: Vec<(StorePath, DisconnectAction)>,
}

impl DisconnectHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `action` at `path`. Re-arming a path replaces its action and
    /// moves it to the end of the firing order.
    pub fn arm(&mut self, path: StorePath, action: DisconnectAction) {
        self.armed.retain(|(p, _)| *p != path);
        self.armed.push((path, action));
    }

    /// Disarms every hook at or below `path`. Returns how many were removed;
    /// zero is not an error.
    pub fn cancel(&mut self, path: &StorePath) -> usize {
        let before = self.armed.len();
        self.armed.retain(|(p, _)| !p.starts_with(path));
        before - self.armed.len()
    }

    /// Removes and returns all hooks in firing order.
    pub fn take_all(&mut self) -> Vec<(StorePath, DisconnectAction)> {
        std::mem::take(&mut self.armed)
    }

    #[must_use]
    pub fn is_armed(&self, path: &StorePath) -> bool {
        self.armed.iter().any(|(p, _)| p == path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.armed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[test]
    fn rearm_replaces_and_reorders() {
        let mut hooks = DisconnectHooks::new();
        hooks.arm(path("games/g1/status"), DisconnectAction::Set(json!("Abandoned")));
        hooks.arm(path("players/p1"), DisconnectAction::Remove);
        hooks.arm(path("games/g1/status"), DisconnectAction::Remove);

        let fired = hooks.take_all();
        assert_eq!(
            fired,
            vec![
                (path("players/p1"), DisconnectAction::Remove),
                (path("games/g1/status"), DisconnectAction::Remove),
            ]
        );
        assert!(hooks.is_empty());
    }

    #[test]
    fn cancel_covers_descendants() {
        let mut hooks = DisconnectHooks::new();
        hooks.arm(path("games/g1/status"), DisconnectAction::Set(json!("Abandoned")));
        hooks.arm(path("games/g2/status"), DisconnectAction::Set(json!("Abandoned")));

        assert_eq!(hooks.cancel(&path("games/g1")), 1);
        assert!(!hooks.is_armed(&path("games/g1/status")));
        assert!(hooks.is_armed(&path("games/g2/status")));
    }

    #[test]
    fn cancel_of_unarmed_path_is_a_no_op() {
        let mut hooks = DisconnectHooks::new();
        assert_eq!(hooks.cancel(&path("games/g1/status")), 0);
        hooks.arm(path("players/p1"), DisconnectAction::Remove);
        hooks.take_all();
        assert_eq!(hooks.cancel(&path("players/p1")), 0);
    }
}
