use std::collections::BTreeSet;

use lobby_core::StorePath;

use super::error::StoreError;

/// Write permissions per top-level collection.
///
/// Stand-in for hosted security rules: every collection is writable unless
/// marked read-only. A root write touches every collection and is denied
/// as soon as any one is read-only.
#[derive(Debug, Clone, Default)]
pub struct WriteRules {
    read_only: BTreeSet<String>,
}

impl WriteRules {
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn read_only<I, S>(collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            read_only: collections.into_iter().map(Into::into).collect(),
        }
    }

    pub fn deny(&mut self, collection: &str) {
        self.read_only.insert(collection.to_string());
    }

    pub fn allow(&mut self, collection: &str) {
        self.read_only.remove(collection);
    }

    /// # Errors
    ///
    /// Returns [`StoreError::PermissionDenied`] if `path` falls in a
    /// read-only collection.
    pub fn check(&self, path: &StorePath) -> Result<(), StoreError> {
        let denied = match path.segments().first() {
            Some(collection) => self.read_only.contains(collection),
            None => !self.read_only.is_empty(),
        };
        if denied {
            Err(StoreError::PermissionDenied {
                path: path.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[test]
    fn default_allows_everything() {
        let rules = WriteRules::allow_all();
        assert!(rules.check(&path("games/g1")).is_ok());
        assert!(rules.check(&StorePath::root()).is_ok());
    }

    #[test]
    fn read_only_collection_denies_nested_writes() {
        let rules = WriteRules::read_only(["chat"]);
        assert_eq!(
            rules.check(&path("chat/c1/text")),
            Err(StoreError::PermissionDenied {
                path: "chat/c1/text".to_string()
            })
        );
        assert!(rules.check(&path("games/g1")).is_ok());
        assert!(rules.check(&StorePath::root()).is_err());
    }

    #[test]
    fn allow_lifts_a_denial() {
        let mut rules = WriteRules::allow_all();
        rules.deny("games");
        assert!(rules.check(&path("games")).is_err());
        rules.allow("games");
        assert!(rules.check(&path("games")).is_ok());
    }
}
