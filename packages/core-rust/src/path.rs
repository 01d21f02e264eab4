//! Slash-separated locations inside the document store.
//!
//! A [`StorePath`] addresses a node of the realtime document tree, e.g.
//! `games/-Nx3kQ.../joinRequests`. The root is the empty path. Segments are
//! validated once at construction so every path handed to a store is
//! well-formed.

use std::fmt;
use std::str::FromStr;

/// Characters the hosted realtime tree refuses inside a key.
const FORBIDDEN: [char; 5] = ['.', '#', '$', '[', ']'];

/// Errors raised while building a [`StorePath`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path segment must not be empty")]
    EmptySegment,
    #[error("path segment {segment:?} contains forbidden character {ch:?}")]
    ForbiddenCharacter { segment: String, ch: char },
}

/// Location of a node in the document tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a slash-separated path. Leading and trailing slashes are
    /// ignored, so `"/games/"` and `"games"` are the same location.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if an inner segment is empty (`"a//b"`) or
    /// contains one of `. # $ [ ]`.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut path = Self::root();
        for segment in trimmed.split('/') {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// Returns a new path one level below `self`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if `segment` is empty or contains a forbidden
    /// character. Slashes are forbidden too: a child is exactly one level.
    pub fn child(&self, segment: &str) -> Result<Self, PathError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, i.e. the key of the addressed node. `None` for root.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parents) = self.segments.split_last()?;
        Some(Self {
            segments: parents.to_vec(),
        })
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `true` if `self` equals `prefix` or lies below it.
    #[must_use]
    pub fn starts_with(&self, prefix: &StorePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Path of `self` relative to `prefix`, or `None` if `self` is not
    /// inside `prefix`.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &StorePath) -> Option<StorePath> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| StorePath {
                segments: rest.to_vec(),
            })
    }

    /// The top-level collection this path belongs to (root stays root).
    #[must_use]
    pub fn collection(&self) -> StorePath {
        StorePath {
            segments: self.segments.iter().take(1).cloned().collect(),
        }
    }
}

fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if let Some(ch) = segment
        .chars()
        .find(|c| *c == '/' || FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(PathError::ForbiddenCharacter {
            segment: segment.to_string(),
            ch,
        });
    }
    Ok(())
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl FromStr for StorePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_ignores_outer_slashes() {
        let a = StorePath::parse("/games/g1/").unwrap();
        let b = StorePath::parse("games/g1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "games/g1");
        assert_eq!(a.key(), Some("g1"));
    }

    #[test]
    fn empty_string_is_root() {
        let root = StorePath::parse("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.key(), None);
        assert_eq!(root.parent(), None);
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn rejects_empty_inner_segment() {
        assert_eq!(StorePath::parse("games//g1"), Err(PathError::EmptySegment));
    }

    #[test]
    fn rejects_forbidden_characters() {
        for bad in ["a.b", "a#b", "a$b", "a[b", "a]b"] {
            let err = StorePath::root().child(bad).unwrap_err();
            assert!(matches!(err, PathError::ForbiddenCharacter { .. }), "{bad}");
        }
        assert!(StorePath::root().child("a/b").is_err());
    }

    #[test]
    fn prefix_helpers() {
        let games = StorePath::parse("games").unwrap();
        let status = StorePath::parse("games/g1/status").unwrap();

        assert!(status.starts_with(&games));
        assert!(!games.starts_with(&status));
        assert_eq!(
            status.strip_prefix(&games),
            Some(StorePath::parse("g1/status").unwrap())
        );
        assert_eq!(games.strip_prefix(&status), None);
        assert_eq!(status.collection(), games);
        assert_eq!(status.parent().unwrap().to_string(), "games/g1");
    }

    proptest! {
        #[test]
        fn display_parse_round_trip(segments in prop::collection::vec("[A-Za-z0-9_-]{1,12}", 0..6)) {
            let raw = segments.join("/");
            let path = StorePath::parse(&raw).unwrap();
            prop_assert_eq!(path.len(), segments.len());
            prop_assert_eq!(path.to_string(), raw.clone());
            prop_assert_eq!(StorePath::parse(&path.to_string()).unwrap(), path);
        }
    }
}
