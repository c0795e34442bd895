//! Hierarchical name symbols (`/a/b/c`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A hierarchical symbol of the form `/part1/part2/...`, ordered by strict prefix.
///
/// Names back both `Constant::Name` values and the name-prefix types of the
/// type system (`/foo` accepts any name strictly longer, like `/foo/bar`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Name(Arc<str>);

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <Arc<str>>::deserialize(deserializer)?;
        Name::new(s).map_err(serde::de::Error::custom)
    }
}

impl Name {
    /// Parse a name from its canonical textual form, e.g. `/a/b/c`.
    pub fn new(symbol: impl Into<Arc<str>>) -> Result<Self> {
        let s: Arc<str> = symbol.into();
        if !s.starts_with('/') {
            return Err(Error::MalformedType(format!(
                "name must start with '/': {s}"
            )));
        }
        if s.as_bytes().windows(2).any(|w| w == b"//") || s.ends_with('/') && s.as_ref() != "/" {
            return Err(Error::MalformedType(format!(
                "name has an empty path segment: {s}"
            )));
        }
        Ok(Name(s))
    }

    /// The canonical textual form, e.g. `/a/b/c`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `/`-separated path segments, excluding the leading empty segment.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.parts().count()
    }

    /// `self` is a *strict* prefix of `other`, i.e. `other` has at least one
    /// more path segment than `self` and agrees with it up to that point.
    /// This is the membership rule for name-prefix types: `/p` accepts any
    /// `/p/...` that is strictly longer.
    pub fn is_strict_prefix_of(&self, other: &Name) -> bool {
        let this = self.0.as_ref();
        let that = other.0.as_ref();
        that.len() > this.len() && that.starts_with(this) && that.as_bytes()[this.len()] == b'/'
    }

    /// `self` is `other`, or a strict prefix of it (the relation used by
    /// `type_conforms` for name types: `L <= R` iff `L.symbol` starts with
    /// `R.symbol`).
    pub fn is_prefix_of_or_eq(&self, other: &Name) -> bool {
        self == other || self.is_strict_prefix_of(other)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Name::new(Arc::<str>::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_names() {
        let n = Name::new("/a/b/c").unwrap();
        assert_eq!(n.parts().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(n.depth(), 3);
    }

    #[test]
    fn rejects_malformed_names() {
        assert!(Name::new("a/b").is_err());
        assert!(Name::new("/a//b").is_err());
        assert!(Name::new("/a/b/").is_err());
    }

    #[test]
    fn strict_prefix_requires_full_segment() {
        let p = Name::new("/foo").unwrap();
        let child = Name::new("/foo/bar").unwrap();
        let sibling = Name::new("/foobar").unwrap();
        assert!(p.is_strict_prefix_of(&child));
        assert!(!p.is_strict_prefix_of(&sibling));
        assert!(!p.is_strict_prefix_of(&p));
        assert!(p.is_prefix_of_or_eq(&p));
    }
}
