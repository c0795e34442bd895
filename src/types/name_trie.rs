//! Longest-prefix lookup over hierarchical names.
//!
//! Used to pick the most specific declared name type for a constant: given
//! a collection of declared name-prefix types (e.g. `/org`, `/org/eng`),
//! [`NameTrie::longest_prefix`] returns the deepest one that is a prefix of
//! (or equal to) the queried name.

use crate::term::Name;
use ahash::AHashMap;

#[derive(Debug, Default)]
struct Node {
    children: AHashMap<String, Node>,
    /// `true` if a name type terminates exactly at this node.
    terminal: bool,
}

/// A trie over `/`-separated name path segments.
#[derive(Debug, Default)]
pub struct NameTrie {
    root: Node,
}

impl NameTrie {
    /// An empty trie.
    pub fn new() -> Self {
        NameTrie::default()
    }

    /// Insert a declared name type, e.g. `/org/eng`.
    pub fn insert(&mut self, name: &Name) {
        let mut node = &mut self.root;
        for part in name.parts() {
            node = node.children.entry(part.to_string()).or_default();
        }
        node.terminal = true;
    }

    /// The longest inserted prefix of `name` that terminates in the trie
    /// (including `name` itself if it was inserted), expressed as a depth
    /// (number of path segments). `None` if no inserted name is a prefix.
    pub fn longest_prefix_depth(&self, name: &Name) -> Option<usize> {
        let mut node = &self.root;
        let mut best = None;
        for (depth, part) in name.parts().enumerate() {
            match node.children.get(part) {
                Some(next) => {
                    node = next;
                    if node.terminal {
                        best = Some(depth + 1);
                    }
                }
                None => break,
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    #[test]
    fn picks_the_deepest_matching_prefix() {
        let mut trie = NameTrie::new();
        trie.insert(&n("/org"));
        trie.insert(&n("/org/eng"));
        assert_eq!(trie.longest_prefix_depth(&n("/org/eng/backend")), Some(2));
        assert_eq!(trie.longest_prefix_depth(&n("/org/sales")), Some(1));
        assert_eq!(trie.longest_prefix_depth(&n("/other")), None);
    }

    #[test]
    fn exact_match_counts_as_its_own_prefix() {
        let mut trie = NameTrie::new();
        trie.insert(&n("/org/eng"));
        assert_eq!(trie.longest_prefix_depth(&n("/org/eng")), Some(2));
    }
}
