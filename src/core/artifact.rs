//! Artifacts and structurally shared dependency sets.
//!
//! An [`Artifact`] is a file reference by execution path. Identity is the
//! interned path, so the same logical file referenced from two places
//! compares equal in O(1), which every deduplication step relies on.
//!
//! A [`DepSet`] holds large transitive collections (headers, libraries)
//! without flattening them per unit: each node owns its direct items and
//! shares its children behind `Arc`. Flattening happens only at the edges
//! where an action's declared inputs or a command line is materialized, and
//! always yields the same first-seen order for the same structure.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::util::Symbol;

/// A file reference by execution path, with O(1) identity comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact {
    path: Symbol,
}

impl Artifact {
    pub fn new(path: impl AsRef<str>) -> Self {
        Artifact {
            path: Symbol::new(path),
        }
    }

    /// The execution path as a string.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.path.as_str()
    }

    pub fn as_path(&self) -> &'static Path {
        Path::new(self.as_str())
    }

    /// Final path component.
    pub fn file_name(&self) -> &'static str {
        match self.as_str().rfind('/') {
            Some(idx) => &self.as_str()[idx + 1..],
            None => self.as_str(),
        }
    }

    /// Containing directory, or "" for a bare file name.
    pub fn parent_dir(&self) -> &'static str {
        match self.as_str().rfind('/') {
            Some(idx) => &self.as_str()[..idx],
            None => "",
        }
    }

    /// File extension without the dot, or "" if there is none.
    pub fn extension(&self) -> &'static str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[idx + 1..],
            _ => "",
        }
    }
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Artifact({})", self.as_str())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Artifact {
    fn from(s: &str) -> Self {
        Artifact::new(s)
    }
}

/// A persistent nested set with structural sharing.
///
/// Cloning is an `Arc` bump; building a parent set from child sets does not
/// copy the children. Iteration order is direct items first, then children
/// in insertion order, depth first, deduplicated by first occurrence.
#[derive(Debug, Clone)]
pub struct DepSet<T> {
    node: Arc<Node<T>>,
}

#[derive(Debug)]
struct Node<T> {
    direct: Vec<T>,
    children: Vec<DepSet<T>>,
}

impl<T: Clone + Eq + Hash> DepSet<T> {
    pub fn empty() -> Self {
        DepSet {
            node: Arc::new(Node {
                direct: Vec::new(),
                children: Vec::new(),
            }),
        }
    }

    pub fn of(items: impl IntoIterator<Item = T>) -> Self {
        DepSet::builder().add_all(items).build()
    }

    pub fn builder() -> DepSetBuilder<T> {
        DepSetBuilder {
            direct: Vec::new(),
            children: Vec::new(),
        }
    }

    /// True if neither this node nor any child carries an item.
    pub fn is_empty(&self) -> bool {
        self.node.direct.is_empty() && self.node.children.iter().all(DepSet::is_empty)
    }

    /// Flatten to a deduplicated vector in deterministic first-seen order.
    pub fn to_vec(&self) -> Vec<T> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.collect_into(&mut seen, &mut out);
        out
    }

    pub fn contains(&self, item: &T) -> bool {
        self.node.direct.contains(item) || self.node.children.iter().any(|c| c.contains(item))
    }

    fn collect_into(&self, seen: &mut HashSet<T>, out: &mut Vec<T>) {
        for item in &self.node.direct {
            if seen.insert(item.clone()) {
                out.push(item.clone());
            }
        }
        for child in &self.node.children {
            child.collect_into(seen, out);
        }
    }
}

impl<T: Clone + Eq + Hash> Default for DepSet<T> {
    fn default() -> Self {
        DepSet::empty()
    }
}

/// Builder for [`DepSet`].
pub struct DepSetBuilder<T> {
    direct: Vec<T>,
    children: Vec<DepSet<T>>,
}

impl<T: Clone + Eq + Hash> DepSetBuilder<T> {
    pub fn add(mut self, item: T) -> Self {
        self.direct.push(item);
        self
    }

    pub fn add_all(mut self, items: impl IntoIterator<Item = T>) -> Self {
        self.direct.extend(items);
        self
    }

    pub fn add_transitive(mut self, child: DepSet<T>) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(self) -> DepSet<T> {
        DepSet {
            node: Arc::new(Node {
                direct: self.direct,
                children: self.children,
            }),
        }
    }
}
