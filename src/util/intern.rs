//! String interning for artifact paths.
//!
//! Artifact identity is pointer identity on the interned path, which makes
//! the deduplication performed at every action boundary an O(1) comparison
//! and keeps cloned artifact references free.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

static INTERNER: LazyLock<RwLock<HashSet<&'static str>>> =
    LazyLock::new(|| RwLock::new(HashSet::new()));

/// An interned string. Two symbols with equal content share the same
/// allocation, so equality and hashing operate on the pointer.
#[derive(Clone, Copy)]
pub struct Symbol {
    inner: &'static str,
}

impl Symbol {
    /// Intern a string, returning the canonical symbol for its content.
    pub fn new(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();

        // Fast path: already interned, read lock only.
        {
            let interner = INTERNER.read().unwrap();
            if let Some(&interned) = interner.get(s) {
                return Symbol { inner: interned };
            }
        }

        let mut interner = INTERNER.write().unwrap();

        // Re-check after acquiring the write lock.
        if let Some(&interned) = interner.get(s) {
            return Symbol { inner: interned };
        }

        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        interner.insert(leaked);

        Symbol { inner: leaked }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.inner
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PartialEq for Symbol {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.inner.as_ptr() as usize).hash(state);
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(other.inner)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        self.inner
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.inner
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inner)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::new(s)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.inner)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_content_same_pointer() {
        let a = Symbol::new("bin/app/_objs/foo.o");
        let b = Symbol::new(String::from("bin/app/_objs/foo.o"));
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }

    #[test]
    fn test_different_content_not_equal() {
        let a = Symbol::new("a.o");
        let b = Symbol::new("b.o");
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordering_is_by_content() {
        let a = Symbol::new("aaa");
        let b = Symbol::new("bbb");
        assert!(a < b);
    }

    #[test]
    fn test_serde_round_trip() {
        let s = Symbol::new("lib/libfoo.a");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"lib/libfoo.a\"");
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
