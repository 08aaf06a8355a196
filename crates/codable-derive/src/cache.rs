//! Memoized namespace trees.
//!
//! Expansion of the same container inputs always yields the same tree, so
//! trees are cached across macro invocations in this compiler process. Only
//! span-free data is cached.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::namespace::{KeyInput, NamespaceTree};

/// Canonical text form of a cache key's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(root_enum: &str, inputs: &[KeyInput]) -> Self {
        Self(format!("{root_enum}|{inputs:?}"))
    }
}

/// Thread-safe memo table. Values are computed outside the lock; when two
/// threads race, the first insert wins and both get that value.
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash, V> MemoCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some(hit) = self.lock().get(&key) {
            return Arc::clone(hit);
        }
        let value = Arc::new(compute());
        Arc::clone(self.lock().entry(key).or_insert(value))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Arc<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K: Eq + Hash, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lives as long as the compiler process and never evicts. The entry count
/// is bounded by the distinct key layouts expanded in one crate, and the
/// process exits when that crate finishes compiling.
static TREES: Lazy<MemoCache<Fingerprint, NamespaceTree>> = Lazy::new(MemoCache::new);

pub fn namespace_tree(root_enum: &str, inputs: &[KeyInput]) -> Arc<NamespaceTree> {
    TREES.get_or_insert_with(Fingerprint::new(root_enum, inputs), || {
        NamespaceTree::build(root_enum, inputs)
    })
}
