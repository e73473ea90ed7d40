//! Shared catalog state
//!
//! Readers always see one complete snapshot. A reload builds a new snapshot
//! off to the side and swaps it in under the write lock, so a concurrent
//! lookup never observes a half-populated catalog.

use crate::core::types::{is_composite, last_segment, ActionId, ACTION_NOT_FOUND, PATH_SEPARATOR};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

/// One reachable leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub action_id: ActionId,
    /// `"<level-1 group>-<leaf>"`
    pub full_path: String,
}

/// Immutable leaf-name → entry map in catalog order
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: IndexMap<String, CatalogEntry>,
}

impl CatalogSnapshot {
    /// Insert a leaf; a repeated name replaces the earlier entry in place
    pub fn insert(&mut self, name: String, action_id: ActionId, full_path: String) {
        let entry = CatalogEntry {
            action_id,
            full_path,
        };
        if let Some(previous) = self.entries.insert(name.clone(), entry) {
            tracing::debug!(
                leaf = %name,
                replaced = %previous.full_path,
                "Duplicate leaf name, keeping the later entry"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn leaf_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn action_id(&self, name: &str) -> Option<ActionId> {
        self.entries.get(name).map(|entry| entry.action_id)
    }

    pub fn full_path(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.full_path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CatalogEntry)> {
        self.entries.iter()
    }
}

/// The process-wide current catalog
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot; cheap to clone and safe to hold across awaits
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a complete snapshot, returning the leaf names it holds
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Vec<String> {
        let names = snapshot.leaf_names();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
        names
    }

    pub fn leaf_names(&self) -> Vec<String> {
        self.snapshot().leaf_names()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Action id of a bare leaf name or a `group-leaf` composite.
    ///
    /// The name itself is tried first, so leaf titles containing the
    /// separator still resolve. Unknown names yield `ACTION_NOT_FOUND`.
    pub fn action_id(&self, name: &str) -> ActionId {
        let snapshot = self.snapshot();
        lookup_keys(name)
            .find_map(|key| snapshot.action_id(key))
            .unwrap_or(ACTION_NOT_FOUND)
    }

    /// Full path of a leaf. An unknown name that is already a composite
    /// path is returned as is.
    pub fn full_path(&self, name: &str) -> Option<String> {
        if let Some(path) = self.snapshot().full_path(name) {
            return Some(path.to_string());
        }
        is_composite(name).then(|| name.to_string())
    }
}

/// Candidate keys for a name: itself, then for a composite the part after
/// the group, then the final segment
fn lookup_keys(name: &str) -> impl Iterator<Item = &str> {
    let after_group = name.split_once(PATH_SEPARATOR).map(|(_, rest)| rest);
    let last = is_composite(name).then(|| last_segment(name));
    std::iter::once(name).chain(after_group).chain(last)
}
