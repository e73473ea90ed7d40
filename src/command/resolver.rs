//! Target resolution - converts authorized leaf names to navigation targets

use crate::catalog::CatalogStore;
use crate::core::types::{parent_name, ActionId};

/// A leaf resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatch {
    pub leaf_name: String,
    pub full_path: String,
    pub action_id: ActionId,
    /// Level-1 group, when the full path has one
    pub parent_name: Option<String>,
    pub path_source: PathSource,
}

/// Where a target's full path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    Recorded,
    BareName,
}

/// One target to open, or several to choose from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Single(TargetMatch),
    Multiple(Vec<TargetMatch>),
}

/// Resolves leaf names through the current catalog snapshot
pub struct TargetResolver<'a> {
    store: &'a CatalogStore,
}

impl<'a> TargetResolver<'a> {
    pub fn new(store: &'a CatalogStore) -> Self {
        Self { store }
    }

    /// `None` for an empty survivor list
    pub fn resolve(&self, survivors: &[String]) -> Option<Resolution> {
        match survivors {
            [] => None,
            [only] => Some(Resolution::Single(self.resolve_leaf(only))),
            many => Some(Resolution::Multiple(
                many.iter().map(|leaf| self.resolve_leaf(leaf)).collect(),
            )),
        }
    }

    pub fn resolve_leaf(&self, leaf: &str) -> TargetMatch {
        let (full_path, path_source) = match self.store.full_path(leaf) {
            Some(path) => (path, PathSource::Recorded),
            None => (leaf.to_string(), PathSource::BareName),
        };
        let action_id = self.store.action_id(leaf);
        let parent = parent_name(&full_path).map(str::to_string);

        TargetMatch {
            leaf_name: leaf.to_string(),
            full_path,
            action_id,
            parent_name: parent,
            path_source,
        }
    }
}
