use crate::core::types::{is_composite, last_segment};
use crate::keywords::extract::extract_all;
use crate::keywords::remote::{KeywordEntry, KeywordSource};
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;

/// Leaf name → ordered, de-duplicated keywords
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: AHashMap<String, Vec<String>>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keywords of a leaf; empty if the leaf is not indexed
    pub fn keywords(&self, leaf: &str) -> &[String] {
        self.entries.get(leaf).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_leaf(&self, leaf: &str) -> bool {
        self.entries.contains_key(leaf)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace a leaf's keywords outright
    pub fn insert(&mut self, leaf: impl Into<String>, keywords: Vec<String>) {
        self.entries.insert(leaf.into(), keywords);
    }

    /// Append keywords not already present for `leaf`
    pub fn merge(&mut self, leaf: &str, keywords: &[String]) {
        let list = self.entries.entry(leaf.to_string()).or_default();
        let mut seen: AHashSet<String> = list.iter().cloned().collect();
        for keyword in keywords {
            let keyword = keyword.trim();
            if !keyword.is_empty() && seen.insert(keyword.to_string()) {
                list.push(keyword.to_string());
            }
        }
    }
}

/// Builds the per-request keyword index
pub struct KeywordIndexer {
    source: Option<Arc<dyn KeywordSource>>,
}

impl KeywordIndexer {
    pub fn new(source: Option<Arc<dyn KeywordSource>>) -> Self {
        Self { source }
    }

    /// Local extraction only
    pub fn local_only() -> Self {
        Self { source: None }
    }

    /// Local keywords for every leaf, plus whatever the keyword service
    /// returns. Never fails: a service error leaves the local keywords.
    pub async fn build_keywords(&self, leaf_names: &[String]) -> KeywordIndex {
        let mut index = KeywordIndex::new();
        if leaf_names.is_empty() {
            return index;
        }

        for (leaf, keywords) in extract_all(leaf_names) {
            index.insert(leaf, keywords);
        }

        let Some(source) = &self.source else {
            return index;
        };

        match source.fetch_keywords(leaf_names).await {
            Ok(external) => {
                tracing::debug!(entries = external.len(), "Merging external keywords");
                merge_external(&mut index, external);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Keyword service unavailable, using local keywords");
            }
        }

        index
    }
}

/// Merge service keywords into the exact leaf and, for a composite name,
/// into its final segment too
pub fn merge_external(index: &mut KeywordIndex, external: Vec<KeywordEntry>) {
    for (name, keywords) in external {
        let name = name.trim();
        if name.is_empty() || keywords.is_empty() {
            continue;
        }
        index.merge(name, &keywords);
        if is_composite(name) {
            let last = last_segment(name).trim();
            if !last.is_empty() {
                index.merge(last, &keywords);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{MenuError, Result};
    use async_trait::async_trait;

    struct FixedSource(Vec<KeywordEntry>);

    #[async_trait]
    impl KeywordSource for FixedSource {
        async fn fetch_keywords(&self, _leaf_names: &[String]) -> Result<Vec<KeywordEntry>> {
            Ok(self.0.clone())
        }
    }

    struct DownSource;

    #[async_trait]
    impl KeywordSource for DownSource {
        async fn fetch_keywords(&self, _leaf_names: &[String]) -> Result<Vec<KeywordEntry>> {
            Err(MenuError::Upstream("timed out".into()))
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_external_keywords_are_appended() {
        let source = FixedSource(vec![(
            "Delivery Orders".to_string(),
            names(&["delivery", "Delivery Orders", "dispatch"]),
        )]);
        let indexer = KeywordIndexer::new(Some(Arc::new(source)));

        let index = indexer.build_keywords(&names(&["Delivery Orders"])).await;

        assert_eq!(
            index.keywords("Delivery Orders"),
            names(&["Delivery Orders", "delivery", "dispatch"]).as_slice()
        );
    }

    #[tokio::test]
    async fn test_composite_name_also_feeds_last_segment() {
        let source = FixedSource(vec![(
            "Canteen-Stalls".to_string(),
            names(&["booth"]),
        )]);
        let indexer = KeywordIndexer::new(Some(Arc::new(source)));

        let index = indexer.build_keywords(&names(&["Stalls"])).await;

        assert_eq!(index.keywords("Stalls"), names(&["Stalls", "booth"]).as_slice());
        assert_eq!(index.keywords("Canteen-Stalls"), names(&["booth"]).as_slice());
    }

    #[tokio::test]
    async fn test_service_failure_keeps_local_keywords() {
        let indexer = KeywordIndexer::new(Some(Arc::new(DownSource)));
        let index = indexer.build_keywords(&names(&["Menu Management"])).await;
        assert_eq!(
            index.keywords("Menu Management"),
            names(&["Menu Management", "Menu"]).as_slice()
        );
    }

    #[tokio::test]
    async fn test_every_leaf_has_its_own_name() {
        let indexer = KeywordIndexer::local_only();
        let leaves = names(&["Stalls", "巡检记录", "A-B"]);
        let index = indexer.build_keywords(&leaves).await;
        for leaf in &leaves {
            assert!(index.keywords(leaf).contains(leaf));
        }
    }

    #[test]
    fn test_unknown_leaf_has_no_keywords() {
        assert!(KeywordIndex::new().keywords("nothing").is_empty());
    }
}
