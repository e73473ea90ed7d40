//! Permission filtering of matched leaves
//!
//! The filter holds no policy of its own. It intersects candidates with the
//! set an `AuthorizationSource` says the identity may use.

use crate::catalog::CatalogLoader;
use crate::core::types::DepartmentId;
use ahash::AHashSet;
use async_trait::async_trait;
use std::sync::Arc;

/// Who decides which leaves an identity may act on
#[async_trait]
pub trait AuthorizationSource: Send + Sync {
    async fn authorized_leaves(
        &self,
        identity: &str,
        department_id: Option<DepartmentId>,
    ) -> Vec<String>;
}

/// The directory service only returns what the identity may see, so a
/// catalog load scoped to the identity is its authorized set
#[async_trait]
impl AuthorizationSource for CatalogLoader {
    async fn authorized_leaves(
        &self,
        identity: &str,
        department_id: Option<DepartmentId>,
    ) -> Vec<String> {
        self.load_catalog(identity, department_id)
            .await
            .into_leaves()
    }
}

pub struct PermissionFilter {
    source: Arc<dyn AuthorizationSource>,
}

impl PermissionFilter {
    pub fn new(source: Arc<dyn AuthorizationSource>) -> Self {
        Self { source }
    }

    /// Order-preserving intersection of `candidates` with the authorized set
    pub async fn filter(
        &self,
        identity: &str,
        candidates: &[String],
        department_id: Option<DepartmentId>,
    ) -> Vec<String> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let authorized: AHashSet<String> = self
            .source
            .authorized_leaves(identity, department_id)
            .await
            .into_iter()
            .collect();

        let allowed: Vec<String> = candidates
            .iter()
            .filter(|leaf| authorized.contains(leaf.as_str()))
            .cloned()
            .collect();

        tracing::debug!(
            identity,
            candidates = candidates.len(),
            allowed = allowed.len(),
            "Permission filter applied"
        );
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAuthority(Vec<String>);

    #[async_trait]
    impl AuthorizationSource for FixedAuthority {
        async fn authorized_leaves(
            &self,
            _identity: &str,
            _department_id: Option<DepartmentId>,
        ) -> Vec<String> {
            self.0.clone()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_intersection_keeps_candidate_order() {
        let filter = PermissionFilter::new(Arc::new(FixedAuthority(names(&["C", "A"]))));
        let allowed = filter.filter("1", &names(&["A", "B", "C"]), None).await;
        assert_eq!(allowed, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_nothing_authorized() {
        let filter = PermissionFilter::new(Arc::new(FixedAuthority(Vec::new())));
        assert!(filter.filter("1", &names(&["A"]), Some(2)).await.is_empty());
    }

    proptest::proptest! {
        #[test]
        fn filtered_is_ordered_subset(
            candidates in proptest::collection::vec("[a-e]", 0..8),
            authorized in proptest::collection::vec("[a-e]", 0..5),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let filter = PermissionFilter::new(Arc::new(FixedAuthority(authorized.clone())));
            let allowed = rt.block_on(filter.filter("1", &candidates, None));

            let mut rest = candidates.iter();
            for leaf in &allowed {
                proptest::prop_assert!(authorized.contains(leaf));
                proptest::prop_assert!(rest.any(|c| c == leaf));
            }
            let expected = candidates.iter().filter(|c| authorized.contains(*c)).count();
            proptest::prop_assert_eq!(allowed.len(), expected);
        }
    }
}
