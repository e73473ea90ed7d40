//! Fetching the directory tree for an identity and refreshing the store

use crate::catalog::store::CatalogStore;
use crate::catalog::tree::TreeShape;
use crate::core::config::DirectoryConfig;
use crate::core::error::{MenuError, Result};
use crate::core::types::{directory_user_id, DepartmentId};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const LOAD_MENUS_PATH: &str = "/api/v1/menu/load_menus";

/// Who the catalog is being loaded for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogScope {
    pub identity: String,
    pub department_id: Option<DepartmentId>,
}

impl CatalogScope {
    pub fn new(identity: impl Into<String>, department_id: Option<DepartmentId>) -> Self {
        Self {
            identity: identity.into(),
            department_id,
        }
    }
}

/// Source of the raw directory tree
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn fetch_tree(&self, scope: &CatalogScope) -> Result<Value>;
}

/// Directory service reached over HTTP
pub struct HttpDirectoryService {
    client: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl HttpDirectoryService {
    pub fn new(base_url: &str, cookie: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MenuError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), LOAD_MENUS_PATH),
            cookie: cookie.filter(|c| !c.trim().is_empty()),
        })
    }

    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Some(config.cookie.clone()),
            config.catalog_timeout(),
        )
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    async fn fetch_tree(&self, scope: &CatalogScope) -> Result<Value> {
        let body = json!({
            "department_id": scope.department_id,
            "user_id": directory_user_id(&scope.identity),
            "httpWithoutRpc": true,
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?.error_for_status()?;
        let tree: Value = response.json().await?;
        Ok(tree)
    }
}

/// Outcome of a catalog load
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLoad {
    /// The store was rebuilt from a fresh response
    Fresh(Vec<String>),
    /// The fetch or parse failed; these are the previously loaded leaves
    Stale { leaves: Vec<String>, reason: String },
}

impl CatalogLoad {
    pub fn leaves(&self) -> &[String] {
        match self {
            CatalogLoad::Fresh(leaves) => leaves,
            CatalogLoad::Stale { leaves, .. } => leaves,
        }
    }

    pub fn into_leaves(self) -> Vec<String> {
        match self {
            CatalogLoad::Fresh(leaves) => leaves,
            CatalogLoad::Stale { leaves, .. } => leaves,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, CatalogLoad::Fresh(_))
    }
}

/// Loads the catalog for an identity into the shared store
pub struct CatalogLoader {
    store: Arc<CatalogStore>,
    directory: Arc<dyn DirectoryService>,
}

impl CatalogLoader {
    pub fn new(store: Arc<CatalogStore>, directory: Arc<dyn DirectoryService>) -> Self {
        Self { store, directory }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    /// Fetch, parse and install the catalog visible to `identity`.
    ///
    /// Never fails: on any upstream or parse problem the previous catalog
    /// stays installed and is reported as stale.
    pub async fn load_catalog(
        &self,
        identity: &str,
        department_id: Option<DepartmentId>,
    ) -> CatalogLoad {
        let scope = CatalogScope::new(identity, department_id);

        let body = match self.directory.fetch_tree(&scope).await {
            Ok(body) => body,
            Err(e) => return self.stale(&scope, e),
        };

        let shape = TreeShape::classify(body);
        let shape_name = shape.name();
        let Some(snapshot) = shape.into_snapshot() else {
            return self.stale(
                &scope,
                MenuError::UnrecognizedShape("directory response has no known tree".into()),
            );
        };

        let leaves = self.store.replace(snapshot);
        tracing::info!(
            identity = %scope.identity,
            department_id = ?scope.department_id,
            shape = shape_name,
            leaves = leaves.len(),
            "Catalog loaded"
        );
        CatalogLoad::Fresh(leaves)
    }

    fn stale(&self, scope: &CatalogScope, error: MenuError) -> CatalogLoad {
        let leaves = self.store.leaf_names();
        tracing::warn!(
            identity = %scope.identity,
            error = %error,
            kept = leaves.len(),
            "Catalog load failed, keeping previous catalog"
        );
        CatalogLoad::Stale {
            leaves,
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned responses in order and records each scope
    struct ScriptedDirectory {
        responses: Mutex<Vec<Result<Value>>>,
        seen: Mutex<Vec<CatalogScope>>,
    }

    impl ScriptedDirectory {
        fn new(responses: Vec<Result<Value>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DirectoryService for ScriptedDirectory {
        async fn fetch_tree(&self, scope: &CatalogScope) -> Result<Value> {
            self.seen.lock().unwrap().push(scope.clone());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn tree(leaf: &str, action: i64) -> Value {
        json!({
            "dataList": [
                { "title": "Canteen", "children": [
                    { "title": "Ops", "children": [ { "title": leaf, "action": action } ] }
                ]}
            ]
        })
    }

    #[tokio::test]
    async fn test_fresh_load_replaces_store() {
        let directory = Arc::new(ScriptedDirectory::new(vec![Ok(tree("Stalls", 1502))]));
        let loader = CatalogLoader::new(Arc::new(CatalogStore::new()), directory.clone());

        let load = loader.load_catalog("42_x", Some(3)).await;

        assert_eq!(load, CatalogLoad::Fresh(vec!["Stalls".to_string()]));
        assert_eq!(loader.store().action_id("Stalls"), 1502);
        assert_eq!(
            directory.seen.lock().unwrap()[0],
            CatalogScope::new("42_x", Some(3))
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_catalog() {
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Ok(tree("Stalls", 1502)),
            Err(MenuError::Upstream("connection refused".into())),
        ]));
        let loader = CatalogLoader::new(Arc::new(CatalogStore::new()), directory);

        assert!(loader.load_catalog("1", None).await.is_fresh());
        let second = loader.load_catalog("1", None).await;

        assert!(!second.is_fresh());
        assert_eq!(second.leaves(), ["Stalls".to_string()]);
        assert_eq!(loader.store().action_id("Stalls"), 1502);
    }

    #[tokio::test]
    async fn test_unrecognized_shape_is_stale() {
        let directory = Arc::new(ScriptedDirectory::new(vec![Ok(json!({"returnCode": 500}))]));
        let loader = CatalogLoader::new(Arc::new(CatalogStore::new()), directory);

        let load = loader.load_catalog("1", None).await;

        match load {
            CatalogLoad::Stale { leaves, reason } => {
                assert!(leaves.is_empty());
                assert!(reason.contains("Unrecognized"));
            }
            other => panic!("expected stale load, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_tree_clears_catalog() {
        let directory = Arc::new(ScriptedDirectory::new(vec![
            Ok(tree("Stalls", 1502)),
            Ok(json!({"dataList": []})),
        ]));
        let loader = CatalogLoader::new(Arc::new(CatalogStore::new()), directory);

        loader.load_catalog("1", None).await;
        let load = loader.load_catalog("1", None).await;

        assert_eq!(load, CatalogLoad::Fresh(Vec::new()));
        assert!(loader.store().is_empty());
    }
}
