//! Catalog and keyword clients against a throwaway HTTP server

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use menu_intent::catalog::{
    CatalogLoader, CatalogScope, CatalogStore, DirectoryService, HttpDirectoryService, TreeShape,
};
use menu_intent::core::error::MenuError;
use menu_intent::core::types::EXCLUDED_GROUP;
use menu_intent::keywords::{HttpKeywordSource, KeywordIndexer, KeywordSource};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Seen {
    bodies: Mutex<Vec<Value>>,
    cookies: Mutex<Vec<Option<String>>>,
}

fn record(seen: &Seen, headers: &HeaderMap, body: Value) {
    seen.bodies.lock().unwrap().push(body);
    seen.cookies.lock().unwrap().push(
        headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
}

async fn load_menus(
    State(seen): State<Arc<Seen>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&seen, &headers, body);
    Json(json!({
        "dataList": [
            { "title": "Canteen Management", "children": [
                { "title": "Operations", "children": [
                    { "title": "Stalls", "action": 1502 },
                    { "title": "Dishes", "action": 1503 }
                ]}
            ]}
        ]
    }))
}

async fn cache_menus_keys(
    State(seen): State<Arc<Seen>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&seen, &headers, body);
    Json(json!({
        "result": { "dataList": [ { "Stalls": ["booth", "counter"] } ] }
    }))
}

async fn spawn_directory() -> (SocketAddr, Arc<Seen>) {
    let seen = Arc::new(Seen::default());
    let app = Router::new()
        .route("/api/v1/menu/load_menus", post(load_menus))
        .route("/api/v1/menu/cache_menus_keys", post(cache_menus_keys))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, seen)
}

#[tokio::test]
async fn test_http_directory_request_and_parse() {
    let (addr, seen) = spawn_directory().await;
    let directory = HttpDirectoryService::new(
        &format!("http://{}/", addr),
        Some("session=abc".into()),
        Duration::from_secs(5),
    )
    .unwrap();
    let loader = CatalogLoader::new(Arc::new(CatalogStore::new()), Arc::new(directory));

    let load = loader.load_catalog("42_web", Some(7)).await;

    assert!(load.is_fresh());
    assert_eq!(load.leaves(), ["Stalls".to_string(), "Dishes".to_string()]);
    assert_eq!(
        loader.store().full_path("Dishes").as_deref(),
        Some("Canteen Management-Dishes")
    );
    assert_eq!(
        seen.bodies.lock().unwrap()[0],
        json!({"department_id": 7, "user_id": 42, "httpWithoutRpc": true})
    );
    assert_eq!(
        seen.cookies.lock().unwrap()[0].as_deref(),
        Some("session=abc")
    );
}

#[tokio::test]
async fn test_unreachable_directory_is_stale() {
    let directory = HttpDirectoryService::new(
        "http://127.0.0.1:1",
        None,
        Duration::from_millis(500),
    )
    .unwrap();
    let err = directory
        .fetch_tree(&CatalogScope::new("1", None))
        .await
        .unwrap_err();
    assert!(matches!(err, MenuError::Upstream(_)), "{:?}", err);

    let loader = CatalogLoader::new(Arc::new(CatalogStore::new()), Arc::new(directory));
    let load = loader.load_catalog("1", None).await;
    assert!(!load.is_fresh());
    assert!(load.leaves().is_empty());
}

#[tokio::test]
async fn test_http_keyword_source_merges_into_index() {
    let (addr, seen) = spawn_directory().await;
    let source: Arc<dyn KeywordSource> = Arc::new(
        HttpKeywordSource::new(&format!("http://{}", addr), None, Duration::from_secs(5)).unwrap(),
    );

    let leaves = vec!["Stalls".to_string(), "Dishes".to_string()];
    let index = KeywordIndexer::new(Some(source)).build_keywords(&leaves).await;

    let keywords = index.keywords("Stalls");
    assert!(keywords.contains(&"Stalls".to_string()));
    assert!(keywords.contains(&"booth".to_string()));
    assert!(keywords.contains(&"counter".to_string()));
    assert_eq!(index.keywords("Dishes"), ["Dishes".to_string()]);
    assert_eq!(
        seen.bodies.lock().unwrap()[0],
        json!({"menus": ["Stalls", "Dishes"]})
    );
    assert_eq!(seen.cookies.lock().unwrap()[0], None);
}

fn group(title: String, leaves: Vec<String>) -> Value {
    let leaf_nodes: Vec<Value> = leaves
        .iter()
        .enumerate()
        .map(|(i, leaf)| json!({"title": leaf, "action": i as i64 + 1}))
        .collect();
    json!({
        "title": title,
        "children": [ { "title": "Section", "children": leaf_nodes } ]
    })
}

proptest! {
    #[test]
    fn excluded_group_never_reaches_catalog(
        visible in prop::collection::vec("[a-m]{1,6}", 0..5),
        hidden in prop::collection::vec("[n-z]{1,6}", 1..5),
        excluded_first in any::<bool>(),
    ) {
        let mut groups = vec![
            group("Visible".into(), visible.clone()),
            group(EXCLUDED_GROUP.into(), hidden.clone()),
        ];
        if excluded_first {
            groups.reverse();
        }

        let snapshot = TreeShape::classify(json!({ "dataList": groups }))
            .into_snapshot()
            .unwrap();

        for leaf in &hidden {
            prop_assert!(!snapshot.contains(leaf));
        }
        for leaf in &visible {
            prop_assert!(snapshot.contains(leaf));
        }
    }
}
