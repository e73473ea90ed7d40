//! External keyword service client
//!
//! The service answers with one of several payload layouts. `KeywordPayload`
//! names each of them; malformed entries are dropped one at a time.

use crate::core::config::DirectoryConfig;
use crate::core::error::{MenuError, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;

const CACHE_MENUS_KEYS_PATH: &str = "/api/v1/menu/cache_menus_keys";

/// Keywords for one leaf as returned by the service
pub type KeywordEntry = (String, Vec<String>);

/// Batch keyword lookup
#[async_trait]
pub trait KeywordSource: Send + Sync {
    async fn fetch_keywords(&self, leaf_names: &[String]) -> Result<Vec<KeywordEntry>>;
}

/// Payload layouts found under the response envelope
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordPayload {
    /// `[{name: [kw]}, {"menu": name, "keywords": [kw]}, ...]`
    EntryList(Vec<Value>),
    /// `{name: [kw], ...}`
    NameMap(Map<String, Value>),
    Unrecognized,
}

impl KeywordPayload {
    /// Unwrap `{"result": {"dataList": ..}}`, `{"dataList": ..}` or `{"data": ..}`
    pub fn from_envelope(body: Value) -> Self {
        let Value::Object(mut envelope) = body else {
            return KeywordPayload::Unrecognized;
        };

        let payload = match envelope.remove("result") {
            Some(Value::Object(mut result)) => result.remove("dataList"),
            _ => envelope
                .remove("dataList")
                .or_else(|| envelope.remove("data")),
        };

        match payload {
            Some(Value::Array(items)) => KeywordPayload::EntryList(items),
            Some(Value::Object(map)) => KeywordPayload::NameMap(map),
            _ => KeywordPayload::Unrecognized,
        }
    }

    pub fn into_entries(self) -> Vec<KeywordEntry> {
        match self {
            KeywordPayload::EntryList(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => list_item_entry(map),
                    _ => None,
                })
                .collect(),
            KeywordPayload::NameMap(map) => map
                .into_iter()
                .filter_map(|(name, value)| entry(name, &value))
                .collect(),
            KeywordPayload::Unrecognized => Vec::new(),
        }
    }
}

fn list_item_entry(mut item: Map<String, Value>) -> Option<KeywordEntry> {
    if item.len() == 1 {
        let (name, value) = item.into_iter().next()?;
        return entry(name, &value);
    }
    let name = match item.remove("menu") {
        Some(Value::String(name)) => name,
        _ => return None,
    };
    entry(name, item.get("keywords")?)
}

fn entry(name: String, value: &Value) -> Option<KeywordEntry> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let keywords = clean_keywords(value.as_array()?);
    if keywords.is_empty() {
        return None;
    }
    Some((name, keywords))
}

/// Strings and integers only, trimmed, empties dropped
pub fn clean_keywords(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        })
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// Keyword service reached over HTTP
pub struct HttpKeywordSource {
    client: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl HttpKeywordSource {
    pub fn new(base_url: &str, cookie: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MenuError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                CACHE_MENUS_KEYS_PATH
            ),
            cookie: cookie.filter(|c| !c.trim().is_empty()),
        })
    }

    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Some(config.cookie.clone()),
            config.keyword_timeout(),
        )
    }
}

#[async_trait]
impl KeywordSource for HttpKeywordSource {
    async fn fetch_keywords(&self, leaf_names: &[String]) -> Result<Vec<KeywordEntry>> {
        if leaf_names.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(url = %self.url, menus = leaf_names.len(), "Requesting menu keywords");

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&json!({ "menus": leaf_names }));
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?.error_for_status()?;
        let body: Value = response.json().await?;

        let payload = KeywordPayload::from_envelope(body);
        if payload == KeywordPayload::Unrecognized {
            return Err(MenuError::UnrecognizedShape(
                "keyword response has no dataList".into(),
            ));
        }
        Ok(payload.into_entries())
    }
}
