//! Service configuration with documented constants
//!
//! All tuned numbers live here with an explanation of what they control.
//! Values load from built-in defaults, then an optional TOML file, then
//! environment overrides for deployment-specific endpoints and secrets.

use crate::core::error::{MenuError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub directory: DirectoryConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub keyword_scoring: KeywordScoringConfig,
    pub vector: VectorConfig,
    /// Identity used when neither the request nor the caller supplies one
    pub default_identity: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            directory: DirectoryConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            keyword_scoring: KeywordScoringConfig::default(),
            vector: VectorConfig::default(),
            default_identity: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `"*"` allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Directory (menu tree) and keyword service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL shared by the tree and keyword endpoints
    pub base_url: String,
    /// Raw `Cookie` header forwarded to both endpoints (empty = none)
    pub cookie: String,
    /// Timeout for a catalog fetch
    pub catalog_timeout_secs: u64,
    /// Timeout for a keyword batch request
    pub keyword_timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            cookie: String::new(),
            catalog_timeout_secs: 30,
            keyword_timeout_secs: 15,
        }
    }
}

impl DirectoryConfig {
    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }

    pub fn keyword_timeout(&self) -> Duration {
        Duration::from_secs(self.keyword_timeout_secs)
    }
}

/// Remote chat-completion model used by the remote-model strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full completion endpoint; Anthropic URLs switch the request format
    pub api_url: String,
    /// Empty disables the remote-model strategy
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Replies are a short list of names, so this stays small
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 30,
            temperature: 0.3,
            max_tokens: 100,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Local directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors` of a BERT-family sentence encoder
    pub model_dir: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_dir: "bge-small-zh".to_string(),
        }
    }
}

/// Weights of the lexical keyword scorer
///
/// Scores are additive per leaf. The defaults were tuned against real
/// menu catalogs; there is no derivation beyond that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordScoringConfig {
    /// Added when the utterance contains the leaf name or vice versa
    pub exact_bonus: u32,

    /// Per utterance character when a keyword contains the whole utterance
    ///
    /// At 15, a four-character utterance found inside a keyword is worth 60.
    pub contained_weight: u32,

    /// Per keyword character when the utterance contains a keyword at least
    /// as long as the utterance itself
    pub long_keyword_weight: u32,

    /// Per keyword character for keywords of `medium_keyword_min_len` or more
    pub medium_keyword_weight: u32,

    /// Per keyword character for short keywords, only while no exact hit has
    /// been recorded for the leaf
    ///
    /// Keeps generic two-character words from dominating the ranking.
    pub short_keyword_weight: u32,

    pub medium_keyword_min_len: usize,
    pub short_keyword_min_len: usize,

    /// Score gap above which only the top leaf is returned
    ///
    /// At 40, a leaf needs roughly one extra long-keyword hit over the
    /// runner-up to be considered decisive.
    pub decisive_margin: u32,
}

impl Default for KeywordScoringConfig {
    fn default() -> Self {
        Self {
            exact_bonus: 100,
            contained_weight: 15,
            long_keyword_weight: 10,
            medium_keyword_weight: 5,
            short_keyword_weight: 3,
            medium_keyword_min_len: 3,
            short_keyword_min_len: 2,
            decisive_margin: 40,
        }
    }
}

/// Thresholds of the vector-similarity strategy
///
/// Cosine similarities of normalized sentence embeddings. Short queries
/// (one or two characters) embed poorly, so they get a stricter base
/// threshold and a larger minimum result set for disambiguation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Queries up to this many characters are "short"
    pub short_query_max_len: usize,

    pub short_base_threshold: f32,
    pub short_window: f32,
    pub long_base_threshold: f32,
    pub long_window: f32,

    /// Short queries collapse to the top leaf when it scores at least this...
    pub short_collapse_min_top: f32,
    /// ...and leads the runner-up by at least this
    pub short_collapse_min_gap: f32,
    /// Below this top score a short query keeps at most `short_low_confidence_cap`
    pub short_low_confidence: f32,
    pub short_low_confidence_cap: usize,

    pub long_collapse_min_top: f32,
    pub long_collapse_min_gap: f32,

    /// Lowest threshold the relaxation step may reach
    pub relaxed_floor: f32,
    /// Relaxed threshold is `max(relaxed_floor, top - relaxed_window)`
    pub relaxed_window: f32,

    pub short_min_results: usize,
    pub long_min_results: usize,
    pub max_results: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            short_query_max_len: 2,
            short_base_threshold: 0.40,
            short_window: 0.05,
            long_base_threshold: 0.38,
            long_window: 0.05,
            short_collapse_min_top: 0.65,
            short_collapse_min_gap: 0.15,
            short_low_confidence: 0.45,
            short_low_confidence_cap: 3,
            long_collapse_min_top: 0.60,
            long_collapse_min_gap: 0.12,
            relaxed_floor: 0.35,
            relaxed_window: 0.10,
            short_min_results: 3,
            long_min_results: 1,
            max_results: 5,
        }
    }
}

impl VectorConfig {
    /// Validate internal consistency of the thresholds
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.relaxed_floor > self.short_base_threshold
            || self.relaxed_floor > self.long_base_threshold
        {
            return Err(format!(
                "relaxed_floor ({}) should be <= both base thresholds ({}, {})",
                self.relaxed_floor, self.short_base_threshold, self.long_base_threshold
            ));
        }

        if self.short_min_results > self.max_results || self.long_min_results > self.max_results {
            return Err(format!(
                "result floors ({}, {}) should be <= max_results ({})",
                self.short_min_results, self.long_min_results, self.max_results
            ));
        }

        if self.max_results == 0 {
            return Err("max_results must be positive".into());
        }

        Ok(())
    }
}

impl ServiceConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file; missing sections and keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MenuError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config: ServiceConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults, then
    /// apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                tracing::warn!("Config file {:?} not found, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env();
        config.validate().map_err(MenuError::Config)?;
        Ok(config)
    }

    /// Apply environment overrides
    ///
    /// Recognized: MENU_API_BASE_URL, MENU_API_COOKIE, LLM_API_KEY,
    /// LLM_API_URL, LLM_MODEL, EMBEDDING_MODEL_DIR
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("MENU_API_BASE_URL") {
            self.directory.base_url = v;
        }
        if let Some(v) = lookup("MENU_API_COOKIE") {
            self.directory.cookie = v;
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("LLM_API_URL") {
            self.llm.api_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("EMBEDDING_MODEL_DIR") {
            self.embedding.model_dir = v;
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.vector.validate()?;

        if self.keyword_scoring.short_keyword_min_len > self.keyword_scoring.medium_keyword_min_len
        {
            return Err(format!(
                "short_keyword_min_len ({}) should be <= medium_keyword_min_len ({})",
                self.keyword_scoring.short_keyword_min_len,
                self.keyword_scoring.medium_keyword_min_len
            ));
        }

        if self.directory.base_url.trim().is_empty() {
            return Err("directory.base_url must not be empty".into());
        }

        Ok(())
    }
}
