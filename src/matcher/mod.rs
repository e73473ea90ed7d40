//! Intent matching: utterance → ranked leaf names
//!
//! Three interchangeable strategies share one contract. Keyword scoring is
//! always available; the vector and remote-model strategies are opt-in per
//! request and fall back to keyword scoring when they fail or come back
//! empty.

pub mod embedder;
pub mod keyword;
pub mod remote;
pub mod vector;

use crate::core::config::{KeywordScoringConfig, ServiceConfig, VectorConfig};
use crate::core::error::MenuError;
use crate::keywords::KeywordIndex;
use crate::llm::client::CompletionClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vector::TextEncoder;

/// A scored leaf before filtering
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub leaf_name: String,
    pub score: f64,
}

impl MatchCandidate {
    pub fn new(leaf_name: String, score: f64) -> Self {
        Self { leaf_name, score }
    }
}

/// Matching strategy requested for a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Keyword,
    Vector,
    Remote,
}

impl Strategy {
    /// Parse a wire name; unknown or missing names select keyword scoring
    pub fn from_wire(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_lowercase()).as_deref() {
            Some("vector" | "embedding" | "bge-small-zh") => Strategy::Vector,
            Some("remote" | "llm" | "deepseek") => Strategy::Remote,
            _ => Strategy::Keyword,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Keyword => "keyword",
            Strategy::Vector => "vector",
            Strategy::Remote => "remote",
        }
    }
}

/// What a single strategy run produced
#[derive(Debug)]
pub enum StrategyOutcome {
    Matched(Vec<String>),
    Empty,
    Failed(MenuError),
}

impl StrategyOutcome {
    fn from_result(result: crate::core::error::Result<Vec<String>>) -> Self {
        match result {
            Ok(leaves) if leaves.is_empty() => StrategyOutcome::Empty,
            Ok(leaves) => StrategyOutcome::Matched(leaves),
            Err(e) => StrategyOutcome::Failed(e),
        }
    }
}

/// Final matcher output
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Most relevant first; empty means no confident match
    pub leaves: Vec<String>,
    pub requested: Strategy,
    /// Strategy whose result is in `leaves`
    pub used: Strategy,
}

impl MatchOutcome {
    pub fn fell_back(&self) -> bool {
        self.requested != self.used
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Runs the requested strategy with keyword fallback
pub struct IntentMatcher {
    scoring: KeywordScoringConfig,
    vector: VectorConfig,
    encoder: Option<Arc<dyn TextEncoder>>,
    completion: Option<Arc<dyn CompletionClient>>,
}

impl IntentMatcher {
    pub fn new(scoring: KeywordScoringConfig, vector: VectorConfig) -> Self {
        Self {
            scoring,
            vector,
            encoder: None,
            completion: None,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.keyword_scoring.clone(), config.vector.clone())
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn TextEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(client);
        self
    }

    pub fn supports(&self, strategy: Strategy) -> bool {
        match strategy {
            Strategy::Keyword => true,
            Strategy::Vector => self.encoder.is_some(),
            Strategy::Remote => self.completion.is_some(),
        }
    }

    /// Match an utterance against the catalog.
    ///
    /// Never fails: an empty `leaves` list is the no-match answer.
    pub async fn match_intent(
        &self,
        utterance: &str,
        leaves: &[String],
        index: &KeywordIndex,
        strategy: Strategy,
    ) -> MatchOutcome {
        if strategy != Strategy::Keyword {
            match self.run_optional(utterance, leaves, index, strategy).await {
                StrategyOutcome::Matched(matched) => {
                    return MatchOutcome {
                        leaves: matched,
                        requested: strategy,
                        used: strategy,
                    };
                }
                StrategyOutcome::Empty => {
                    tracing::info!(
                        strategy = strategy.as_str(),
                        "No match from strategy, falling back to keyword scoring"
                    );
                }
                StrategyOutcome::Failed(e) => {
                    tracing::warn!(
                        strategy = strategy.as_str(),
                        error = %e,
                        "Strategy failed, falling back to keyword scoring"
                    );
                }
            }
        }

        MatchOutcome {
            leaves: keyword::keyword_match(utterance, leaves, index, &self.scoring),
            requested: strategy,
            used: Strategy::Keyword,
        }
    }

    async fn run_optional(
        &self,
        utterance: &str,
        leaves: &[String],
        index: &KeywordIndex,
        strategy: Strategy,
    ) -> StrategyOutcome {
        match strategy {
            Strategy::Vector => match &self.encoder {
                Some(encoder) => StrategyOutcome::from_result(
                    vector::vector_match(encoder.clone(), utterance, leaves, index, &self.vector)
                        .await,
                ),
                None => StrategyOutcome::Failed(MenuError::EmbeddingUnavailable(
                    "no embedding model loaded".into(),
                )),
            },
            Strategy::Remote => match &self.completion {
                Some(client) => StrategyOutcome::from_result(
                    remote::remote_match(client.as_ref(), utterance, leaves).await,
                ),
                None => StrategyOutcome::Failed(MenuError::LlmError(
                    "no remote model configured".into(),
                )),
            },
            Strategy::Keyword => StrategyOutcome::from_result(Ok(keyword::keyword_match(
                utterance,
                leaves,
                index,
                &self.scoring,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Result;
    use async_trait::async_trait;

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(KeywordScoringConfig::default(), VectorConfig::default())
    }

    fn leaves() -> Vec<String> {
        vec!["Stalls".into(), "Dishes".into()]
    }

    struct Reply(&'static str);

    #[async_trait]
    impl CompletionClient for Reply {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_strategy_from_wire() {
        assert_eq!(Strategy::from_wire(None), Strategy::Keyword);
        assert_eq!(Strategy::from_wire(Some("simple")), Strategy::Keyword);
        assert_eq!(Strategy::from_wire(Some("bge-small-zh")), Strategy::Vector);
        assert_eq!(Strategy::from_wire(Some(" DeepSeek ")), Strategy::Remote);
        assert_eq!(Strategy::from_wire(Some("telepathy")), Strategy::Keyword);
    }

    #[tokio::test]
    async fn test_keyword_by_default() {
        let outcome = matcher()
            .match_intent("stalls", &leaves(), &KeywordIndex::new(), Strategy::Keyword)
            .await;
        assert_eq!(outcome.leaves, vec!["Stalls"]);
        assert!(!outcome.fell_back());
    }

    #[tokio::test]
    async fn test_vector_without_model_falls_back() {
        let outcome = matcher()
            .match_intent("stalls", &leaves(), &KeywordIndex::new(), Strategy::Vector)
            .await;
        assert_eq!(outcome.leaves, vec!["Stalls"]);
        assert_eq!(outcome.used, Strategy::Keyword);
        assert!(outcome.fell_back());
    }

    #[tokio::test]
    async fn test_remote_match_used_when_resolved() {
        let matcher = matcher().with_completion_client(Arc::new(Reply("['Dishes']")));
        let outcome = matcher
            .match_intent("stalls", &leaves(), &KeywordIndex::new(), Strategy::Remote)
            .await;
        assert_eq!(outcome.leaves, vec!["Dishes"]);
        assert_eq!(outcome.used, Strategy::Remote);
    }

    #[tokio::test]
    async fn test_remote_empty_falls_back() {
        let matcher = matcher().with_completion_client(Arc::new(Reply("no idea")));
        let outcome = matcher
            .match_intent("stalls", &leaves(), &KeywordIndex::new(), Strategy::Remote)
            .await;
        assert_eq!(outcome.leaves, vec!["Stalls"]);
        assert_eq!(outcome.used, Strategy::Keyword);
    }

    #[test]
    fn test_supports() {
        let m = matcher();
        assert!(m.supports(Strategy::Keyword));
        assert!(!m.supports(Strategy::Vector));
        assert!(!m.supports(Strategy::Remote));
    }
}
