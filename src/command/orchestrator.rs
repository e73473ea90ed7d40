//! Command orchestration - runs one utterance through the whole pipeline
//!
//! catalog -> keywords -> match -> permission filter -> resolve -> deliver

use crate::catalog::{CatalogLoad, CatalogLoader};
use crate::command::resolver::{Resolution, TargetMatch, TargetResolver};
use crate::core::error::{MenuError, Result};
use crate::core::types::{ActionId, DepartmentId};
use crate::keywords::KeywordIndexer;
use crate::matcher::{IntentMatcher, Strategy};
use crate::permission::PermissionFilter;
use crate::realtime::protocol::timestamp_now;
use crate::realtime::{ConnectionRegistry, ServerMessage};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// An inbound command
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "user_id")]
    pub identity: Option<String>,
    #[serde(default, alias = "department_id")]
    pub department_id: Option<DepartmentId>,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
    #[serde(default, alias = "ai_mode", deserialize_with = "strategy_from_wire")]
    pub strategy: Strategy,
}

fn strategy_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Strategy, D::Error> {
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(Strategy::from_wire(name.as_deref()))
}

impl CommandRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Pipeline stages, logged on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    CatalogLoaded,
    KeywordsBuilt,
    Matched,
    PermissionFiltered,
    Resolved,
    Delivered,
    DeliveryDeferred,
}

/// Why a command produced no target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    EmptyIdentity,
    EmptyCatalog,
    NoMatch,
    NoAuthorizedMatch,
}

impl FailureKind {
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::EmptyIdentity => "User id must not be empty",
            FailureKind::EmptyCatalog => {
                "No menus are available right now, please contact an administrator"
            }
            FailureKind::NoMatch => "Sorry, no menu matches that request",
            FailureKind::NoAuthorizedMatch => {
                "You do not have permission to open the matching menu"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    NoMatch(FailureKind),
    SingleMatch {
        full_path: String,
        action_id: ActionId,
    },
    MultipleMatches(Vec<TargetMatch>),
}

/// Everything the caller needs to answer a command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub identity: String,
    pub result: CommandResult,
    pub message: String,
    /// The pushed frame, for a single match
    pub pushed: Option<ServerMessage>,
    /// Whether the push reached a live connection
    pub delivered: bool,
    pub timestamp: String,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self.result, CommandResult::NoMatch(_))
    }

    fn failed(identity: String, kind: FailureKind) -> Self {
        tracing::debug!(identity = %identity, failure = ?kind, "Command failed");
        Self {
            identity,
            result: CommandResult::NoMatch(kind),
            message: kind.message().to_string(),
            pushed: None,
            delivered: false,
            timestamp: timestamp_now(),
        }
    }
}

/// Pick the identity a command runs as; blank values count as absent
pub fn resolve_identity(
    requested: Option<&str>,
    caller: Option<&str>,
    default_identity: &str,
) -> String {
    [requested, caller]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
        .unwrap_or_else(|| default_identity.trim())
        .to_string()
}

fn enter(stage: Stage, identity: &str) {
    tracing::debug!(?stage, identity, "Command stage");
}

pub struct CommandOrchestrator {
    loader: Arc<CatalogLoader>,
    indexer: KeywordIndexer,
    matcher: IntentMatcher,
    permission: PermissionFilter,
    registry: Arc<ConnectionRegistry>,
    default_identity: String,
}

impl CommandOrchestrator {
    pub fn new(
        loader: Arc<CatalogLoader>,
        indexer: KeywordIndexer,
        matcher: IntentMatcher,
        permission: PermissionFilter,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            loader,
            indexer,
            matcher,
            permission,
            registry,
            default_identity: "1".to_string(),
        }
    }

    pub fn with_default_identity(mut self, identity: impl Into<String>) -> Self {
        self.default_identity = identity.into();
        self
    }

    pub fn default_identity(&self) -> &str {
        &self.default_identity
    }

    pub fn loader(&self) -> &Arc<CatalogLoader> {
        &self.loader
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handle one command.
    ///
    /// Only an empty utterance is an error; every business outcome,
    /// including no match, is an `Ok` outcome.
    pub async fn handle(
        &self,
        request: CommandRequest,
        caller_identity: Option<&str>,
    ) -> Result<CommandOutcome> {
        let utterance = request.text.trim();
        if utterance.is_empty() {
            return Err(MenuError::InvalidInput("text must not be empty".into()));
        }

        let identity = resolve_identity(
            request.identity.as_deref(),
            caller_identity,
            &self.default_identity,
        );
        enter(Stage::Received, &identity);
        tracing::info!(
            identity = %identity,
            session_id = ?request.session_id,
            strategy = request.strategy.as_str(),
            utterance,
            "Command received"
        );
        if identity.is_empty() {
            return Ok(CommandOutcome::failed(identity, FailureKind::EmptyIdentity));
        }

        let load = self
            .loader
            .load_catalog(&identity, request.department_id)
            .await;
        if let CatalogLoad::Stale { reason, .. } = &load {
            tracing::info!(identity = %identity, reason = %reason, "Continuing with stale catalog");
        }
        let leaves = load.into_leaves();
        if leaves.is_empty() {
            return Ok(CommandOutcome::failed(identity, FailureKind::EmptyCatalog));
        }
        enter(Stage::CatalogLoaded, &identity);

        let index = self.indexer.build_keywords(&leaves).await;
        enter(Stage::KeywordsBuilt, &identity);

        let matched = self
            .matcher
            .match_intent(utterance, &leaves, &index, request.strategy)
            .await;
        if matched.is_empty() {
            return Ok(CommandOutcome::failed(identity, FailureKind::NoMatch));
        }
        tracing::debug!(
            identity = %identity,
            requested = matched.requested.as_str(),
            used = matched.used.as_str(),
            leaves = ?matched.leaves,
            "Intent matched"
        );
        enter(Stage::Matched, &identity);

        let survivors = self
            .permission
            .filter(&identity, &matched.leaves, request.department_id)
            .await;
        if survivors.is_empty() {
            return Ok(CommandOutcome::failed(identity, FailureKind::NoAuthorizedMatch));
        }
        enter(Stage::PermissionFiltered, &identity);

        let store = self.loader.store();
        let Some(resolution) = TargetResolver::new(store).resolve(&survivors) else {
            return Ok(CommandOutcome::failed(identity, FailureKind::NoAuthorizedMatch));
        };
        enter(Stage::Resolved, &identity);

        let outcome = match resolution {
            Resolution::Single(target) => self.deliver(identity, target).await,
            Resolution::Multiple(targets) => {
                let names: Vec<&str> = targets.iter().map(|t| t.full_path.as_str()).collect();
                CommandOutcome {
                    message: format!(
                        "Several menus match, please choose one: {}",
                        names.join(", ")
                    ),
                    identity,
                    result: CommandResult::MultipleMatches(targets),
                    pushed: None,
                    delivered: false,
                    timestamp: timestamp_now(),
                }
            }
        };
        Ok(outcome)
    }

    async fn deliver(&self, identity: String, target: TargetMatch) -> CommandOutcome {
        let timestamp = timestamp_now();
        let message =
            ServerMessage::open_action(&target.full_path, &identity, target.action_id, &timestamp);
        let delivered = self.registry.send(&identity, &message).await;

        let text = if delivered {
            enter(Stage::Delivered, &identity);
            format!("Opening {}", target.full_path)
        } else {
            enter(Stage::DeliveryDeferred, &identity);
            format!(
                "Found {}, but the realtime connection is not live; please refresh the page",
                target.full_path
            )
        };
        tracing::info!(
            identity = %identity,
            full_path = %target.full_path,
            action_id = target.action_id,
            delivered,
            "Single target resolved"
        );

        CommandOutcome {
            identity,
            result: CommandResult::SingleMatch {
                full_path: target.full_path,
                action_id: target.action_id,
            },
            message: text,
            pushed: Some(message),
            delivered,
            timestamp,
        }
    }
}
