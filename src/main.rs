//! Menu Intent - Entry Point
//!
//! Loads configuration, wires the pipeline components together and serves
//! the HTTP and WebSocket endpoints.

use clap::Parser;
use menu_intent::catalog::{CatalogLoader, CatalogStore, HttpDirectoryService};
use menu_intent::command::CommandOrchestrator;
use menu_intent::core::config::ServiceConfig;
use menu_intent::core::error::{MenuError, Result};
use menu_intent::keywords::{HttpKeywordSource, KeywordIndexer, KeywordSource};
use menu_intent::llm::LlmClient;
use menu_intent::matcher::embedder::load_encoder;
use menu_intent::matcher::IntentMatcher;
use menu_intent::permission::PermissionFilter;
use menu_intent::realtime::ConnectionRegistry;
use menu_intent::server::{self, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Menu Intent - resolve spoken or typed commands to menu entries
#[derive(Parser, Debug)]
#[command(name = "menu-intent")]
#[command(about = "Resolve natural-language commands to permission-scoped menu entries")]
struct Args {
    /// TOML configuration file (ignored if missing)
    #[arg(long, default_value = "menu-intent.toml")]
    config: PathBuf,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("menu_intent=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = ServiceConfig::load(Some(&args.config))?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().map_err(MenuError::Config)?;

    tracing::info!(
        directory = %config.directory.base_url,
        llm = config.llm.is_enabled(),
        "Menu Intent starting..."
    );

    let state = build_state(&config)?;
    server::serve(state, &config.server).await
}

fn build_state(config: &ServiceConfig) -> Result<Arc<AppState>> {
    let store = Arc::new(CatalogStore::new());
    let directory = Arc::new(HttpDirectoryService::from_config(&config.directory)?);
    let loader = Arc::new(CatalogLoader::new(store, directory));

    let keyword_source: Arc<dyn KeywordSource> =
        Arc::new(HttpKeywordSource::from_config(&config.directory)?);
    let indexer = KeywordIndexer::new(Some(keyword_source));

    let mut matcher = IntentMatcher::from_config(config);
    match load_encoder(&config.embedding) {
        Ok(encoder) => matcher = matcher.with_encoder(encoder),
        Err(e) => tracing::warn!(error = %e, "Vector strategy unavailable"),
    }
    if config.llm.is_enabled() {
        match LlmClient::new(&config.llm) {
            Ok(client) => matcher = matcher.with_completion_client(Arc::new(client)),
            Err(e) => tracing::warn!(error = %e, "Remote strategy unavailable"),
        }
    } else {
        tracing::warn!("LLM_API_KEY not set - remote strategy disabled");
    }

    let permission = PermissionFilter::new(loader.clone());
    let registry = Arc::new(ConnectionRegistry::new());

    let orchestrator = CommandOrchestrator::new(loader, indexer, matcher, permission, registry)
        .with_default_identity(config.default_identity.clone());
    Ok(Arc::new(AppState::new(Arc::new(orchestrator))))
}
