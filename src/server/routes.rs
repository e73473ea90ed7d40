//! HTTP routes for commands and catalog inspection

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::command::{CommandRequest, CommandResponse};
use crate::realtime::protocol::timestamp_now;
use crate::server::error::ApiError;
use crate::server::AppState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default, Deserialize)]
pub struct CallerQuery {
    pub user_id: Option<String>,
}

pub(crate) async fn voice_command(
    State(state): State<Arc<AppState>>,
    Query(caller): Query<CallerQuery>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(request) = body?;
    let outcome = state
        .orchestrator
        .handle(request, caller.user_id.as_deref())
        .await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Serialize)]
pub struct MenuList {
    pub menus: Vec<String>,
    pub count: usize,
}

pub(crate) async fn menus(State(state): State<Arc<AppState>>) -> Json<MenuList> {
    let orchestrator = &state.orchestrator;
    let menus = orchestrator
        .loader()
        .load_catalog(orchestrator.default_identity(), None)
        .await
        .into_leaves();
    Json(MenuList {
        count: menus.len(),
        menus,
    })
}

#[derive(Debug, Serialize)]
pub struct RefreshResult {
    pub refreshed: bool,
    pub count: usize,
}

pub(crate) async fn refresh(State(state): State<Arc<AppState>>) -> Json<RefreshResult> {
    let orchestrator = &state.orchestrator;
    let load = orchestrator
        .loader()
        .load_catalog(orchestrator.default_identity(), None)
        .await;
    Json(RefreshResult {
        refreshed: load.is_fresh(),
        count: load.leaves().len(),
    })
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

pub(crate) async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "menu-intent",
        version: VERSION,
        status: "running",
    })
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub connections: usize,
    pub menus: usize,
}

pub(crate) async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        connections: state.orchestrator.registry().len().await,
        menus: state.orchestrator.loader().store().len(),
    })
}

#[derive(Debug, Serialize)]
pub struct DeploymentCheck {
    pub message: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

pub(crate) async fn deployment_check() -> Json<DeploymentCheck> {
    Json(DeploymentCheck {
        message: "deployment ok",
        timestamp: timestamp_now(),
        version: VERSION,
    })
}
