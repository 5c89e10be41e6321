//! HTTP API for the Incentive Engine.
//!
//! This module exposes a small REST API around the engine using the
//! [`axum`](https://crates.io/crates/axum) framework.  Clients submit a
//! roster and publication metadata and receive per-author awards as
//! JSON.  When a request carries no policy the server resolves the
//! record in force from its [`PolicyStore`].

use crate::calculators::EngineSettings;
use crate::config::AppConfig;
use crate::engine::IncentiveEngine;
use crate::error::AppError;
use crate::models::{CalculationRequest, CalculationResult, Roster};
use crate::policy::{attach_policy, PolicyStore};
use crate::validation::validate_roster;
use anyhow::Result;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Application state shared across requests.
pub struct AppState {
    pub engine: IncentiveEngine,
    pub policies: RwLock<PolicyStore>,
    /// Directory the store is reloaded from.
    pub policy_dir: PathBuf,
}

impl AppState {
    pub fn new(engine: IncentiveEngine, policies: PolicyStore, policy_dir: PathBuf) -> Self {
        Self {
            engine,
            policies: RwLock::new(policies),
            policy_dir,
        }
    }
}

/// Loads the policy directory and builds the shared state.
pub fn load_state(policy_dir: &Path, settings: EngineSettings) -> Result<Arc<AppState>> {
    let store = PolicyStore::from_dir(policy_dir)?;
    info!(policies = store.len(), dir = %policy_dir.display(), "policy store loaded");
    Ok(Arc::new(AppState::new(
        IncentiveEngine::new(settings),
        store,
        policy_dir.to_path_buf(),
    )))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/calculate", post(calculate_handler))
        .route("/api/calculate/batch", post(batch_handler))
        .route("/api/roster/validate", post(validate_handler))
        .route("/api/policies/reload", post(reload_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    errors: Vec<String>,
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler for POST /api/calculate
async fn calculate_handler(
    State(state): State<Arc<AppState>>,
    Json(mut request): Json<CalculationRequest>,
) -> Result<Json<CalculationResult>, AppError> {
    request.roster.validate()?;
    {
        let policies = state.policies.read().await;
        attach_policy(&mut request, &*policies);
    }
    let result = state
        .engine
        .calculate(&request.roster, request.policy.as_ref(), &request.publication);
    Ok(Json(result))
}

/// Handler for POST /api/calculate/batch
async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(mut requests): Json<Vec<CalculationRequest>>,
) -> Result<Json<Vec<CalculationResult>>, AppError> {
    // Reject the whole batch if any roster is inconsistent
    for request in &requests {
        request.roster.validate()?;
    }
    {
        let policies = state.policies.read().await;
        for request in requests.iter_mut() {
            attach_policy(request, &*policies);
        }
    }
    // The rayon batch is CPU bound, keep it off the async workers
    let count = requests.len();
    let results = tokio::task::spawn_blocking(move || state.engine.run_batch(requests))
        .await
        .map_err(|err| AppError::Task(err.to_string()))?;
    info!(count, "batch calculated");
    Ok(Json(results))
}

/// Handler for POST /api/roster/validate
async fn validate_handler(Json(roster): Json<Roster>) -> Json<ValidationReport> {
    let errors: Vec<String> = validate_roster(&roster)
        .iter()
        .map(ToString::to_string)
        .collect();
    Json(ValidationReport {
        valid: errors.is_empty(),
        errors,
    })
}

/// Handler for POST /api/policies/reload
///
/// Re-reads the policy directory and swaps the store in place.  The old
/// store stays in service if the directory cannot be read.
async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = PolicyStore::from_dir(&state.policy_dir)?;
    let count = store.len();
    *state.policies.write().await = store;
    info!(policies = count, dir = %state.policy_dir.display(), "policy store reloaded");
    Ok(Json(json!({ "policies": count })))
}

/// Launch the API server.  Loads the policy store named by `config`,
/// binds to the configured address and serves until interrupted.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let state = load_state(&config.policy_dir, config.engine)?;
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
