//! HTTP request handlers

pub mod catalog;
pub mod commands;
pub mod saved;

use crate::api::server::AppContext;
use crate::state::CurrentDispatch;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct DispatchStatusResponse {
    /// Command the dispatcher is working on, if any
    current: Option<CurrentDispatch>,
    queue_depth: usize,
    /// Queued identifiers, next to be dispatched first
    queued: Vec<i64>,
    commands_completed: u64,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "intercom-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /dispatch/status
pub async fn dispatch_status(State(ctx): State<AppContext>) -> Json<DispatchStatusResponse> {
    let queued = ctx.queue.snapshot();
    Json(DispatchStatusResponse {
        current: ctx.state.get_current_dispatch().await,
        queue_depth: queued.len(),
        queued,
        commands_completed: ctx.state.completed_count(),
    })
}
