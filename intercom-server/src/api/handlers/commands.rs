//! Pending commands and stop operations

use crate::api::server::AppContext;
use crate::db::commands;
use crate::error::{ApiError, ApiResult};
use crate::playback::{self, StopReport};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use intercom_common::db::{CommandSpec, PlaybackCommand};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub command_id: i64,
}

/// Validate, store and enqueue one command
pub(crate) async fn submit(ctx: &AppContext, spec: &CommandSpec) -> ApiResult<i64> {
    spec.validate()?;
    let command_id = commands::insert_command(&ctx.db_pool, spec).await?;
    ctx.queue.enqueue(command_id);
    info!(command_id, "Command queued");
    Ok(command_id)
}

/// GET /commands
pub async fn list_commands(
    State(ctx): State<AppContext>,
) -> ApiResult<Json<Vec<PlaybackCommand>>> {
    Ok(Json(commands::list_commands(&ctx.db_pool).await?))
}

/// GET /commands/:id
pub async fn get_command(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PlaybackCommand>> {
    commands::get_command(&ctx.db_pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Command {} not found", id)))
}

/// POST /commands - create a command and hand it to the dispatcher
pub async fn create_command(
    State(ctx): State<AppContext>,
    Json(spec): Json<CommandSpec>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    let command_id = submit(&ctx, &spec).await?;
    Ok((StatusCode::CREATED, Json(EnqueueResponse { command_id })))
}

/// DELETE /commands/:id
///
/// The identifier may still be queued; the dispatcher skips it when popped.
pub async fn delete_command(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if commands::delete_command(&ctx.db_pool, id).await? {
        info!(command_id = id, "Command deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Command {} not found", id)))
    }
}

/// POST /commands/stopall - stop-all to every intercom, queue untouched
pub async fn stop_all(State(ctx): State<AppContext>) -> ApiResult<Json<StopReport>> {
    let report = playback::stop_signal(&ctx.db_pool, ctx.trigger.as_ref()).await?;
    Ok(Json(report))
}

/// POST /commands/stopall_full - stop-all, delete every command, drain the queue
pub async fn stop_all_full(State(ctx): State<AppContext>) -> ApiResult<Json<StopReport>> {
    let report = playback::full_stop(&ctx.db_pool, &ctx.queue, ctx.trigger.as_ref()).await?;
    Ok(Json(report))
}
