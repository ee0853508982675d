//! Saved command templates and command sets
//!
//! Triggering a template copies it into a new pending command and enqueues
//! it; the template itself is never dispatched.

use super::commands::{submit, EnqueueResponse};
use crate::api::server::AppContext;
use crate::db::saved::{self, NewCommandSet, NewSavedCommand};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use intercom_common::db::SavedCommand;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct CommandSetResponse {
    id: i64,
    name: String,
    /// Member templates in trigger order
    command_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct SetTriggerResponse {
    command_ids: Vec<i64>,
}

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Saved command {} not found", id))
}

/// GET /saved_commands
pub async fn list_saved_commands(
    State(ctx): State<AppContext>,
) -> ApiResult<Json<Vec<SavedCommand>>> {
    Ok(Json(saved::list_saved_commands(&ctx.db_pool).await?))
}

/// GET /saved_commands/:id
pub async fn get_saved_command(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SavedCommand>> {
    saved::get_saved_command(&ctx.db_pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /saved_commands
pub async fn create_saved_command(
    State(ctx): State<AppContext>,
    Json(req): Json<NewSavedCommand>,
) -> ApiResult<(StatusCode, Json<SavedCommand>)> {
    req.spec.validate()?;
    let id = saved::insert_saved_command(&ctx.db_pool, &req).await?;
    info!("Saved command template {} ({})", id, req.name);

    let created = saved::get_saved_command(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /saved_commands/:id
pub async fn update_saved_command(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(req): Json<NewSavedCommand>,
) -> ApiResult<Json<SavedCommand>> {
    req.spec.validate()?;
    if !saved::update_saved_command(&ctx.db_pool, id, &req).await? {
        return Err(not_found(id));
    }
    get_saved_command(State(ctx), Path(id)).await
}

/// DELETE /saved_commands/:id
pub async fn delete_saved_command(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if saved::delete_saved_command(&ctx.db_pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /saved_commands/:id/trigger
pub async fn trigger_saved_command(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    let template = saved::get_saved_command(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let command_id = submit(&ctx, &template.spec).await?;
    info!(command_id, "Triggered saved command {}", template.name);
    Ok((StatusCode::CREATED, Json(EnqueueResponse { command_id })))
}

async fn set_response(ctx: &AppContext, id: i64) -> ApiResult<CommandSetResponse> {
    let set = saved::get_command_set(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Command set {} not found", id)))?;
    let command_ids = saved::command_set_members(&ctx.db_pool, id)
        .await?
        .into_iter()
        .map(|member| member.id)
        .collect();
    Ok(CommandSetResponse {
        id: set.id,
        name: set.name,
        command_ids,
    })
}

async fn check_members(ctx: &AppContext, req: &NewCommandSet) -> ApiResult<()> {
    for &command_id in &req.command_ids {
        if saved::get_saved_command(&ctx.db_pool, command_id).await?.is_none() {
            return Err(ApiError::BadRequest(format!(
                "Saved command {} does not exist",
                command_id
            )));
        }
    }
    Ok(())
}

/// GET /saved_command_sets
pub async fn list_command_sets(
    State(ctx): State<AppContext>,
) -> ApiResult<Json<Vec<CommandSetResponse>>> {
    let sets = saved::list_command_sets(&ctx.db_pool).await?;
    let mut response = Vec::with_capacity(sets.len());
    for set in sets {
        response.push(set_response(&ctx, set.id).await?);
    }
    Ok(Json(response))
}

/// GET /saved_command_sets/:id
pub async fn get_command_set(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CommandSetResponse>> {
    Ok(Json(set_response(&ctx, id).await?))
}

/// POST /saved_command_sets
pub async fn create_command_set(
    State(ctx): State<AppContext>,
    Json(req): Json<NewCommandSet>,
) -> ApiResult<(StatusCode, Json<CommandSetResponse>)> {
    check_members(&ctx, &req).await?;
    let id = saved::insert_command_set(&ctx.db_pool, &req).await?;
    info!("Created command set {} ({} members)", req.name, req.command_ids.len());
    Ok((StatusCode::CREATED, Json(set_response(&ctx, id).await?)))
}

/// PUT /saved_command_sets/:id - rename and replace membership
pub async fn update_command_set(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(req): Json<NewCommandSet>,
) -> ApiResult<Json<CommandSetResponse>> {
    check_members(&ctx, &req).await?;
    if !saved::update_command_set(&ctx.db_pool, id, &req).await? {
        return Err(ApiError::NotFound(format!("Command set {} not found", id)));
    }
    Ok(Json(set_response(&ctx, id).await?))
}

/// DELETE /saved_command_sets/:id
pub async fn delete_command_set(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if saved::delete_command_set(&ctx.db_pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Command set {} not found", id)))
    }
}

/// POST /saved_command_sets/:id/trigger - enqueue every member in order
pub async fn trigger_command_set(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<SetTriggerResponse>)> {
    if saved::get_command_set(&ctx.db_pool, id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Command set {} not found", id)));
    }

    let members = saved::command_set_members(&ctx.db_pool, id).await?;
    let mut command_ids = Vec::with_capacity(members.len());
    for template in &members {
        command_ids.push(submit(&ctx, &template.spec).await?);
    }
    info!("Triggered command set {} ({} commands)", id, command_ids.len());
    Ok((StatusCode::CREATED, Json(SetTriggerResponse { command_ids })))
}
