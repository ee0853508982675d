//! Devices, groups, sounds and announcements

use crate::api::server::AppContext;
use crate::db::intercoms::{self, NewGroup, NewIntercom};
use crate::db::sounds::{self, NewAnnouncement, NewSound};
use crate::device::DeviceStatus;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use futures::future::join_all;
use intercom_common::db::{Announcement, Intercom, Sound};
use serde::Serialize;
use tracing::info;

/// Group with its declared membership
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    id: i64,
    name: String,
    intercom_ids: Vec<i64>,
}

// ============================================================================
// Intercoms
// ============================================================================

/// GET /intercoms
pub async fn list_intercoms(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<Intercom>>> {
    Ok(Json(intercoms::list_intercoms(&ctx.db_pool).await?))
}

/// GET /intercoms/:id
pub async fn get_intercom(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Intercom>> {
    intercoms::get_intercom(&ctx.db_pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Intercom {} not found", id)))
}

/// POST /intercoms
pub async fn create_intercom(
    State(ctx): State<AppContext>,
    Json(req): Json<NewIntercom>,
) -> ApiResult<(StatusCode, Json<Intercom>)> {
    if req.ip_address.trim().is_empty() {
        return Err(ApiError::BadRequest("ip_address is required".to_string()));
    }
    let id = intercoms::insert_intercom(&ctx.db_pool, &req).await?;
    info!("Added intercom {} ({})", req.name, req.ip_address);

    let created = intercoms::get_intercom(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Intercom {} vanished after insert", id)))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /intercoms/:id
pub async fn update_intercom(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(req): Json<NewIntercom>,
) -> ApiResult<Json<Intercom>> {
    if !intercoms::update_intercom(&ctx.db_pool, id, &req).await? {
        return Err(ApiError::NotFound(format!("Intercom {} not found", id)));
    }
    get_intercom(State(ctx), Path(id)).await
}

/// DELETE /intercoms/:id
pub async fn delete_intercom(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if intercoms::delete_intercom(&ctx.db_pool, id).await? {
        info!("Deleted intercom {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Intercom {} not found", id)))
    }
}

/// GET /intercoms/status - probe every intercom's status page
///
/// A device is online if it answered at all; `response` carries the body of
/// a successful answer.
pub async fn intercom_status(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<DeviceStatus>>> {
    let devices = intercoms::list_intercoms(&ctx.db_pool).await?;
    let trigger = ctx.trigger.as_ref();

    let statuses = join_all(devices.into_iter().map(|device| async move {
        let (online, response) = match trigger.probe_status(&device.ip_address).await {
            Ok(body) => (true, body),
            Err(_) => (false, None),
        };
        DeviceStatus {
            name: device.name,
            ip: device.ip_address,
            online,
            response,
        }
    }))
    .await;

    Ok(Json(statuses))
}

// ============================================================================
// Groups
// ============================================================================

async fn group_response(ctx: &AppContext, id: i64) -> ApiResult<GroupResponse> {
    let group = intercoms::get_group(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Group {} not found", id)))?;
    let intercom_ids = intercoms::group_member_ids(&ctx.db_pool, id).await?;
    Ok(GroupResponse {
        id: group.id,
        name: group.name,
        intercom_ids,
    })
}

/// GET /groups
pub async fn list_groups(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<GroupResponse>>> {
    let groups = intercoms::list_groups(&ctx.db_pool).await?;
    let mut response = Vec::with_capacity(groups.len());
    for group in groups {
        let intercom_ids = intercoms::group_member_ids(&ctx.db_pool, group.id).await?;
        response.push(GroupResponse {
            id: group.id,
            name: group.name,
            intercom_ids,
        });
    }
    Ok(Json(response))
}

/// GET /groups/:id
pub async fn get_group(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<GroupResponse>> {
    Ok(Json(group_response(&ctx, id).await?))
}

/// POST /groups
pub async fn create_group(
    State(ctx): State<AppContext>,
    Json(req): Json<NewGroup>,
) -> ApiResult<(StatusCode, Json<GroupResponse>)> {
    let id = intercoms::insert_group(&ctx.db_pool, &req).await?;
    info!("Added group {} with {} members", req.name, req.intercom_ids.len());
    Ok((StatusCode::CREATED, Json(group_response(&ctx, id).await?)))
}

/// PUT /groups/:id - rename and replace membership
pub async fn update_group(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(req): Json<NewGroup>,
) -> ApiResult<Json<GroupResponse>> {
    if !intercoms::update_group(&ctx.db_pool, id, &req).await? {
        return Err(ApiError::NotFound(format!("Group {} not found", id)));
    }
    Ok(Json(group_response(&ctx, id).await?))
}

/// DELETE /groups/:id
pub async fn delete_group(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if intercoms::delete_group(&ctx.db_pool, id).await? {
        info!("Deleted group {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Group {} not found", id)))
    }
}

// ============================================================================
// Sounds
// ============================================================================

/// GET /sounds
pub async fn list_sounds(State(ctx): State<AppContext>) -> ApiResult<Json<Vec<Sound>>> {
    Ok(Json(sounds::list_sounds(&ctx.db_pool).await?))
}

/// GET /sounds/:id
pub async fn get_sound(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Sound>> {
    sounds::get_sound(&ctx.db_pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Sound {} not found", id)))
}

/// POST /sounds - register a sound already present on the devices
pub async fn create_sound(
    State(ctx): State<AppContext>,
    Json(req): Json<NewSound>,
) -> ApiResult<(StatusCode, Json<Sound>)> {
    if req.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename is required".to_string()));
    }
    if req.play_duration_ms < 0 {
        return Err(ApiError::BadRequest(
            "play_duration_ms must not be negative".to_string(),
        ));
    }
    let id = sounds::insert_sound(&ctx.db_pool, &req).await?;
    info!("Added sound {} ({} ms)", req.filename, req.play_duration_ms);

    let created = sounds::get_sound(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Sound {} vanished after insert", id)))?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ============================================================================
// Announcements
// ============================================================================

/// GET /announcements
///
/// `sound_order` is returned as stored (comma-separated ids).
pub async fn list_announcements(
    State(ctx): State<AppContext>,
) -> ApiResult<Json<Vec<Announcement>>> {
    Ok(Json(sounds::list_announcements(&ctx.db_pool).await?))
}

/// GET /announcements/:id
pub async fn get_announcement(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Announcement>> {
    sounds::get_announcement(&ctx.db_pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Announcement {} not found", id)))
}

/// POST /announcements - `sound_order` is a JSON array of sound ids
pub async fn create_announcement(
    State(ctx): State<AppContext>,
    Json(req): Json<NewAnnouncement>,
) -> ApiResult<(StatusCode, Json<Announcement>)> {
    let id = sounds::insert_announcement(&ctx.db_pool, &req).await?;
    info!("Added announcement {} ({} sounds)", req.name, req.sound_order.len());

    let created = sounds::get_announcement(&ctx.db_pool, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Announcement {} vanished after insert", id)))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /announcements/:id
pub async fn update_announcement(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Json(req): Json<NewAnnouncement>,
) -> ApiResult<Json<Announcement>> {
    if !sounds::update_announcement(&ctx.db_pool, id, &req).await? {
        return Err(ApiError::NotFound(format!("Announcement {} not found", id)));
    }
    get_announcement(State(ctx), Path(id)).await
}

/// DELETE /announcements/:id
pub async fn delete_announcement(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if sounds::delete_announcement(&ctx.db_pool, id).await? {
        info!("Deleted announcement {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Announcement {} not found", id)))
    }
}
