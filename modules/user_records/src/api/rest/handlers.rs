use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    Extension,
};
use modkit::api::problem::ProblemResponse;
use tracing::{debug, info};

use crate::api::rest::dto::{
    CommandDto, NoteDto, ProfileDto, ScreenDto, StatusDto, SubscribeReq, UpdateCommandReq,
    UpdateNoteReq, UpdateProfileReq, UserRecordDto, VapidKeyDto,
};
use crate::api::rest::error::{from_parts, map_domain_error, validation};
use crate::api::rest::upload::ScreenUpdate;
use crate::contract::model::{Split, SplitPatch, UserRecord};
use crate::domain::service::Service;
use crate::errors::ErrorCode;

type ApiResult<T> = Result<T, ProblemResponse>;

/// VAPID application server key handed to browsers, if configured.
#[derive(Debug, Clone, Default)]
pub struct VapidPublicKey(pub Option<String>);

fn body<T>(payload: Result<Json<T>, JsonRejection>, uri: &Uri) -> ApiResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| validation("body", e.body_text(), uri.path()))
}

async fn read(svc: &Service, user_id: &str, uri: &Uri) -> ApiResult<UserRecord> {
    svc.get(user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))
}

async fn merge(svc: &Service, user_id: &str, patch: SplitPatch, uri: &Uri) -> ApiResult<UserRecord> {
    svc.merge_split(user_id, patch)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))
}

async fn clear(svc: &Service, user_id: &str, split: Split, uri: &Uri) -> ApiResult<UserRecord> {
    svc.clear_split(user_id, split)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))
}

// ---------- whole record ----------

/// Full snapshot of a user's record
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "records",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses(
        (status = 200, description = "Record (all-null for unknown users)", body = UserRecordDto),
        (status = 400, description = "Invalid user id", body = modkit::Problem),
        (status = 500, description = "Storage failure", body = modkit::Problem)
    )
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<UserRecordDto>> {
    let record = read(&svc, &user_id, &uri).await?;
    Ok(Json(UserRecordDto::from(&record)))
}

/// Delete a user's record and screenshot
#[utoipa::path(
    delete,
    path = "/user/{user_id}",
    tag = "records",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such user", body = modkit::Problem),
        (status = 500, description = "Storage failure", body = modkit::Problem)
    )
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<StatusCode> {
    info!(%user_id, "deleting user");
    svc.delete_user(&user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reset all four splits
#[utoipa::path(
    post,
    path = "/clear_all/{user_id}",
    tag = "records",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses(
        (status = 200, description = "Record after reset", body = UserRecordDto),
        (status = 400, description = "Invalid user id", body = modkit::Problem),
        (status = 500, description = "Storage failure", body = modkit::Problem)
    )
)]
pub async fn clear_all(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<UserRecordDto>> {
    let record = svc
        .clear_all(&user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(UserRecordDto::from(&record)))
}

// ---------- profile (data_peek) ----------

#[utoipa::path(
    get,
    path = "/data_peek/{user_id}",
    tag = "profile",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses(
        (status = 200, description = "Profile split", body = ProfileDto),
        (status = 400, description = "Invalid user id", body = modkit::Problem)
    )
)]
pub async fn get_profile(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<ProfileDto>> {
    let record = read(&svc, &user_id, &uri).await?;
    Ok(Json(ProfileDto::from(&record)))
}

#[utoipa::path(
    post,
    path = "/data_peek/{user_id}",
    tag = "profile",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Merged profile split", body = ProfileDto),
        (status = 400, description = "Malformed body or invalid user id", body = modkit::Problem)
    )
)]
pub async fn update_profile(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
    payload: Result<Json<UpdateProfileReq>, JsonRejection>,
) -> ApiResult<Json<ProfileDto>> {
    let req = body(payload, &uri)?;
    let record = merge(&svc, &user_id, SplitPatch::Profile(req.into()), &uri).await?;
    Ok(Json(ProfileDto::from(&record)))
}

#[utoipa::path(
    post,
    path = "/data_peek/{user_id}/clear",
    tag = "profile",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Cleared profile split", body = ProfileDto))
)]
pub async fn clear_profile(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<ProfileDto>> {
    let record = clear(&svc, &user_id, Split::Profile, &uri).await?;
    Ok(Json(ProfileDto::from(&record)))
}

// ---------- note (note_peek) ----------

#[utoipa::path(
    get,
    path = "/note_peek/{user_id}",
    tag = "note",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Note split", body = NoteDto))
)]
pub async fn get_note(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<NoteDto>> {
    let record = read(&svc, &user_id, &uri).await?;
    Ok(Json(NoteDto::from(&record)))
}

/// Merge the note; subscribers are notified when the note changes
#[utoipa::path(
    post,
    path = "/note_peek/{user_id}",
    tag = "note",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = UpdateNoteReq,
    responses(
        (status = 200, description = "Merged note split", body = NoteDto),
        (status = 400, description = "Malformed body or invalid user id", body = modkit::Problem)
    )
)]
pub async fn update_note(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
    payload: Result<Json<UpdateNoteReq>, JsonRejection>,
) -> ApiResult<Json<NoteDto>> {
    let req = body(payload, &uri)?;
    let record = merge(&svc, &user_id, SplitPatch::Note(req.into()), &uri).await?;
    Ok(Json(NoteDto::from(&record)))
}

#[utoipa::path(
    post,
    path = "/note_peek/{user_id}/clear",
    tag = "note",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Cleared note split", body = NoteDto))
)]
pub async fn clear_note(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<NoteDto>> {
    let record = clear(&svc, &user_id, Split::Note, &uri).await?;
    Ok(Json(NoteDto::from(&record)))
}

// ---------- screen (screen_peek) ----------

#[utoipa::path(
    get,
    path = "/screen_peek/{user_id}",
    tag = "screen",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Screen split", body = ScreenDto))
)]
pub async fn get_screen(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<ScreenDto>> {
    let record = read(&svc, &user_id, &uri).await?;
    Ok(Json(ScreenDto::from(&record)))
}

/// Merge screen metadata and optionally replace the screenshot
#[utoipa::path(
    post,
    path = "/screen_peek/{user_id}",
    tag = "screen",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = crate::api::rest::dto::UpdateScreenReq,
    responses(
        (status = 200, description = "Merged screen split", body = ScreenDto),
        (status = 400, description = "Malformed body, bad base64 or oversized screenshot", body = modkit::Problem),
        (status = 415, description = "Screenshot is not a PNG or JPEG image", body = modkit::Problem)
    )
)]
pub async fn update_screen(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
    update: ScreenUpdate,
) -> ApiResult<Json<ScreenDto>> {
    debug!(%user_id, with_screenshot = update.upload.is_some(), "screen update");
    let record = svc
        .merge_screen(&user_id, update.patch, update.upload)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(ScreenDto::from(&record)))
}

#[utoipa::path(
    post,
    path = "/screen_peek/{user_id}/clear",
    tag = "screen",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Cleared screen split", body = ScreenDto))
)]
pub async fn clear_screen(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<ScreenDto>> {
    let record = clear(&svc, &user_id, Split::Screen, &uri).await?;
    Ok(Json(ScreenDto::from(&record)))
}

/// Raw screenshot bytes
#[utoipa::path(
    get,
    path = "/screen_peek/{user_id}/screenshot",
    tag = "screen",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses(
        (status = 200, description = "PNG or JPEG bytes"),
        (status = 404, description = "No screenshot stored", body = modkit::Problem)
    )
)]
pub async fn get_screenshot(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Response> {
    let shot = svc
        .fetch_screenshot(&user_id)
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;

    let mut resp = shot.bytes.into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(shot.content_type),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(resp)
}

// ---------- command (commands) ----------

#[utoipa::path(
    get,
    path = "/commands/{user_id}",
    tag = "command",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Command split", body = CommandDto))
)]
pub async fn get_command(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<CommandDto>> {
    let record = read(&svc, &user_id, &uri).await?;
    Ok(Json(CommandDto::from(&record)))
}

#[utoipa::path(
    post,
    path = "/commands/{user_id}",
    tag = "command",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = UpdateCommandReq,
    responses(
        (status = 200, description = "Merged command split", body = CommandDto),
        (status = 400, description = "Malformed body or invalid user id", body = modkit::Problem)
    )
)]
pub async fn update_command(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
    payload: Result<Json<UpdateCommandReq>, JsonRejection>,
) -> ApiResult<Json<CommandDto>> {
    let req = body(payload, &uri)?;
    let record = merge(&svc, &user_id, SplitPatch::Command(req.into()), &uri).await?;
    Ok(Json(CommandDto::from(&record)))
}

#[utoipa::path(
    post,
    path = "/commands/{user_id}/clear",
    tag = "command",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    responses((status = 200, description = "Cleared command split", body = CommandDto))
)]
pub async fn clear_command(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
) -> ApiResult<Json<CommandDto>> {
    let record = clear(&svc, &user_id, Split::Command, &uri).await?;
    Ok(Json(CommandDto::from(&record)))
}

// ---------- push ----------

/// Store the browser's push subscription (last write wins)
#[utoipa::path(
    post,
    path = "/push/subscribe/{user_id}",
    tag = "push",
    params(("user_id" = String, Path, description = "Opaque user identifier")),
    request_body = SubscribeReq,
    responses(
        (status = 200, description = "Subscription stored", body = StatusDto),
        (status = 400, description = "Malformed subscription", body = modkit::Problem)
    )
)]
pub async fn subscribe(
    Extension(svc): Extension<Arc<Service>>,
    Path(user_id): Path<String>,
    uri: Uri,
    payload: Result<Json<SubscribeReq>, JsonRejection>,
) -> ApiResult<Json<StatusDto>> {
    let req = body(payload, &uri)?;
    svc.subscribe(&user_id, req.subscription.into())
        .await
        .map_err(|e| map_domain_error(&e, uri.path()))?;
    Ok(Json(StatusDto {
        status: "subscribed".to_string(),
    }))
}

/// VAPID public key for `PushManager.subscribe`
#[utoipa::path(
    get,
    path = "/push/vapid_public_key",
    tag = "push",
    responses(
        (status = 200, description = "Application server key", body = VapidKeyDto),
        (status = 404, description = "Push is not configured", body = modkit::Problem)
    )
)]
pub async fn vapid_public_key(
    Extension(key): Extension<Arc<VapidPublicKey>>,
    uri: Uri,
) -> ApiResult<Json<VapidKeyDto>> {
    match key.0.as_deref() {
        Some(k) => Ok(Json(VapidKeyDto {
            public_key: k.to_string(),
        })),
        None => Err(from_parts(
            ErrorCode::user_records_push_not_configured_v1,
            "No VAPID public key is configured",
            uri.path(),
        )),
    }
}
