//! Profile endpoints: the Mojang-compatible profile and texture uploads.

use super::common::{MessageResponse, TextureMap, parse_identity, texture_url};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use skinvault_core::{SkinModel, SourceTexture, TextureSlot, codec};
use time::OffsetDateTime;

/// Display name reported for every profile.
const PROFILE_NAME: &str = "Player";

/// Profile response.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub name: &'static str,
    pub properties: Vec<ProfileProperty>,
}

/// One signed-less profile property.
#[derive(Debug, Serialize)]
pub struct ProfileProperty {
    pub name: &'static str,
    pub value: String,
}

/// Decoded value of the `textures` property.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TexturesValue {
    pub timestamp: i64,
    pub profile_id: String,
    pub profile_name: &'static str,
    pub textures: TextureMap,
}

/// GET /api/v1/profile/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let identity = parse_identity(&id)?;
    if !identity.is_uuid() {
        return Err(ApiError::BadRequest(
            "profile id must be a 32 character hex uuid".to_string(),
        ));
    }

    let mut response = ProfileResponse {
        id: identity.to_string(),
        name: PROFILE_NAME,
        properties: Vec::new(),
    };

    let Some(set) = state.registry.get(&identity).await? else {
        return Ok(Json(response));
    };

    let value = TexturesValue {
        timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        profile_id: identity.to_string(),
        profile_name: PROFILE_NAME,
        textures: TextureMap::from_set(&state, &set),
    };
    let json = serde_json::to_vec(&value)
        .map_err(|e| ApiError::Internal(format!("failed to encode textures: {e}")))?;

    response.properties.push(ProfileProperty {
        name: "textures",
        value: STANDARD.encode(json),
    });
    Ok(Json(response))
}

/// Query parameters of a skin upload.
#[derive(Debug, Default, Deserialize)]
pub struct SkinUploadQuery {
    #[serde(default)]
    pub slim: bool,
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub fingerprint: String,
}

/// POST /api/v1/profile/{id}/skin
pub async fn upload_skin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SkinUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let model = SkinModel::from_slim(query.slim);
    upload(&state, &id, TextureSlot::Skin, model, &headers, body).await
}

/// POST /api/v1/profile/{id}/cape
pub async fn upload_cape(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    upload(&state, &id, TextureSlot::Cape, SkinModel::Classic, &headers, body).await
}

/// DELETE /api/v1/profile/{id}/skin
pub async fn delete_skin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    delete(&state, &id, TextureSlot::Skin).await
}

/// DELETE /api/v1/profile/{id}/cape
pub async fn delete_cape(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    delete(&state, &id, TextureSlot::Cape).await
}

async fn upload(
    state: &AppState,
    id: &str,
    slot: TextureSlot,
    model: SkinModel,
    headers: &HeaderMap,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let identity = parse_identity(id)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("image/") {
        crate::metrics::record_upload_rejected("content_type");
        return Err(ApiError::BadRequest("file must be an image".to_string()));
    }
    if body.is_empty() {
        crate::metrics::record_upload_rejected("empty");
        return Err(ApiError::BadRequest(format!("no {slot} file provided")));
    }

    let raw = body.clone();
    tokio::task::spawn_blocking(move || codec::decode_texture(&raw, slot).map(|_| ()))
        .await
        .map_err(|e| ApiError::Internal(format!("validation task failed: {e}")))?
        .map_err(|e| {
            let reason = match e {
                skinvault_core::Error::DimensionMismatch { .. } => "dimensions",
                _ => "decode",
            };
            crate::metrics::record_upload_rejected(reason);
            ApiError::from(e)
        })?;

    let fingerprint = state.registry.put(&identity, slot, body, model).await?;
    crate::metrics::UPLOADS
        .with_label_values(&[slot.as_str()])
        .inc();

    let key = SourceTexture::object_key(&identity, slot, &fingerprint);
    Ok(Json(UploadResponse {
        message: format!("{} uploaded successfully", slot_title(slot)),
        url: texture_url(state, &key),
        fingerprint: fingerprint.to_hex(),
    }))
}

async fn delete(
    state: &AppState,
    id: &str,
    slot: TextureSlot,
) -> ApiResult<Json<MessageResponse>> {
    let identity = parse_identity(id)?;
    state.registry.delete(&identity, slot).await?;
    crate::metrics::DELETIONS
        .with_label_values(&[slot.as_str()])
        .inc();

    Ok(Json(MessageResponse::new(format!(
        "{} deleted successfully",
        slot_title(slot)
    ))))
}

fn slot_title(slot: TextureSlot) -> &'static str {
    match slot {
        TextureSlot::Skin => "Skin",
        TextureSlot::Cape => "Cape",
    }
}
