//! Texture lookup and raw source serving.

use super::common::{TextureMap, parse_identity};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Textures response.
#[derive(Debug, Serialize)]
pub struct TexturesResponse {
    pub textures: TextureMap,
}

/// GET /api/v1/textures/{id}
pub async fn get_textures(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TexturesResponse>> {
    let identity = parse_identity(&id)?;
    let set = state
        .registry
        .get(&identity)
        .await?
        .ok_or_else(|| ApiError::NotFound("textures not found".to_string()))?;

    Ok(Json(TexturesResponse {
        textures: TextureMap::from_set(&state, &set),
    }))
}

/// GET /storage/{*key}
pub async fn serve_source(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let bytes = state.registry.fetch_raw_key(&key).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
