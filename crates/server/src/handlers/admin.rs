//! Administrative endpoints.

use super::common::{MessageResponse, parse_identity};
use crate::engine::RenderStatsSnapshot;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

/// Stats response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_skins: u64,
    pub total_capes: u64,
    pub total_identities: u64,
    pub service: &'static str,
    pub version: &'static str,
    pub renders: RenderStatsSnapshot,
}

/// GET /api/v1/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let counts = state.registry.stats().await?;

    Ok(Json(StatsResponse {
        total_skins: counts.skins,
        total_capes: counts.capes,
        total_identities: counts.identities,
        service: super::SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        renders: state.engine.stats(),
    }))
}

/// DELETE /api/v1/admin/user/{id}
///
/// Removes both textures, the record and every cached render.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let identity = parse_identity(&id)?;
    state.registry.delete_all(&identity).await?;
    tracing::info!(identity = %identity, "deleted user data");

    Ok(Json(MessageResponse::new("User data deleted successfully")))
}
