//! Avatar and head renders.

use super::common::parse_identity;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use skinvault_core::{RenderKind, RenderRequest};

/// Header naming where a render came from (`cache`, `derived`, `placeholder`).
pub const RENDER_ORIGIN_HEADER: &str = "x-render-origin";

/// GET /api/v1/avatar/{id}
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    render(&state, RenderKind::Avatar, &id, None).await
}

/// GET /api/v1/avatar/{id}/{size}
pub async fn get_avatar_sized(
    State(state): State<AppState>,
    Path((id, size)): Path<(String, String)>,
) -> ApiResult<Response> {
    render(&state, RenderKind::Avatar, &id, Some(&size)).await
}

/// GET /api/v1/head/{id}
pub async fn get_head(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    render(&state, RenderKind::Head, &id, None).await
}

/// GET /api/v1/head/{id}/{size}
pub async fn get_head_sized(
    State(state): State<AppState>,
    Path((id, size)): Path<(String, String)>,
) -> ApiResult<Response> {
    render(&state, RenderKind::Head, &id, Some(&size)).await
}

async fn render(
    state: &AppState,
    kind: RenderKind,
    id: &str,
    size: Option<&str>,
) -> ApiResult<Response> {
    let size = match size {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| ApiError::InvalidSize(format!("invalid render size: {raw}")))?,
        None => state.config.render.default_size,
    };
    let identity = parse_identity(id)?;

    let rendered = state
        .engine
        .render(&RenderRequest::new(identity, kind, size))
        .await?;

    Ok((
        [
            ("content-type", "image/png"),
            (RENDER_ORIGIN_HEADER, rendered.origin.as_str()),
        ],
        rendered.bytes,
    )
        .into_response())
}
