//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Profiles and uploads
        .route("/profile/{id}", get(handlers::get_profile))
        .route(
            "/profile/{id}/skin",
            post(handlers::upload_skin).delete(handlers::delete_skin),
        )
        .route(
            "/profile/{id}/cape",
            post(handlers::upload_cape).delete(handlers::delete_cape),
        )
        .route("/textures/{id}", get(handlers::get_textures))
        // Renders
        .route("/avatar/{id}", get(handlers::get_avatar))
        .route("/avatar/{id}/{size}", get(handlers::get_avatar_sized))
        .route("/head/{id}", get(handlers::get_head))
        .route("/head/{id}/{size}", get(handlers::get_head_sized))
        // Administration
        .route("/admin/stats", get(handlers::get_stats))
        .route("/admin/user/{id}", delete(handlers::delete_user))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    let mut router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/storage/{*key}", get(handlers::serve_source))
        .route("/health", get(handlers::health_check));

    // Unauthenticated; restrict at the network level when enabled.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Browser frontends on other origins load renders and upload textures
/// directly, so every route answers preflights for any origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
