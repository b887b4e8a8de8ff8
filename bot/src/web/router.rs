use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::app_state::AppState;
use super::rest_api;

/// Build the axum router for the theme command surface.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/servers/{server_id}/themes",
            axum::routing::get(rest_api::list_themes),
        )
        .route(
            "/api/servers/{server_id}/themes/{theme_name}",
            axum::routing::post(rest_api::save_theme).delete(rest_api::remove_theme),
        )
        .route(
            "/api/servers/{server_id}/themes/{theme_name}/load",
            axum::routing::post(rest_api::load_theme),
        )
        .route("/api/help", axum::routing::get(rest_api::help))
        .layer(cors)
        .with_state(state)
}
