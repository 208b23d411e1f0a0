use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/maps", get(routes::api::list_maps))
        .route("/api/maps/{map}", get(routes::api::get_map))
        .route("/api/maps/{map}/legend", get(routes::api::get_legend))
        .route("/api/roster", get(routes::api::get_roster))
        .route("/api/roster/formats", get(routes::api::get_roster_formats))
        .route("/api/roster/format", post(routes::api::post_roster_format))
        .route(
            "/api/results/options",
            get(routes::api::get_result_options),
        )
        .route("/api/results", post(routes::api::post_result))
        .route("/api/events", get(routes::sse::map_events))
        .route("/api/health", get(routes::api::health))
        .route("/api/metrics", get(routes::api::metrics))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
