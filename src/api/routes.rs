use crate::api::{handlers, AppState};
use crate::metrics::track_http_metrics;
use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Incident management
        .route(
            "/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route(
            "/incidents/:id",
            get(handlers::get_incident)
                .put(handlers::update_incident)
                .delete(handlers::delete_incident),
        )
        // Aggregates
        .route("/stats", get(handlers::get_statistics))
        .route("/stats/by-sector", get(handlers::get_sector_breakdown))
        .route("/stats/by-time", get(handlers::get_time_series))
        .route_layer(middleware::from_fn(track_http_metrics));

    Router::new()
        .nest("/api", api)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
