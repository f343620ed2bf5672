use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main router: HTML form, JSON API and health checks
pub fn build_router(state: AppState) -> Router {
    let assets_dir = state.assets_dir.clone();

    let mut router = Router::new()
        // Form
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::submit_form))
        // JSON API
        .route("/v1/predictions", post(handlers::create_prediction))
        .route("/v1/model", get(handlers::model_info))
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check));

    if let Some(dir) = assets_dir {
        router = router.nest_service("/assets", ServeDir::new(dir));
    }

    router
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
