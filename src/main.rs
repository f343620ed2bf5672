use anyhow::Context;
use diabetes_risk::{
    api::{build_router, AppState},
    config::Config,
    ml::PredictionService,
    observability::init_tracing,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config.observability);

    tracing::info!("Starting Diabetes Risk Predictor v{}", env!("CARGO_PKG_VERSION"));

    // Artifacts are required; there is no fallback model
    let service = PredictionService::load(&config.artifacts).with_context(|| {
        format!(
            "failed to load artifact pair ({}, {}); run `diabetes-risk-cli train` first",
            config.artifacts.scaler_path.display(),
            config.artifacts.model_path.display()
        )
    })?;
    let info = service.info();
    tracing::info!(
        pair_id = %info.pair_id,
        trained_at = %info.model.trained_at,
        cv_score = ?info.model.cv_score,
        "✅ Artifact pair loaded"
    );

    let mut app_state = AppState::new(Arc::new(service), config.ui.clone());
    if let Some(dir) = config.server.assets_dir.clone() {
        tracing::info!(dir = %dir.display(), "Serving static assets");
        app_state = app_state.with_assets(dir);
    }

    // Build HTTP router
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {}", http_addr))?;

    tracing::info!("🚀 HTTP server listening on http://{}", http_addr);
    tracing::info!("   Form: http://{}/", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   REST API: http://{}/v1/predictions", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
