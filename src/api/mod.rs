pub mod handlers;
pub mod routes;
pub mod views;

pub use routes::*;

use crate::config::UiConfig;
use crate::ml::PredictionService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub ui: Arc<UiConfig>,
    /// Directory served under /assets
    pub assets_dir: Option<PathBuf>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>, ui: UiConfig) -> Self {
        Self {
            service,
            ui: Arc::new(ui),
            assets_dir: None,
            started_at: Instant::now(),
        }
    }

    /// Serve static files (background image) from `dir`
    pub fn with_assets(mut self, dir: PathBuf) -> Self {
        self.assets_dir = Some(dir);
        self
    }
}
