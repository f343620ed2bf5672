use crate::ml::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Where the artifact pair lives
    pub artifacts: ArtifactsConfig,

    /// Trainer configuration
    #[serde(default)]
    pub training: TrainingConfig,

    /// Form presentation
    #[serde(default)]
    pub ui: UiConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load configuration, overriding the embedded defaults with `path` (if it exists)
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix: DIABETES_RISK__)
            .add_source(
                config::Environment::with_prefix("DIABETES_RISK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            artifacts: ArtifactsConfig::default(),
            training: TrainingConfig::default(),
            ui: UiConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Directory served under /assets
    pub assets_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            assets_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Fitted scaler blob
    #[serde(default = "default_scaler_path")]
    pub scaler_path: PathBuf,

    /// Fitted classifier blob
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            scaler_path: default_scaler_path(),
            model_path: default_model_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    /// File name under `server.assets_dir` used as page background
    pub background_image: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            background_image: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_scaler_path() -> PathBuf {
    PathBuf::from("artifacts/scaler.bin")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("artifacts/model.bin")
}

fn default_title() -> String {
    "Smart Diabetes Risk Predictor".to_string()
}

fn default_subtitle() -> String {
    "Machine Learning meets Medical Insight".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
