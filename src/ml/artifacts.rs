use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, GradientBoostingClassifier};
use crate::ml::models::ModelMetadata;
use crate::ml::scaler::StandardScaler;
use crate::models::FEATURE_COUNT;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Format tag written at the head of every artifact file
pub const ARTIFACT_FORMAT: &str = "diabetes-risk/bincode-v1";

/// Leading fields shared by both artifact files
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    format: String,
    pair_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    format: String,
    pair_id: Uuid,
    created_at: DateTime<Utc>,
    payload: T,
}

/// Fitted scaler and classifier that were produced by the same training run
///
/// The two halves are stored as separate files. Both carry the same `pair_id`,
/// and loading refuses files whose ids differ.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    pair_id: Uuid,
    created_at: DateTime<Utc>,
    scaler: StandardScaler,
    model: GradientBoostingClassifier,
}

/// Serializable summary of a loaded pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub format: String,
    pub pair_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub scaler_samples: usize,
    pub model: ModelMetadata,
}

impl ArtifactPair {
    pub fn new(scaler: StandardScaler, model: GradientBoostingClassifier) -> Result<Self> {
        let pair = Self {
            pair_id: Uuid::new_v4(),
            created_at: Utc::now(),
            scaler,
            model,
        };
        pair.verify()?;
        Ok(pair)
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &GradientBoostingClassifier {
        &self.model
    }

    pub fn pair_id(&self) -> Uuid {
        self.pair_id
    }

    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            format: ARTIFACT_FORMAT.to_string(),
            pair_id: self.pair_id,
            created_at: self.created_at,
            scaler_samples: self.scaler.n_samples_seen(),
            model: self.model.metadata().clone(),
        }
    }

    /// Write both files, creating parent directories as needed
    pub fn save(&self, scaler_path: &Path, model_path: &Path) -> Result<()> {
        write_envelope(scaler_path, self.envelope(&self.scaler))?;
        write_envelope(model_path, self.envelope(&self.model))?;

        info!(
            pair_id = %self.pair_id,
            scaler = %scaler_path.display(),
            model = %model_path.display(),
            "Saved artifact pair"
        );
        Ok(())
    }

    pub fn load(scaler_path: &Path, model_path: &Path) -> Result<Self> {
        let scaler: Envelope<StandardScaler> = read_envelope(scaler_path)?;
        let model: Envelope<GradientBoostingClassifier> = read_envelope(model_path)?;

        if scaler.pair_id != model.pair_id {
            return Err(AppError::Artifact(format!(
                "scaler {} (pair {}) and model {} (pair {}) come from different training runs",
                scaler_path.display(),
                scaler.pair_id,
                model_path.display(),
                model.pair_id
            )));
        }

        let pair = Self {
            pair_id: model.pair_id,
            created_at: model.created_at,
            scaler: scaler.payload,
            model: model.payload,
        };
        pair.verify()?;

        info!(
            pair_id = %pair.pair_id,
            created_at = %pair.created_at,
            "Loaded artifact pair"
        );
        Ok(pair)
    }

    fn verify(&self) -> Result<()> {
        if self.scaler.n_features() != FEATURE_COUNT {
            return Err(AppError::Artifact(format!(
                "scaler was fitted on {} features, expected {}",
                self.scaler.n_features(),
                FEATURE_COUNT
            )));
        }
        if self.model.metadata().n_features != FEATURE_COUNT {
            return Err(AppError::Artifact(format!(
                "model was fitted on {} features, expected {}",
                self.model.metadata().n_features,
                FEATURE_COUNT
            )));
        }
        if !self.model.is_trained() {
            return Err(AppError::Artifact("model has not been trained".to_string()));
        }
        Ok(())
    }

    fn envelope<'a, T>(&self, payload: &'a T) -> Envelope<&'a T> {
        Envelope {
            format: ARTIFACT_FORMAT.to_string(),
            pair_id: self.pair_id,
            created_at: self.created_at,
            payload,
        }
    }
}

fn write_envelope<T: Serialize>(path: &Path, envelope: Envelope<T>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let bytes = bincode::serialize(&envelope)?;
    fs::write(path, bytes)
        .map_err(|e| AppError::Artifact(format!("failed to write {}: {}", path.display(), e)))
}

fn read_envelope<T: DeserializeOwned>(path: &Path) -> Result<Envelope<T>> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::Artifact(format!("failed to read {}: {}", path.display(), e)))?;

    let header: Header = bincode::deserialize(&bytes).map_err(|e| {
        AppError::Artifact(format!("{} is not an artifact file: {}", path.display(), e))
    })?;
    if header.format != ARTIFACT_FORMAT {
        return Err(AppError::Artifact(format!(
            "{} has format {:?}, expected {:?}",
            path.display(),
            header.format,
            ARTIFACT_FORMAT
        )));
    }

    bincode::deserialize(&bytes)
        .map_err(|e| AppError::Artifact(format!("{} is corrupt: {}", path.display(), e)))
}
