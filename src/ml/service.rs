use crate::config::ArtifactsConfig;
use crate::error::Result;
use crate::ml::artifacts::{ArtifactInfo, ArtifactPair};
use crate::ml::classifier::Classifier;
use crate::ml::models::Prediction;
use crate::ml::scaler::standardize;
use crate::models::{PatientRecord, RiskLabel};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Read-only predictor over one loaded artifact pair
///
/// Inputs are used as given: a literal zero is not imputed here even for the
/// columns whose zeros were treated as missing during training.
pub struct PredictionService {
    artifacts: ArtifactPair,

    /// Number of predictions served since startup
    served: AtomicU64,
}

impl PredictionService {
    pub fn new(artifacts: ArtifactPair) -> Self {
        Self {
            artifacts,
            served: AtomicU64::new(0),
        }
    }

    /// Load the configured artifact pair
    pub fn load(config: &ArtifactsConfig) -> Result<Self> {
        let artifacts = ArtifactPair::load(&config.scaler_path, &config.model_path)?;
        Ok(Self::new(artifacts))
    }

    /// Validate, standardize and classify one record
    pub fn predict(&self, record: &PatientRecord) -> Result<Prediction<RiskLabel>> {
        record.check()?;

        let scaled = standardize(&record.to_features(), self.artifacts.scaler())?;
        let (label, confidence) = self
            .artifacts
            .model()
            .predict_row(ArrayView1::from(&scaled[..]))?;

        self.served.fetch_add(1, Ordering::Relaxed);
        debug!("Prediction served");

        Ok(Prediction::new(label, confidence))
    }

    pub fn info(&self) -> ArtifactInfo {
        self.artifacts.info()
    }

    pub fn stats(&self) -> PredictionServiceStats {
        let metadata = self.artifacts.model().metadata();
        PredictionServiceStats {
            pair_id: self.artifacts.pair_id().to_string(),
            is_trained: self.artifacts.model().is_trained(),
            n_features: metadata.n_features,
            n_trees: self.artifacts.model().n_trees(),
            predictions_served: self.served.load(Ordering::Relaxed),
        }
    }
}

/// Prediction service statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionServiceStats {
    pub pair_id: String,
    pub is_trained: bool,
    pub n_features: usize,
    pub n_trees: usize,
    pub predictions_served: u64,
}
