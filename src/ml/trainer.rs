use crate::error::{AppError, Result};
use crate::ml::artifacts::ArtifactPair;
use crate::ml::classifier::Classifier;
use crate::ml::dataset::Dataset;
use crate::ml::models::{BoostingParams, ModelMetrics, TrainingConfig};
use crate::ml::scaler::StandardScaler;
use crate::ml::search::{CandidateScore, GridSearchCv};
use crate::ml::smote::Smote;
use crate::models::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Summary of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub pair_id: Uuid,
    pub rows_loaded: usize,
    /// (low, high) before oversampling
    pub class_counts_before: [usize; 2],
    /// (low, high) after oversampling
    pub class_counts_after: [usize; 2],
    pub imputed_medians: BTreeMap<Feature, f64>,
    pub candidates: Vec<CandidateScore>,
    pub best_params: BoostingParams,
    pub best_cv_accuracy: f64,
    /// Metrics of the refit model on the balanced training set
    pub training_metrics: ModelMetrics,
    pub duration_ms: u64,
}

impl TrainingReport {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Offline training pipeline
///
/// load → impute → scale → oversample → grid search → artifact pair
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run the pipeline on the configured dataset file
    pub fn run(&self) -> Result<(ArtifactPair, TrainingReport)> {
        let dataset = Dataset::load_csv(&self.config.dataset_path)?;
        self.run_on(dataset)
    }

    /// Run the pipeline on an already loaded dataset
    pub fn run_on(&self, mut dataset: Dataset) -> Result<(ArtifactPair, TrainingReport)> {
        let started = Instant::now();
        if self.config.grid.is_empty() {
            return Err(AppError::Configuration(
                "training grid has no candidates".to_string(),
            ));
        }

        let rows_loaded = dataset.n_samples();
        let class_counts_before = dataset.class_counts();
        info!(
            rows = rows_loaded,
            low = class_counts_before[0],
            high = class_counts_before[1],
            "🚀 Starting training run"
        );

        let imputed_medians = dataset.impute_zero_as_missing(&self.config.zero_as_missing)?;

        let (scaler, scaled) = StandardScaler::fit_transform(&dataset.features)?;
        let scaled = Dataset::new(scaled, dataset.labels)?;

        let balanced = Smote::new(self.config.smote_k_neighbors, self.config.random_seed)
            .fit_resample(&scaled)?;
        let class_counts_after = balanced.class_counts();
        info!(
            rows = balanced.n_samples(),
            low = class_counts_after[0],
            high = class_counts_after[1],
            "Balanced classes"
        );

        let search = GridSearchCv::new(self.config.grid.clone(), self.config.cv_folds);
        let result = search.fit(&balanced)?;

        let best_params = result.best_params();
        let best_cv_accuracy = result.best_score();
        let training_metrics = result.best_estimator.metadata().training_metrics.clone();
        let pair = ArtifactPair::new(scaler, result.best_estimator)?;

        let report = TrainingReport {
            pair_id: pair.pair_id(),
            rows_loaded,
            class_counts_before,
            class_counts_after,
            imputed_medians,
            candidates: result.candidates,
            best_params,
            best_cv_accuracy,
            training_metrics,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            params = %report.best_params,
            cv_accuracy = format!("{:.4}", report.best_cv_accuracy),
            train_accuracy = format!("{:.4}", report.training_metrics.accuracy),
            duration_ms = report.duration_ms,
            "✅ Training completed"
        );

        Ok((pair, report))
    }
}
