use crate::models::{Feature, RiskLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Trainer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Labeled dataset (CSV with header)
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Columns whose zeros are imputed with the non-zero median
    #[serde(default = "default_zero_as_missing")]
    pub zero_as_missing: Vec<Feature>,

    /// Neighbours considered when synthesizing minority samples
    #[serde(default = "default_smote_k_neighbors")]
    pub smote_k_neighbors: usize,

    /// Cross-validation folds
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Seed for oversampling
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,

    /// Hyperparameter grid
    #[serde(default)]
    pub grid: ParamGrid,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            zero_as_missing: default_zero_as_missing(),
            smote_k_neighbors: default_smote_k_neighbors(),
            cv_folds: default_cv_folds(),
            random_seed: default_random_seed(),
            grid: ParamGrid::default(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/diabetes.csv")
}

fn default_zero_as_missing() -> Vec<Feature> {
    Feature::ZERO_AS_MISSING.to_vec()
}

fn default_smote_k_neighbors() -> usize {
    5
}

fn default_cv_folds() -> usize {
    5
}

fn default_random_seed() -> u64 {
    42
}

/// Values searched for each gradient boosting hyperparameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamGrid {
    pub learning_rates: Vec<f64>,
    pub max_depths: Vec<usize>,
    pub n_estimators: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            learning_rates: vec![0.01, 0.1],
            max_depths: vec![3, 5],
            n_estimators: vec![100, 200],
        }
    }
}

impl ParamGrid {
    /// Every combination, parameter names in alphabetical order with the last varying fastest
    pub fn candidates(&self) -> Vec<BoostingParams> {
        let mut out = Vec::with_capacity(self.len());
        for &learning_rate in &self.learning_rates {
            for &max_depth in &self.max_depths {
                for &n_estimators in &self.n_estimators {
                    out.push(BoostingParams {
                        learning_rate,
                        max_depth,
                        n_estimators,
                    });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.learning_rates.len() * self.max_depths.len() * self.n_estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Gradient boosting hyperparameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoostingParams {
    pub learning_rate: f64,
    pub max_depth: usize,
    pub n_estimators: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_depth: 3,
            n_estimators: 100,
        }
    }
}

impl BoostingParams {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        [
            ("learning_rate".to_string(), self.learning_rate.to_string()),
            ("max_depth".to_string(), self.max_depth.to_string()),
            ("n_estimators".to_string(), self.n_estimators.to_string()),
        ]
        .into_iter()
        .collect()
    }
}

impl std::fmt::Display for BoostingParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "learning_rate={}, max_depth={}, n_estimators={}",
            self.learning_rate, self.max_depth, self.n_estimators
        )
    }
}

/// Prediction result with confidence score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction<T> {
    /// Predicted value
    pub value: T,

    /// Model probability of the predicted value (0.0 - 1.0)
    pub confidence: f64,
}

impl<T> Prediction<T> {
    pub fn new(value: T, confidence: f64) -> Self {
        Self { value, confidence }
    }
}

/// Model evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Precision (macro average)
    pub precision: f64,

    /// Recall (macro average)
    pub recall: f64,

    /// F1 score (macro average)
    pub f1_score: f64,

    /// Rows are true class, columns predicted class
    pub confusion_matrix: [[usize; 2]; 2],

    /// Per-class metrics
    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            confusion_matrix: [[0; 2]; 2],
            per_class_metrics: BTreeMap::new(),
        }
    }

    /// Compare binary labels against predictions
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::new();
        }

        let mut confusion_matrix = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if t < 2 && p < 2 {
                confusion_matrix[t][p] += 1;
            }
        }

        let correct = confusion_matrix[0][0] + confusion_matrix[1][1];
        let accuracy = correct as f64 / n_samples as f64;

        let mut per_class = BTreeMap::new();
        for class in [RiskLabel::Low, RiskLabel::High] {
            let c = class.class();
            let other = 1 - c;
            let tp = confusion_matrix[c][c];
            let fp = confusion_matrix[other][c];
            let fn_count = confusion_matrix[c][other];

            let precision = if tp + fp > 0 {
                tp as f64 / (tp + fp) as f64
            } else {
                0.0
            };

            let recall = if tp + fn_count > 0 {
                tp as f64 / (tp + fn_count) as f64
            } else {
                0.0
            };

            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            per_class.insert(
                class.to_string(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score: f1,
                    support: tp + fn_count,
                },
            );
        }

        let n_classes = per_class.len() as f64;
        let avg_precision = per_class.values().map(|m| m.precision).sum::<f64>() / n_classes;
        let avg_recall = per_class.values().map(|m| m.recall).sum::<f64>() / n_classes;
        let avg_f1 = per_class.values().map(|m| m.f1_score).sum::<f64>() / n_classes;

        Self {
            accuracy,
            precision: avg_precision,
            recall: avg_recall,
            f1_score: avg_f1,
            confusion_matrix,
            per_class_metrics: per_class,
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Crate version that produced the model
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples (after oversampling)
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Training metrics
    pub training_metrics: ModelMetrics,

    /// Mean cross-validated accuracy of the selected hyperparameters
    pub cv_score: Option<f64>,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Gradient-boosted regression trees on the log-odds
    GradientBoosting,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::GradientBoosting => write!(f, "Gradient Boosting"),
        }
    }
}
