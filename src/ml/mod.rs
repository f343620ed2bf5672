/// Machine learning pipeline for diabetes risk classification
///
/// This module provides:
/// - CSV dataset loading and zero-as-missing median imputation
/// - Standard scaling
/// - SMOTE minority oversampling
/// - Gradient-boosted regression trees
/// - Stratified cross-validated grid search
/// - Persisted scaler/model artifact pairs and the prediction service

pub mod artifacts;
pub mod classifier;
pub mod dataset;
pub mod models;
pub mod scaler;
pub mod search;
pub mod service;
pub mod smote;
pub mod trainer;
pub mod tree;

pub use artifacts::{ArtifactInfo, ArtifactPair, ARTIFACT_FORMAT};
pub use classifier::{classify, Classifier, GradientBoostingClassifier};
pub use dataset::Dataset;
pub use models::{
    BoostingParams, ClassMetrics, ModelMetadata, ModelMetrics, ModelType, ParamGrid, Prediction,
    TrainingConfig,
};
pub use scaler::{standardize, StandardScaler};
pub use search::{CandidateScore, GridSearchCv, GridSearchResult, StratifiedKFold};
pub use service::{PredictionService, PredictionServiceStats};
pub use smote::Smote;
pub use trainer::{Trainer, TrainingReport};
