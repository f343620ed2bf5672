use crate::error::{AppError, Result};
use crate::ml::dataset::Dataset;
use crate::ml::models::{BoostingParams, ModelMetadata, ModelMetrics, ModelType};
use crate::ml::tree::RegressionTree;
use crate::models::{RiskLabel, FEATURE_COUNT};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Trait for classifiers
pub trait Classifier: Send + Sync {
    /// Train the classifier
    fn train(&mut self, dataset: &Dataset) -> Result<ModelMetrics>;

    /// Predict class labels
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>>;

    /// Predict class probabilities (columns: low, high)
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// Gradient-boosted regression trees on the binomial log-loss
///
/// The raw score is `init_score + Σ learning_rate · tree(x)`; the predicted
/// label is high risk iff the raw score is positive (probability above 0.5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradientBoostingClassifier {
    /// Model metadata
    metadata: ModelMetadata,

    params: BoostingParams,

    /// Log-odds of the positive class in the training labels
    init_score: f64,

    trees: Vec<RegressionTree>,

    trained: bool,
}

impl GradientBoostingClassifier {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            metadata: ModelMetadata {
                name: "Gradient Boosting Classifier".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                model_type: ModelType::GradientBoosting,
                trained_at: chrono::Utc::now(),
                n_training_samples: 0,
                n_features: FEATURE_COUNT,
                training_metrics: ModelMetrics::new(),
                cv_score: None,
                hyperparameters: params.to_map(),
            },
            params,
            init_score: 0.0,
            trees: Vec::new(),
            trained: false,
        }
    }

    pub fn params(&self) -> BoostingParams {
        self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Record the cross-validated accuracy that selected this model
    pub fn set_cv_score(&mut self, score: f64) {
        self.metadata.cv_score = Some(score);
    }

    /// Raw boosted score (log-odds of high risk) for one standardized row
    pub fn decision_function(&self, row: ArrayView1<f64>) -> Result<f64> {
        if !self.trained {
            return Err(AppError::Internal("Model not trained".to_string()));
        }
        if row.len() != self.metadata.n_features {
            return Err(AppError::Validation(format!(
                "model expects {} features, got {}",
                self.metadata.n_features,
                row.len()
            )));
        }

        let lr = self.params.learning_rate;
        Ok(self
            .trees
            .iter()
            .fold(self.init_score, |acc, tree| acc + lr * tree.predict_row(row)))
    }

    /// Label and probability of that label for one standardized row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<(RiskLabel, f64)> {
        let raw = self.decision_function(row)?;
        let p_high = sigmoid(raw);
        if raw > 0.0 {
            Ok((RiskLabel::High, p_high))
        } else {
            Ok((RiskLabel::Low, 1.0 - p_high))
        }
    }
}

impl Classifier for GradientBoostingClassifier {
    fn train(&mut self, dataset: &Dataset) -> Result<ModelMetrics> {
        let [n_low, n_high] = dataset.class_counts();
        if n_low == 0 || n_high == 0 {
            return Err(AppError::Training(
                "gradient boosting needs samples of both classes".to_string(),
            ));
        }
        if self.params.n_estimators == 0 || self.params.learning_rate <= 0.0 {
            return Err(AppError::Training(format!(
                "invalid boosting parameters: {}",
                self.params
            )));
        }

        let x = dataset.features.view();
        let y: Vec<f64> = dataset.labels.iter().map(|&l| l as f64).collect();
        let n = y.len();

        let prior = n_high as f64 / n as f64;
        let init_score = (prior / (1.0 - prior)).ln();
        let mut raw = vec![init_score; n];
        let mut residual = vec![0.0; n];
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            for i in 0..n {
                residual[i] = y[i] - sigmoid(raw[i]);
            }

            // Newton step per leaf: Σ r / Σ p(1-p)
            let leaf_value = |idx: &[usize]| {
                let (num, den) = idx.iter().fold((0.0, 0.0), |(num, den), &i| {
                    let p = y[i] - residual[i];
                    (num + residual[i], den + p * (1.0 - p))
                });
                if den.abs() < 1e-150 {
                    0.0
                } else {
                    num / den
                }
            };

            let tree = RegressionTree::fit(x, &residual, self.params.max_depth, leaf_value);
            for (i, row) in x.outer_iter().enumerate() {
                raw[i] += self.params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        self.init_score = init_score;
        self.trees = trees;
        self.trained = true;

        let predictions = self.predict(&dataset.features)?;
        let metrics = ModelMetrics::from_predictions(&dataset.labels, &predictions);

        self.metadata.n_training_samples = n;
        self.metadata.n_features = dataset.features.ncols();
        self.metadata.trained_at = chrono::Utc::now();
        self.metadata.training_metrics = metrics.clone();

        Ok(metrics)
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Vec<usize>> {
        features
            .outer_iter()
            .map(|row| self.predict_row(row).map(|(label, _)| label.class()))
            .collect()
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        let mut proba = Array2::zeros((features.nrows(), 2));
        for (i, row) in features.outer_iter().enumerate() {
            let p_high = sigmoid(self.decision_function(row)?);
            proba[[i, 0]] = 1.0 - p_high;
            proba[[i, 1]] = p_high;
        }
        Ok(proba)
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::GradientBoosting
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}

/// Apply the fitted classifier to one standardized patient vector
pub fn classify(vector: &[f64; FEATURE_COUNT], model: &GradientBoostingClassifier) -> Result<RiskLabel> {
    model
        .predict_row(ArrayView1::from(&vector[..]))
        .map(|(label, _)| label)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated clusters on glucose (column 1) with label = high glucose
    fn separable_dataset() -> Dataset {
        let n = 40;
        let mut features = Array2::zeros((n, FEATURE_COUNT));
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let high = i % 2 == 1;
            for j in 0..FEATURE_COUNT {
                features[[i, j]] = ((i * 7 + j * 3) % 11) as f64 / 10.0;
            }
            features[[i, 1]] = if high { 2.0 + i as f64 * 0.01 } else { -2.0 - i as f64 * 0.01 };
            labels.push(usize::from(high));
        }
        Dataset::new(features, labels).unwrap()
    }

    #[test]
    fn test_untrained_model_refuses_to_predict() {
        let model = GradientBoostingClassifier::new(BoostingParams::default());
        assert!(!model.is_trained());
        assert!(classify(&[0.0; FEATURE_COUNT], &model).is_err());
    }

    #[test]
    fn test_fits_separable_data() {
        let dataset = separable_dataset();
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            learning_rate: 0.1,
            max_depth: 2,
            n_estimators: 20,
        });
        let metrics = model.train(&dataset).unwrap();

        assert!(model.is_trained());
        assert_eq!(model.n_trees(), 20);
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(model.metadata().n_training_samples, 40);

        let mut high = [0.0; FEATURE_COUNT];
        high[1] = 3.0;
        let mut low = [0.0; FEATURE_COUNT];
        low[1] = -3.0;
        assert_eq!(classify(&high, &model).unwrap(), RiskLabel::High);
        assert_eq!(classify(&low, &model).unwrap(), RiskLabel::Low);
    }

    #[test]
    fn test_probabilities_are_consistent_with_labels() {
        let dataset = separable_dataset();
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            learning_rate: 0.1,
            max_depth: 3,
            n_estimators: 10,
        });
        model.train(&dataset).unwrap();

        let proba = model.predict_proba(&dataset.features).unwrap();
        let labels = model.predict(&dataset.features).unwrap();
        for (row, label) in proba.outer_iter().zip(labels) {
            assert!((row[0] + row[1] - 1.0).abs() < 1e-12);
            assert_eq!(label, usize::from(row[1] > 0.5));
        }
    }

    #[test]
    fn test_init_score_is_prior_log_odds() {
        let mut dataset = separable_dataset();
        // 3:1 ratio of high to low
        for (i, label) in dataset.labels.iter_mut().enumerate() {
            *label = usize::from(i % 4 != 0);
        }
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            learning_rate: 0.1,
            max_depth: 1,
            n_estimators: 1,
        });
        model.train(&dataset).unwrap();
        assert!((model.init_score - 3.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_single_stump_matches_newton_leaf_values() {
        // one informative column; y = [0, 0, 1, 1]
        let features = Array2::from_shape_fn((4, FEATURE_COUNT), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                0.0
            }
        });
        let dataset = Dataset::new(features, vec![0, 0, 1, 1]).unwrap();
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            learning_rate: 1.0,
            max_depth: 1,
            n_estimators: 1,
        });
        model.train(&dataset).unwrap();

        // init 0, residuals ±0.5, p(1-p) = 0.25 per row: leaf = ±1.0 / 0.5
        assert_eq!(model.init_score, 0.0);
        let expected = [-2.0, -2.0, 2.0, 2.0];
        for (row, want) in dataset.features.outer_iter().zip(expected) {
            let raw = model.decision_function(row).unwrap();
            assert!((raw - want).abs() < 1e-9, "raw {} != {}", raw, want);
        }
    }

    #[test]
    fn test_single_class_rejected() {
        let mut dataset = separable_dataset();
        dataset.labels.iter_mut().for_each(|l| *l = 0);
        let mut model = GradientBoostingClassifier::new(BoostingParams::default());
        assert!(matches!(model.train(&dataset), Err(AppError::Training(_))));
    }

    #[test]
    fn test_training_is_deterministic() {
        let dataset = separable_dataset();
        let params = BoostingParams {
            learning_rate: 0.1,
            max_depth: 3,
            n_estimators: 15,
        };
        let mut a = GradientBoostingClassifier::new(params);
        let mut b = GradientBoostingClassifier::new(params);
        a.train(&dataset).unwrap();
        b.train(&dataset).unwrap();
        assert_eq!(a.trees, b.trees);
        assert_eq!(a.init_score, b.init_score);
    }
}
