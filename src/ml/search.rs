use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, GradientBoostingClassifier};
use crate::ml::dataset::Dataset;
use crate::ml::models::{BoostingParams, ModelMetrics, ParamGrid};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// K-fold splitter that keeps class proportions in every fold (no shuffling)
///
/// Rows of each class are handed out to folds in their original order; the
/// per-fold class counts are derived by dealing the sorted labels round-robin.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedKFold {
    n_splits: usize,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// (train, test) row indices per fold
    pub fn split(&self, labels: &[usize]) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let k = self.n_splits;
        if k < 2 {
            return Err(AppError::Training(format!(
                "cross-validation needs at least 2 folds, got {}",
                k
            )));
        }

        let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
        let mut class_counts = vec![0usize; n_classes];
        for &l in labels {
            class_counts[l] += 1;
        }
        if let Some((class, &count)) = class_counts
            .iter()
            .enumerate()
            .find(|(_, &c)| c > 0 && c < k)
        {
            return Err(AppError::Training(format!(
                "class {} has {} samples, fewer than {} folds",
                class, count, k
            )));
        }

        let mut sorted = labels.to_vec();
        sorted.sort_unstable();
        let mut allocation = vec![vec![0usize; n_classes]; k];
        for (fold, counts) in allocation.iter_mut().enumerate() {
            for &l in sorted.iter().skip(fold).step_by(k) {
                counts[l] += 1;
            }
        }

        let mut test_fold = vec![0usize; labels.len()];
        for class in 0..n_classes {
            let mut folds_for_class =
                (0..k).flat_map(|f| std::iter::repeat(f).take(allocation[f][class]));
            for (i, &l) in labels.iter().enumerate() {
                if l == class {
                    test_fold[i] = folds_for_class.next().unwrap_or(k - 1);
                }
            }
        }

        Ok((0..k)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&i| test_fold[i] == fold);
                (train, test)
            })
            .collect())
    }
}

/// Cross-validated score of one grid point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateScore {
    pub params: BoostingParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
    /// 1 = best; equal means share a rank
    pub rank: usize,
}

/// Outcome of a grid search: every candidate's scores plus the refit winner
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub candidates: Vec<CandidateScore>,
    pub best_index: usize,
    pub best_estimator: GradientBoostingClassifier,
}

impl GridSearchResult {
    pub fn best_params(&self) -> BoostingParams {
        self.candidates[self.best_index].params
    }

    pub fn best_score(&self) -> f64 {
        self.candidates[self.best_index].mean_score
    }
}

/// Exhaustive search over a parameter grid scored by mean fold accuracy
#[derive(Debug, Clone)]
pub struct GridSearchCv {
    grid: ParamGrid,
    cv: StratifiedKFold,
}

impl GridSearchCv {
    pub fn new(grid: ParamGrid, folds: usize) -> Self {
        Self {
            grid,
            cv: StratifiedKFold::new(folds),
        }
    }

    pub fn fit(&self, dataset: &Dataset) -> Result<GridSearchResult> {
        let params = self.grid.candidates();
        if params.is_empty() {
            return Err(AppError::Training("parameter grid is empty".to_string()));
        }

        let folds: Vec<(Dataset, Dataset)> = self
            .cv
            .split(&dataset.labels)?
            .into_iter()
            .map(|(train, test)| (dataset.select(&train), dataset.select(&test)))
            .collect();

        info!(
            candidates = params.len(),
            folds = folds.len(),
            samples = dataset.n_samples(),
            "Starting grid search"
        );

        let jobs: Vec<(usize, usize)> = (0..params.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| {
                let (train, test) = &folds[f];
                let mut model = GradientBoostingClassifier::new(params[c]);
                model.train(train)?;
                let predicted = model.predict(&test.features)?;
                Ok(ModelMetrics::from_predictions(&test.labels, &predicted).accuracy)
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut candidates: Vec<CandidateScore> = params
            .iter()
            .enumerate()
            .map(|(c, &p)| {
                let fold_scores = scores[c * folds.len()..(c + 1) * folds.len()].to_vec();
                let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                let variance = fold_scores
                    .iter()
                    .map(|s| (s - mean_score).powi(2))
                    .sum::<f64>()
                    / fold_scores.len() as f64;
                CandidateScore {
                    params: p,
                    fold_scores,
                    mean_score,
                    std_score: variance.sqrt(),
                    rank: 0,
                }
            })
            .collect();

        let means: Vec<f64> = candidates.iter().map(|c| c.mean_score).collect();
        for candidate in candidates.iter_mut() {
            candidate.rank = 1 + means.iter().filter(|&&m| m > candidate.mean_score).count();
            debug!(
                params = %candidate.params,
                mean = candidate.mean_score,
                std = candidate.std_score,
                rank = candidate.rank,
                "Candidate scored"
            );
        }

        let mut best_index = 0;
        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.mean_score > candidates[best_index].mean_score {
                best_index = i;
            }
        }

        let best = &candidates[best_index];
        info!(
            params = %best.params,
            cv_accuracy = best.mean_score,
            "Refitting best candidate on all samples"
        );

        let mut best_estimator = GradientBoostingClassifier::new(best.params);
        best_estimator.train(dataset)?;
        best_estimator.set_cv_score(best.mean_score);

        Ok(GridSearchResult {
            candidates,
            best_index,
            best_estimator,
        })
    }
}
