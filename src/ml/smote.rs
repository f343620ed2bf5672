use crate::error::{AppError, Result};
use crate::ml::dataset::Dataset;
use linfa_nn::{distance::L2Dist, CommonNearestNeighbour, NearestNeighbour};
use ndarray::{concatenate, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Synthetic minority oversampling
///
/// Each synthetic row lies on the segment between a random minority sample and
/// one of its `k_neighbors` nearest minority neighbours. The minority class is
/// grown until it matches the majority class; original rows come first in the
/// output, synthetic rows after them.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Self { k_neighbors, seed }
    }

    pub fn fit_resample(&self, dataset: &Dataset) -> Result<Dataset> {
        let [n_low, n_high] = dataset.class_counts();
        if n_low == n_high {
            debug!(n_low, n_high, "Classes already balanced, skipping oversampling");
            return Ok(dataset.clone());
        }
        if n_low == 0 || n_high == 0 {
            return Err(AppError::Training(
                "oversampling needs samples of both classes".to_string(),
            ));
        }
        if self.k_neighbors == 0 {
            return Err(AppError::Training(
                "SMOTE needs at least one neighbour".to_string(),
            ));
        }

        let (minority, n_minority, n_majority) = if n_low < n_high {
            (0, n_low, n_high)
        } else {
            (1, n_high, n_low)
        };
        if n_minority <= self.k_neighbors {
            return Err(AppError::Training(format!(
                "minority class has {} samples; SMOTE with k={} needs more than k",
                n_minority, self.k_neighbors
            )));
        }

        let minority_rows: Vec<usize> = dataset
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == minority)
            .map(|(i, _)| i)
            .collect();
        let x_min = dataset.features.select(Axis(0), &minority_rows);

        let neighbours = self.neighbours(&x_min)?;

        let n_synthetic = n_majority - n_minority;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut synthetic = Array2::zeros((n_synthetic, x_min.ncols()));

        for mut row in synthetic.outer_iter_mut() {
            let pick = rng.gen_range(0..n_minority * self.k_neighbors);
            let base = pick / self.k_neighbors;
            let neighbour = neighbours[base][pick % self.k_neighbors];
            let step: f64 = rng.gen();

            let origin = x_min.row(base);
            let target = x_min.row(neighbour);
            for (j, value) in row.iter_mut().enumerate() {
                *value = origin[j] + step * (target[j] - origin[j]);
            }
        }

        let features = concatenate(Axis(0), &[dataset.features.view(), synthetic.view()])
            .map_err(|e| AppError::Internal(format!("failed to append synthetic rows: {}", e)))?;
        let mut labels = dataset.labels.clone();
        labels.extend(std::iter::repeat(minority).take(n_synthetic));

        debug!(
            minority,
            n_minority, n_majority, n_synthetic, "Generated synthetic minority samples"
        );

        Dataset::new(features, labels)
    }

    /// `k_neighbors` nearest other rows for every row of `x`
    fn neighbours(&self, x: &Array2<f64>) -> Result<Vec<Vec<usize>>> {
        let index = CommonNearestNeighbour::KdTree
            .from_batch(x, L2Dist)
            .map_err(|e| AppError::Training(format!("failed to build neighbour index: {}", e)))?;

        x.outer_iter()
            .enumerate()
            .map(|(i, row)| {
                let found = index
                    .k_nearest(row, self.k_neighbors + 1)
                    .map_err(|e| AppError::Training(format!("neighbour query failed: {}", e)))?;
                let ids: Vec<usize> = found
                    .into_iter()
                    .map(|(_, id)| id)
                    .filter(|&id| id != i)
                    .take(self.k_neighbors)
                    .collect();
                if ids.len() < self.k_neighbors {
                    return Err(AppError::Training(format!(
                        "row {} has only {} neighbours",
                        i,
                        ids.len()
                    )));
                }
                Ok(ids)
            })
            .collect()
    }
}
