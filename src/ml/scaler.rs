use crate::error::{AppError, Result};
use crate::models::FEATURE_COUNT;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature standardization fitted on the training matrix
///
/// `z = (x - mean) / scale`, where `scale` is the population standard deviation
/// (1.0 for constant columns).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Learn mean and standard deviation per column
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(AppError::Training(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| AppError::Training("cannot compute column means".to_string()))?;
        let scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < f64::EPSILON { 1.0 } else { s });

        Ok(Self {
            mean,
            scale,
            n_samples_seen: features.nrows(),
        })
    }

    /// Fit and transform in one step
    pub fn fit_transform(features: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(features)?;
        let scaled = scaler.transform(features)?;
        Ok((scaler, scaled))
    }

    pub fn transform(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(features.ncols())?;
        Ok((features - &self.mean) / &self.scale)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        Ok((&row - &self.mean) / &self.scale)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    fn check_width(&self, width: usize) -> Result<()> {
        if width != self.mean.len() {
            return Err(AppError::Validation(format!(
                "scaler expects {} features, got {}",
                self.mean.len(),
                width
            )));
        }
        Ok(())
    }
}

/// Apply the fitted transform to one raw patient vector
pub fn standardize(vector: &[f64; FEATURE_COUNT], scaler: &StandardScaler) -> Result<[f64; FEATURE_COUNT]> {
    let scaled = scaler.transform_row(ArrayView1::from(&vector[..]))?;
    let mut out = [0.0; FEATURE_COUNT];
    for (dst, src) in out.iter_mut().zip(scaled.iter()) {
        *dst = *src;
    }
    Ok(out)
}
