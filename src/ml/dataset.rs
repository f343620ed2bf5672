use crate::error::{AppError, Result};
use crate::models::{Feature, FEATURE_COUNT, OUTCOME_COLUMN};
use ndarray::{Array2, Axis};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Labeled patient records (n_samples × 8 features, binary outcome)
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature matrix in canonical feature order
    pub features: Array2<f64>,

    /// Outcome per row (0 = low risk, 1 = high risk)
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<usize>) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(AppError::Dataset(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if features.ncols() != FEATURE_COUNT {
            return Err(AppError::Dataset(format!(
                "expected {} feature columns, got {}",
                FEATURE_COUNT,
                features.ncols()
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(AppError::Dataset(format!("outcome must be 0 or 1, got {}", bad)));
        }
        Ok(Self { features, labels })
    }

    /// Read a CSV dataset from disk
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            AppError::Dataset(format!("cannot open dataset {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.n_samples(),
            "Loaded training dataset"
        );
        Ok(dataset)
    }

    /// Parse a CSV with a header row; columns are matched by name
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut feature_columns: [Option<usize>; FEATURE_COUNT] = [None; FEATURE_COUNT];
        let mut outcome_column = None;

        for (idx, name) in headers.iter().enumerate() {
            if name == OUTCOME_COLUMN {
                outcome_column = Some(idx);
            } else if let Some(feature) = Feature::from_column(name) {
                feature_columns[feature.index()] = Some(idx);
            } else {
                warn!(column = name, "Ignoring unknown dataset column");
            }
        }

        let missing: Vec<&str> = Feature::ALL
            .iter()
            .filter(|f| feature_columns[f.index()].is_none())
            .map(|f| f.column_name())
            .chain(outcome_column.is_none().then_some(OUTCOME_COLUMN))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Dataset(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }
        let outcome_column = outcome_column.unwrap_or_default();

        let mut values = Vec::new();
        let mut labels = Vec::new();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            for feature in Feature::ALL {
                let cell = feature_columns[feature.index()]
                    .and_then(|c| record.get(c))
                    .unwrap_or_default();
                values.push(parse_cell(cell, feature.column_name(), line)?);
            }

            let outcome = parse_cell(
                record.get(outcome_column).unwrap_or_default(),
                OUTCOME_COLUMN,
                line,
            )?;
            let label = if outcome == 0.0 {
                0
            } else if outcome == 1.0 {
                1
            } else {
                return Err(AppError::Dataset(format!(
                    "line {}: {} must be 0 or 1, got {}",
                    line, OUTCOME_COLUMN, outcome
                )));
            };
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(AppError::Dataset("dataset has no rows".to_string()));
        }

        let features = Array2::from_shape_vec((labels.len(), FEATURE_COUNT), values)
            .map_err(|e| AppError::Internal(format!("feature matrix shape: {}", e)))?;

        Self::new(features, labels)
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Row counts for (low, high)
    pub fn class_counts(&self) -> [usize; 2] {
        let high = self.labels.iter().filter(|&&l| l == 1).count();
        [self.labels.len() - high, high]
    }

    /// Replace zeros in `columns` by the median of that column's non-zero values
    ///
    /// Returns the median used per column. Fails when a column has no non-zero value.
    pub fn impute_zero_as_missing(&mut self, columns: &[Feature]) -> Result<BTreeMap<Feature, f64>> {
        let mut medians = BTreeMap::new();

        for &feature in columns {
            let mut column = self.features.column_mut(feature.index());
            let mut present: Vec<f64> = column.iter().copied().filter(|&v| v != 0.0).collect();

            let fill = median(&mut present).ok_or_else(|| {
                AppError::Dataset(format!(
                    "column {} has no non-zero values; median undefined",
                    feature.column_name()
                ))
            })?;

            let mut replaced = 0usize;
            for value in column.iter_mut() {
                if *value == 0.0 {
                    *value = fill;
                    replaced += 1;
                }
            }

            debug!(
                column = feature.column_name(),
                median = fill,
                replaced,
                "Imputed zero-as-missing values"
            );
            medians.insert(feature, fill);
        }

        Ok(medians)
    }

    /// Rows selected by index, in the given order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}

fn parse_cell(cell: &str, column: &str, line: u64) -> Result<f64> {
    let value: f64 = cell.parse().map_err(|_| {
        AppError::Dataset(format!(
            "line {}: column {} is not numeric: {:?}",
            line, column, cell
        ))
    })?;
    if !value.is_finite() {
        return Err(AppError::Dataset(format!(
            "line {}: column {} is not finite",
            line, column
        )));
    }
    Ok(value)
}

/// Median with midpoint interpolation; `None` for an empty slice
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n";

    fn csv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_parse_dataset() {
        let data = csv(&[
            "6,148,72,35,0,33.6,0.627,50,1",
            "1,85,66,29,0,26.6,0.351,31,0",
            "8,183,64,0,0,23.3,0.672,32,1",
        ]);
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();

        assert_eq!(dataset.n_samples(), 3);
        assert_eq!(dataset.features.shape(), &[3, FEATURE_COUNT]);
        assert_eq!(dataset.labels, vec![1, 0, 1]);
        assert_eq!(dataset.class_counts(), [1, 2]);
        assert_eq!(dataset.features[[1, Feature::Bmi.index()]], 26.6);
    }

    #[test]
    fn test_columns_matched_by_name() {
        let data = "Outcome,Age,DiabetesPedigreeFunction,BMI,Insulin,SkinThickness,BloodPressure,Glucose,Pregnancies,Extra\n\
                    1,50,0.627,33.6,0,35,72,148,6,x\n";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();

        assert_eq!(dataset.features[[0, Feature::Pregnancies.index()]], 6.0);
        assert_eq!(dataset.features[[0, Feature::Glucose.index()]], 148.0);
        assert_eq!(dataset.features[[0, Feature::Age.index()]], 50.0);
        assert_eq!(dataset.labels, vec![1]);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let data = "Pregnancies,Glucose,BloodPressure,SkinThickness,BMI,DiabetesPedigreeFunction,Age\n\
                    6,148,72,35,33.6,0.627,50\n";
        let err = Dataset::from_reader(data.as_bytes()).unwrap_err();
        match err {
            AppError::Dataset(msg) => {
                assert!(msg.contains("Insulin"));
                assert!(msg.contains("Outcome"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_dataset_is_fatal() {
        let err = Dataset::from_reader(HEADER.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));
    }

    #[test]
    fn test_bad_outcome_and_cells() {
        let bad_outcome = csv(&["6,148,72,35,0,33.6,0.627,50,2"]);
        assert!(Dataset::from_reader(bad_outcome.as_bytes()).is_err());

        let bad_cell = csv(&["6,abc,72,35,0,33.6,0.627,50,1"]);
        assert!(Dataset::from_reader(bad_cell.as_bytes()).is_err());
    }

    #[test]
    fn test_impute_zero_as_missing() {
        let data = csv(&[
            "6,148,72,35,0,33.6,0.627,50,1",
            "1,85,0,29,94,26.6,0.351,31,0",
            "0,0,64,0,168,0,0.672,32,1",
            "2,120,80,20,0,30.0,0.2,40,0",
        ]);
        let mut dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let medians = dataset
            .impute_zero_as_missing(&Feature::ZERO_AS_MISSING)
            .unwrap();

        // non-zero glucose: 148, 85, 120 -> 120
        assert_eq!(medians[&Feature::Glucose], 120.0);
        // non-zero insulin: 94, 168 -> 131
        assert_eq!(medians[&Feature::Insulin], 131.0);

        for feature in Feature::ZERO_AS_MISSING {
            assert!(dataset.features.column(feature.index()).iter().all(|&v| v != 0.0));
        }
        assert_eq!(dataset.features[[2, Feature::Glucose.index()]], 120.0);
        assert_eq!(dataset.features[[1, Feature::BloodPressure.index()]], 72.0);

        // untouched columns keep their zeros
        assert_eq!(dataset.features[[2, Feature::Pregnancies.index()]], 0.0);
        assert_eq!(dataset.features[[2, Feature::Bmi.index()]], 0.0);
    }

    #[test]
    fn test_impute_all_zero_column_is_fatal() {
        let data = csv(&["6,148,72,35,0,33.6,0.627,50,1", "1,85,66,29,0,26.6,0.351,31,0"]);
        let mut dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let err = dataset.impute_zero_as_missing(&[Feature::Insulin]).unwrap_err();
        assert!(matches!(err, AppError::Dataset(_)));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_select_rows() {
        let data = csv(&[
            "6,148,72,35,0,33.6,0.627,50,1",
            "1,85,66,29,0,26.6,0.351,31,0",
            "8,183,64,0,0,23.3,0.672,32,1",
        ]);
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let subset = dataset.select(&[2, 1]);
        assert_eq!(subset.labels, vec![1, 0]);
        assert_eq!(subset.features[[0, Feature::Glucose.index()]], 183.0);
    }
}
