//! Common test utilities
//!
//! Synthetic Pima-style datasets and small, fast training configurations
//! shared by the integration tests.

#![allow(dead_code)]

use diabetes_risk::{
    config::ArtifactsConfig,
    ml::{ArtifactPair, ParamGrid, TrainingConfig, TrainingReport, Trainer},
};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HEADER: &str =
    "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome";

/// Reference record used across prediction tests
pub const REFERENCE_RECORD: [f64; 8] = [2.0, 85.0, 66.0, 29.0, 0.0, 26.6, 0.35, 31.0];

/// Deterministic CSV with `n` rows, one in three diabetic
///
/// Diabetic rows have higher glucose and BMI. Every fifth row records a zero
/// glucose and every other row a zero insulin, as in the real dataset.
pub fn synthetic_csv(n: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..n {
        let diabetic = i % 3 == 0;
        let group = i / 3;
        let glucose = if i % 5 == 4 {
            0.0
        } else if diabetic {
            145.0 + (group % 30) as f64
        } else {
            85.0 + (group % 35) as f64
        };
        let bmi_base = if diabetic { 33.0 } else { 25.0 };
        let bmi = bmi_base + (group % 7) as f64 * 0.5;
        let insulin = if i % 2 == 0 { 0.0 } else { 60.0 + (group % 50) as f64 };
        writeln!(
            csv,
            "{},{},{},{},{},{:.1},{:.3},{},{}",
            group % 8,
            glucose,
            60 + group % 20,
            15 + group % 25,
            insulin,
            bmi,
            0.2 + (group % 10) as f64 * 0.07,
            21 + group % 40,
            u8::from(diabetic)
        )
        .unwrap();
    }
    csv
}

pub fn write_dataset(dir: &Path, n: usize) -> PathBuf {
    let path = dir.join("diabetes.csv");
    std::fs::write(&path, synthetic_csv(n)).unwrap();
    path
}

/// Training config with a 2-point grid so tests stay fast
pub fn fast_config(dataset_path: PathBuf) -> TrainingConfig {
    TrainingConfig {
        dataset_path,
        cv_folds: 3,
        grid: ParamGrid {
            learning_rates: vec![0.1],
            max_depths: vec![2, 3],
            n_estimators: vec![15],
        },
        ..TrainingConfig::default()
    }
}

pub fn artifacts_in(dir: &Path) -> ArtifactsConfig {
    ArtifactsConfig {
        scaler_path: dir.join("artifacts/scaler.bin"),
        model_path: dir.join("artifacts/model.bin"),
    }
}

/// Train on a synthetic dataset and save the pair under `dir`
pub fn train_into(dir: &Path, n: usize) -> (ArtifactsConfig, ArtifactPair, TrainingReport) {
    let dataset = write_dataset(dir, n);
    let (pair, report) = Trainer::new(fast_config(dataset)).run().unwrap();
    let artifacts = artifacts_in(dir);
    pair.save(&artifacts.scaler_path, &artifacts.model_path)
        .unwrap();
    (artifacts, pair, report)
}

pub fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}
