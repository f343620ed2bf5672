//! Diabetes risk predictor
//!
//! An offline trainer turns a labeled CSV into a fitted scaler and a
//! gradient-boosted classifier; an axum server loads that pair once and
//! classifies patient records submitted through an HTML form or JSON.

pub mod api;
pub mod config;
pub mod error;
pub mod ml;
pub mod models;
pub mod observability;

pub use error::{AppError, Result};
