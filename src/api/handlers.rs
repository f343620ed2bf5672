use crate::api::views::{self, Outcome};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::ml::{ArtifactInfo, PredictionServiceStats};
use crate::models::{Feature, PatientRecord, RiskLabel, FEATURE_COUNT};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Html,
    Form, Json,
};
use serde::{Deserialize, Serialize};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        model_pair_id: state.service.info().pair_id.to_string(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub model_pair_id: String,
}

/// Empty form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(views::render_page(&state.ui, &views::default_values(), None))
}

/// Form submit: re-render the page with the verdict or the validation message
pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<PredictForm>,
) -> Result<(StatusCode, Html<String>)> {
    let values = form.values();

    let outcome = match form.to_record().and_then(|r| state.service.predict(&r)) {
        Ok(prediction) => Outcome::Verdict(prediction),
        Err(AppError::Validation(message)) => {
            let page = views::render_page(&state.ui, &values, Some(&Outcome::Invalid(message)));
            return Ok((StatusCode::BAD_REQUEST, Html(page)));
        }
        Err(e) => return Err(e),
    };

    Ok((
        StatusCode::OK,
        Html(views::render_page(&state.ui, &values, Some(&outcome))),
    ))
}

/// Urlencoded form body; values stay raw so they can be echoed back on error
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PredictForm {
    pub pregnancies: String,
    pub glucose: String,
    pub blood_pressure: String,
    pub skin_thickness: String,
    pub insulin: String,
    pub bmi: String,
    pub diabetes_pedigree: String,
    pub age: String,
}

impl PredictForm {
    pub fn values(&self) -> [String; FEATURE_COUNT] {
        [
            self.pregnancies.clone(),
            self.glucose.clone(),
            self.blood_pressure.clone(),
            self.skin_thickness.clone(),
            self.insulin.clone(),
            self.bmi.clone(),
            self.diabetes_pedigree.clone(),
            self.age.clone(),
        ]
    }

    pub fn to_record(&self) -> Result<PatientRecord> {
        let mut parsed = [0.0; FEATURE_COUNT];
        for ((feature, raw), slot) in Feature::ALL.iter().zip(self.values()).zip(parsed.iter_mut()) {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(AppError::Validation(format!("{} is required", feature.label())));
            }
            *slot = raw.parse().map_err(|_| {
                AppError::Validation(format!("{} must be a number", feature.label()))
            })?;
        }
        Ok(PatientRecord::from_features(parsed))
    }
}

/// Predict from a JSON patient record
///
/// Malformed or incomplete bodies are reported as validation errors.
pub async fn create_prediction(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PatientRecord>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let Json(record) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let prediction = state.service.predict(&record)?;
    Ok(Json(PredictionResponse {
        label: prediction.value,
        risk: prediction.value.class(),
        message: prediction.value.headline().to_string(),
        advice: prediction.value.advice().to_string(),
        confidence: prediction.confidence,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub label: RiskLabel,
    /// 1 = high risk, 0 = low risk
    pub risk: usize,
    pub message: String,
    pub advice: String,
    pub confidence: f64,
}

/// Metadata of the loaded artifact pair
pub async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>> {
    Ok(Json(ModelInfoResponse {
        artifacts: state.service.info(),
        stats: state.service.stats(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub artifacts: ArtifactInfo,
    pub stats: PredictionServiceStats,
}
