use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use validator::Validate;

/// Number of measurements in a patient record
pub const FEATURE_COUNT: usize = 8;

/// Dataset column holding the binary label
pub const OUTCOME_COLUMN: &str = "Outcome";

/// Patient measurements in canonical (training column) order
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    Display,
    IntoStaticStr,
)]
pub enum Feature {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    #[strum(serialize = "BMI")]
    #[serde(rename = "BMI")]
    Bmi,
    DiabetesPedigreeFunction,
    Age,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Pregnancies,
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
        Feature::DiabetesPedigreeFunction,
        Feature::Age,
    ];

    /// Columns where a zero means "not measured" in the training dataset
    pub const ZERO_AS_MISSING: [Feature; 4] = [
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
    ];

    /// Position in the feature vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Header name in the dataset CSV
    pub fn column_name(self) -> &'static str {
        self.into()
    }

    /// Resolve a CSV header cell to a feature
    pub fn from_column(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// Form / JSON field name
    pub fn field_name(self) -> &'static str {
        match self {
            Feature::Pregnancies => "pregnancies",
            Feature::Glucose => "glucose",
            Feature::BloodPressure => "blood_pressure",
            Feature::SkinThickness => "skin_thickness",
            Feature::Insulin => "insulin",
            Feature::Bmi => "bmi",
            Feature::DiabetesPedigreeFunction => "diabetes_pedigree",
            Feature::Age => "age",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Pregnancies",
            Feature::Glucose => "Glucose Level (mg/dL)",
            Feature::BloodPressure => "Blood Pressure (mm Hg)",
            Feature::SkinThickness => "Skin Thickness (mm)",
            Feature::Insulin => "Insulin Level (mu U/ml)",
            Feature::Bmi => "BMI (Body Mass Index)",
            Feature::DiabetesPedigreeFunction => "Diabetes Pedigree Function",
            Feature::Age => "Age",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Number of times the patient has been pregnant.",
            Feature::Glucose => "Plasma glucose concentration after 2 hours of oral test.",
            Feature::BloodPressure => "Diastolic blood pressure in mm Hg.",
            Feature::SkinThickness => "Triceps skin fold thickness in millimeters.",
            Feature::Insulin => "2-hour serum insulin in micro units per mL.",
            Feature::Bmi => "Body mass index = weight / height² (kg/m²).",
            Feature::DiabetesPedigreeFunction => "Probability of diabetes based on family history.",
            Feature::Age => "Age of the person in years.",
        }
    }

    /// Smallest value the input layer accepts
    pub fn minimum(self) -> f64 {
        match self {
            Feature::Age => 1.0,
            _ => 0.0,
        }
    }

    /// Input granularity for the form
    pub fn step(self) -> &'static str {
        match self {
            Feature::Bmi => "0.1",
            Feature::DiabetesPedigreeFunction => "0.01",
            _ => "1",
        }
    }
}

/// One patient's eight measurements
///
/// Zero is a literal measurement here; the zero-as-missing convention only
/// applies to the training dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate, PartialEq)]
pub struct PatientRecord {
    #[validate(range(min = 0.0))]
    pub pregnancies: f64,

    #[validate(range(min = 0.0))]
    pub glucose: f64,

    #[validate(range(min = 0.0))]
    pub blood_pressure: f64,

    #[validate(range(min = 0.0))]
    pub skin_thickness: f64,

    #[validate(range(min = 0.0))]
    pub insulin: f64,

    #[validate(range(min = 0.0))]
    pub bmi: f64,

    #[validate(range(min = 0.0))]
    pub diabetes_pedigree: f64,

    #[validate(range(min = 1.0))]
    pub age: f64,
}

impl PatientRecord {
    /// Assemble the vector in training column order
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.pregnancies,
            self.glucose,
            self.blood_pressure,
            self.skin_thickness,
            self.insulin,
            self.bmi,
            self.diabetes_pedigree,
            self.age,
        ]
    }

    pub fn from_features(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            pregnancies: values[0],
            glucose: values[1],
            blood_pressure: values[2],
            skin_thickness: values[3],
            insulin: values[4],
            bmi: values[5],
            diabetes_pedigree: values[6],
            age: values[7],
        }
    }

    /// Run the input-layer checks: finite, non-negative, age at least 1
    pub fn check(&self) -> Result<()> {
        for (feature, value) in Feature::ALL.iter().zip(self.to_features()) {
            if !value.is_finite() {
                return Err(AppError::Validation(format!(
                    "{} must be a finite number",
                    feature.field_name()
                )));
            }
        }
        self.validate()?;
        Ok(())
    }
}

/// Binary classifier output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLabel {
    Low,
    High,
}

impl RiskLabel {
    /// Class index used by the classifier (0 = low, 1 = high)
    pub fn class(self) -> usize {
        match self {
            RiskLabel::Low => 0,
            RiskLabel::High => 1,
        }
    }

    pub fn from_class(class: usize) -> Option<Self> {
        match class {
            0 => Some(RiskLabel::Low),
            1 => Some(RiskLabel::High),
            _ => None,
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, RiskLabel::High)
    }

    pub fn headline(self) -> &'static str {
        match self {
            RiskLabel::High => "High Risk Detected!",
            RiskLabel::Low => "Low Risk Detected!",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            RiskLabel::High => "Please consult a healthcare professional as soon as possible.",
            RiskLabel::Low => "You're doing great! Stay healthy and maintain regular checkups.",
        }
    }
}
