//! # Feature Schema
//!
//! The fixed, ordered set of clinical fields the risk model is trained on.
//! Column names match the public heart-disease table layout (`cp`, `trestbps`,
//! `thalach`, ...). The order of [`Feature::ALL`] is the order of the columns
//! in every feature matrix and of the weights after the bias in every
//! coefficient vector. Nothing else in the crate is allowed to invent an order.

use std::fmt;

/// Name of the binary outcome column.
pub const LABEL_COLUMN: &str = "target";

/// Number of features, excluding the bias column.
pub const NUM_FEATURES: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Age,
    Sex,
    ChestPainType,
    RestingBloodPressure,
    Cholesterol,
    FastingBloodSugar,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    StDepression,
    Slope,
    VesselCount,
    Thalassemia,
}

impl Feature {
    /// All features in canonical column order.
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::Age,
        Feature::Sex,
        Feature::ChestPainType,
        Feature::RestingBloodPressure,
        Feature::Cholesterol,
        Feature::FastingBloodSugar,
        Feature::RestingEcg,
        Feature::MaxHeartRate,
        Feature::ExerciseAngina,
        Feature::StDepression,
        Feature::Slope,
        Feature::VesselCount,
        Feature::Thalassemia,
    ];

    /// Header name of this feature in the tabular source.
    pub fn column(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Sex => "sex",
            Feature::ChestPainType => "cp",
            Feature::RestingBloodPressure => "trestbps",
            Feature::Cholesterol => "chol",
            Feature::FastingBloodSugar => "fbs",
            Feature::RestingEcg => "restecg",
            Feature::MaxHeartRate => "thalach",
            Feature::ExerciseAngina => "exang",
            Feature::StDepression => "oldpeak",
            Feature::Slope => "slope",
            Feature::VesselCount => "ca",
            Feature::Thalassemia => "thal",
        }
    }

    /// Name used when reporting a field-scoped input error.
    pub fn field_name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::Sex => "gender",
            Feature::ChestPainType => "chest-pain-type",
            Feature::RestingBloodPressure => "resting-BP",
            Feature::Cholesterol => "cholesterol",
            Feature::FastingBloodSugar => "fasting-blood-sugar",
            Feature::RestingEcg => "resting-ECG",
            Feature::MaxHeartRate => "max-heart-rate",
            Feature::ExerciseAngina => "exercise-angina",
            Feature::StDepression => "ST-depression",
            Feature::Slope => "slope",
            Feature::VesselCount => "vessel-count",
            Feature::Thalassemia => "thalassemia",
        }
    }

    /// Position of this feature among the feature columns (bias excluded).
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Every column the loader must find in the header: the features, then the label.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    Feature::ALL
        .iter()
        .map(|feature| feature.column())
        .chain(std::iter::once(LABEL_COLUMN))
}
