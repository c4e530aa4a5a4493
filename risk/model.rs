use crate::estimate::EstimationError;
use crate::input::InputRecord;
use crate::schema::{Feature, NUM_FEATURES};
use crate::types::Coefficients;
use std::fmt;
use thiserror::Error;

/// Scores at or above this percentage fall into [`RiskBand::Moderate`].
pub const MODERATE_THRESHOLD: f64 = 20.0;
/// Scores at or above this percentage fall into [`RiskBand::High`].
pub const HIGH_THRESHOLD: f64 = 50.0;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Model is not trained yet. Please load the data and train the model first.")]
    ModelNotFitted,
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Invalid value for '{field}': '{value}' is not a valid number")]
    ParseError { field: &'static str, value: String },
}

/// Qualitative recommendation band for a risk percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// `< 20` is low, `[20, 50)` is moderate, everything else is high.
    pub fn from_score(score: f64) -> Self {
        if score < MODERATE_THRESHOLD {
            RiskBand::Low
        } else if score < HIGH_THRESHOLD {
            RiskBand::Moderate
        } else {
            RiskBand::High
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            RiskBand::Low => {
                "Your risk of heart disease is low. Maintain a healthy lifestyle with a balanced diet and regular exercise."
            }
            RiskBand::Moderate => {
                "You have a moderate risk of heart disease. It is advisable to follow a heart-healthy diet, exercise regularly, and monitor your health."
            }
            RiskBand::High => {
                "You have a high risk of heart disease. Please consult with a doctor immediately for further evaluation and potential interventions."
            }
        }
    }
}

/// The score for one person and the band it falls into.
///
/// `score` is the raw linear prediction times 100. It is not clamped, so
/// values below 0 or above 100 are possible for atypical inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: f64,
    pub band: RiskBand,
    pub name: Option<String>,
}

impl RiskAssessment {
    pub fn from_score(score: f64) -> Self {
        Self {
            score,
            band: RiskBand::from_score(score),
            name: None,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        self.band.recommendation()
    }
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(
                f,
                "{name}, the predicted risk score of heart disease is: {:.2}%.",
                self.score
            )?,
            None => write!(
                f,
                "The predicted risk score of heart disease is: {:.2}%.",
                self.score
            )?,
        }
        write!(f, "\n{}", self.recommendation())
    }
}

/// A fitted linear risk model over the fixed feature schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    coefficients: Coefficients,
}

impl FittedModel {
    /// Wraps a coefficient vector, which must hold the bias plus one weight
    /// per schema feature.
    pub fn new(coefficients: Coefficients) -> Result<Self, EstimationError> {
        if coefficients.len() != NUM_FEATURES + 1 {
            return Err(EstimationError::CoefficientCount {
                expected: NUM_FEATURES + 1,
                found: coefficients.len(),
            });
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// `("bias", w0)` followed by one entry per feature column.
    pub fn named_coefficients(&self) -> Vec<(&'static str, f64)> {
        std::iter::once("bias")
            .chain(Feature::ALL.iter().map(|feature| feature.column()))
            .zip(self.coefficients.iter().copied())
            .collect()
    }

    /// Linear prediction for one record, as a percentage.
    pub fn score(&self, record: &InputRecord) -> f64 {
        record.design_row().dot(&self.coefficients.as_view()) * 100.0
    }

    pub fn assess(&self, record: &InputRecord) -> RiskAssessment {
        let score = self.score(record);
        log::debug!("Predicted risk score {score:.4}%");
        RiskAssessment {
            name: record.name().map(str::to_string),
            ..RiskAssessment::from_score(score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RawRecord;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    fn record() -> InputRecord {
        let raw = RawRecord::new()
            .with(Feature::Age, "50")
            .with(Feature::Sex, "female")
            .with(Feature::ChestPainType, "1")
            .with(Feature::RestingBloodPressure, "120")
            .with(Feature::Cholesterol, "200")
            .with(Feature::FastingBloodSugar, "false")
            .with(Feature::RestingEcg, "0")
            .with(Feature::MaxHeartRate, "160")
            .with(Feature::ExerciseAngina, "false")
            .with(Feature::StDepression, "0.5")
            .with(Feature::Slope, "2")
            .with(Feature::VesselCount, "0")
            .with(Feature::Thalassemia, "2");
        InputRecord::parse(&raw).unwrap()
    }

    fn model_with(bias: f64, age_weight: f64) -> FittedModel {
        let mut weights = Array1::zeros(NUM_FEATURES + 1);
        weights[0] = bias;
        weights[1 + Feature::Age.index()] = age_weight;
        FittedModel::new(Coefficients::new(weights)).unwrap()
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(RiskBand::from_score(19.999), RiskBand::Low);
        assert_eq!(RiskBand::from_score(20.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(49.999), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(50.0), RiskBand::High);
        assert_eq!(RiskBand::from_score(-35.0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(180.0), RiskBand::High);
    }

    #[test]
    fn score_is_dot_product_times_one_hundred() {
        let model = model_with(0.1, 0.004);
        // 0.1 + 0.004 * 50 = 0.3
        assert_abs_diff_eq!(model.score(&record()), 30.0, epsilon = 1e-9);
        assert_eq!(model.assess(&record()).band, RiskBand::Moderate);
    }

    #[test]
    fn score_is_not_clamped() {
        let high = model_with(1.0, 0.02).assess(&record());
        assert_abs_diff_eq!(high.score, 200.0, epsilon = 1e-9);
        assert_eq!(high.band, RiskBand::High);

        let negative = model_with(-1.0, 0.0).assess(&record());
        assert_abs_diff_eq!(negative.score, -100.0, epsilon = 1e-9);
        assert_eq!(negative.band, RiskBand::Low);
    }

    #[test]
    fn wrong_coefficient_count_is_rejected() {
        let result = FittedModel::new(Coefficients::new(Array1::zeros(3)));
        assert!(matches!(
            result,
            Err(EstimationError::CoefficientCount { expected: 14, found: 3 })
        ));
    }

    #[test]
    fn named_coefficients_follow_design_order() {
        let names: Vec<_> = model_with(0.0, 1.0)
            .named_coefficients()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names.len(), NUM_FEATURES + 1);
        assert_eq!(names[0], "bias");
        assert_eq!(names[1], "age");
        assert_eq!(names[13], "thal");
    }

    #[test]
    fn display_includes_name_score_and_recommendation() {
        let assessment = RiskAssessment {
            name: Some("Ada".to_string()),
            ..RiskAssessment::from_score(12.346)
        };
        let text = assessment.to_string();
        assert!(text.starts_with("Ada, the predicted risk score of heart disease is: 12.35%."));
        assert!(text.ends_with(RiskBand::Low.recommendation()));
    }
}
