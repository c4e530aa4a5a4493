//! # Inference Input Parsing
//!
//! Turns loosely typed field values (form text, TOML scalars) into a validated
//! [`InputRecord`]. Each field is parsed according to its declared domain and
//! checked before any score is computed; the first failing field, in schema
//! order, is reported as a field-scoped [`PredictionError`].

use crate::model::PredictionError;
use crate::schema::{Feature, NUM_FEATURES};
use ndarray::Array1;
use serde::Deserialize;
use std::fmt;

/// A single untyped field value as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Integer(v) => write!(f, "{v}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Bool(v) => write!(f, "{v}"),
            RawValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// Unvalidated field values for one person. Keys accept both the descriptive
/// names and the source column names (`cp`, `trestbps`, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRecord {
    pub name: Option<String>,
    pub age: Option<RawValue>,
    #[serde(alias = "sex")]
    pub gender: Option<RawValue>,
    #[serde(alias = "cp")]
    pub chest_pain_type: Option<RawValue>,
    #[serde(alias = "trestbps")]
    pub resting_bp: Option<RawValue>,
    #[serde(alias = "chol")]
    pub cholesterol: Option<RawValue>,
    #[serde(alias = "fbs")]
    pub fasting_blood_sugar: Option<RawValue>,
    #[serde(alias = "restecg")]
    pub resting_ecg: Option<RawValue>,
    #[serde(alias = "thalach")]
    pub max_heart_rate: Option<RawValue>,
    #[serde(alias = "exang")]
    pub exercise_angina: Option<RawValue>,
    #[serde(alias = "oldpeak")]
    pub st_depression: Option<RawValue>,
    pub slope: Option<RawValue>,
    #[serde(alias = "ca")]
    pub vessel_count: Option<RawValue>,
    #[serde(alias = "thal")]
    pub thalassemia: Option<RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for one feature.
    pub fn with(mut self, feature: Feature, value: impl Into<RawValue>) -> Self {
        *self.slot_mut(feature) = Some(value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn get(&self, feature: Feature) -> Option<&RawValue> {
        match feature {
            Feature::Age => self.age.as_ref(),
            Feature::Sex => self.gender.as_ref(),
            Feature::ChestPainType => self.chest_pain_type.as_ref(),
            Feature::RestingBloodPressure => self.resting_bp.as_ref(),
            Feature::Cholesterol => self.cholesterol.as_ref(),
            Feature::FastingBloodSugar => self.fasting_blood_sugar.as_ref(),
            Feature::RestingEcg => self.resting_ecg.as_ref(),
            Feature::MaxHeartRate => self.max_heart_rate.as_ref(),
            Feature::ExerciseAngina => self.exercise_angina.as_ref(),
            Feature::StDepression => self.st_depression.as_ref(),
            Feature::Slope => self.slope.as_ref(),
            Feature::VesselCount => self.vessel_count.as_ref(),
            Feature::Thalassemia => self.thalassemia.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, feature: Feature) -> &mut Option<RawValue> {
        match feature {
            Feature::Age => &mut self.age,
            Feature::Sex => &mut self.gender,
            Feature::ChestPainType => &mut self.chest_pain_type,
            Feature::RestingBloodPressure => &mut self.resting_bp,
            Feature::Cholesterol => &mut self.cholesterol,
            Feature::FastingBloodSugar => &mut self.fasting_blood_sugar,
            Feature::RestingEcg => &mut self.resting_ecg,
            Feature::MaxHeartRate => &mut self.max_heart_rate,
            Feature::ExerciseAngina => &mut self.exercise_angina,
            Feature::StDepression => &mut self.st_depression,
            Feature::Slope => &mut self.slope,
            Feature::VesselCount => &mut self.vessel_count,
            Feature::Thalassemia => &mut self.thalassemia,
        }
    }

    /// Copies every value present in `other` over this record.
    pub fn merge_from(&mut self, other: RawRecord) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        for feature in Feature::ALL {
            if let Some(value) = other.get(feature) {
                *self.slot_mut(feature) = Some(value.clone());
            }
        }
    }
}

/// Binary sex encoding used by the training table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sex {
    Female,
    Male,
}

impl Sex {
    fn encode(self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }
}

/// Accepted values of one feature. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    Real { min: f64, max: f64 },
    Integer { min: i64, max: i64 },
    IntegerSet(&'static [i64]),
    Sex,
    Flag,
}

impl Domain {
    pub fn of(feature: Feature) -> Self {
        match feature {
            Feature::Age => Domain::Real { min: 0.0, max: 120.0 },
            Feature::Sex => Domain::Sex,
            Feature::ChestPainType => Domain::Integer { min: 0, max: 3 },
            Feature::RestingBloodPressure => Domain::Real { min: 50.0, max: 200.0 },
            Feature::Cholesterol => Domain::Real { min: 100.0, max: 600.0 },
            Feature::FastingBloodSugar => Domain::Flag,
            Feature::RestingEcg => Domain::IntegerSet(&[0, 1]),
            Feature::MaxHeartRate => Domain::Real { min: 50.0, max: 220.0 },
            Feature::ExerciseAngina => Domain::Flag,
            Feature::StDepression => Domain::Real { min: 0.0, max: 4.0 },
            Feature::Slope => Domain::Integer { min: 0, max: 3 },
            Feature::VesselCount => Domain::IntegerSet(&[0, 1, 2]),
            Feature::Thalassemia => Domain::Integer { min: 1, max: 3 },
        }
    }

    /// Parses and range-checks one raw value, returning its numeric encoding.
    pub fn parse(self, feature: Feature, raw: &RawValue) -> Result<f64, PredictionError> {
        let field = feature.field_name();
        let parse_error = || PredictionError::ParseError {
            field,
            value: raw.to_string(),
        };
        let invalid = |reason: String| PredictionError::InvalidField { field, reason };

        match self {
            Domain::Real { min, max } => {
                let value = match raw {
                    RawValue::Integer(v) => *v as f64,
                    RawValue::Float(v) => *v,
                    RawValue::Text(text) => text.trim().parse::<f64>().map_err(|_| parse_error())?,
                    RawValue::Bool(_) => return Err(parse_error()),
                };
                if !value.is_finite() {
                    return Err(invalid("must be a finite number".to_string()));
                }
                if value < min || value > max {
                    return Err(invalid(format!("must be between {min} and {max}")));
                }
                Ok(value)
            }
            Domain::Integer { min, max } => {
                let value = parse_integer(raw).ok_or_else(parse_error)?;
                if value < min || value > max {
                    return Err(invalid(format!("must be an integer between {min} and {max}")));
                }
                Ok(value as f64)
            }
            Domain::IntegerSet(allowed) => {
                let value = parse_integer(raw).ok_or_else(parse_error)?;
                if !allowed.contains(&value) {
                    let listed: Vec<String> = allowed.iter().map(i64::to_string).collect();
                    return Err(invalid(format!("must be one of {}", listed.join(", "))));
                }
                Ok(value as f64)
            }
            Domain::Sex => match raw {
                RawValue::Text(text) => match text.trim().to_lowercase().as_str() {
                    "male" => Ok(Sex::Male.encode()),
                    "female" => Ok(Sex::Female.encode()),
                    _ => Err(invalid("must be 'male' or 'female'".to_string())),
                },
                _ => Err(invalid("must be 'male' or 'female'".to_string())),
            },
            Domain::Flag => {
                let flag = match raw {
                    RawValue::Bool(b) => Some(*b),
                    RawValue::Text(text) => match text.trim().to_lowercase().as_str() {
                        "true" => Some(true),
                        "false" => Some(false),
                        _ => None,
                    },
                    _ => None,
                };
                flag.map(|b| if b { 1.0 } else { 0.0 })
                    .ok_or_else(|| invalid("must be 'true' or 'false'".to_string()))
            }
        }
    }
}

fn parse_integer(raw: &RawValue) -> Option<i64> {
    match raw {
        RawValue::Integer(v) => Some(*v),
        RawValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
        RawValue::Text(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// A fully validated feature vector for one person, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    name: Option<String>,
    values: [f64; NUM_FEATURES],
}

impl InputRecord {
    /// Validates every field of `raw`. Fails on the first field that is
    /// missing, unparseable, or outside its domain.
    pub fn parse(raw: &RawRecord) -> Result<Self, PredictionError> {
        let name = match raw.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(PredictionError::InvalidField {
                    field: "name",
                    reason: "must not be empty".to_string(),
                });
            }
            other => other.map(str::to_string),
        };

        let mut values = [0.0; NUM_FEATURES];
        for feature in Feature::ALL {
            let value = raw
                .get(feature)
                .ok_or_else(|| PredictionError::InvalidField {
                    field: feature.field_name(),
                    reason: "is required".to_string(),
                })?;
            values[feature.index()] = Domain::of(feature).parse(feature, value)?;
        }
        Ok(Self { name, values })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Numeric encoding of one feature.
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// `[1.0, features...]`, aligned with the design-matrix columns.
    pub fn design_row(&self) -> Array1<f64> {
        std::iter::once(1.0).chain(self.values.iter().copied()).collect()
    }
}
