//! # Fit Context
//!
//! Owns the single active dataset and the single active model. Callers hold a
//! `FitContext` and drive it through three operations:
//!
//! 1. [`FitContext::load_dataset`] replaces the active dataset.
//! 2. [`FitContext::fit_model`] replaces the active model from the active dataset.
//! 3. [`FitContext::predict`] scores one record against the active model.
//!
//! Every replacement happens only after the new value is fully built, so a
//! failed load or fit leaves the previous dataset or model intact and usable.

use crate::data::{self, DataError, Dataset, LoaderOptions};
use crate::estimate::{self, EstimationError, FitSummary};
use crate::input::{InputRecord, RawRecord};
use crate::model::{FittedModel, PredictionError, RiskAssessment};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct FitContext {
    options: LoaderOptions,
    dataset: Option<Dataset>,
    model: Option<FittedModel>,
}

impl FitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader_options(options: LoaderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn model(&self) -> Option<&FittedModel> {
        self.model.as_ref()
    }

    /// Loads and validates a dataset, replacing the active one on success.
    pub fn load_dataset(&mut self, path: impl AsRef<Path>) -> Result<&Dataset, DataError> {
        let dataset = data::load_dataset(path, &self.options)?;
        Ok(self.set_dataset(dataset))
    }

    /// Installs an already validated dataset as the active one.
    pub fn set_dataset(&mut self, dataset: Dataset) -> &Dataset {
        self.dataset.insert(dataset)
    }

    /// Fits on the active dataset and replaces the active model on success.
    pub fn fit_model(&mut self) -> Result<FitSummary, EstimationError> {
        let dataset = self.dataset.as_ref().ok_or(EstimationError::NoData)?;
        let summary = estimate::fit_dataset(dataset)?;
        let model = FittedModel::new(summary.coefficients.clone())?;
        self.model = Some(model);
        Ok(summary)
    }

    /// Scores one record. The model must exist before any field is looked at.
    pub fn predict(&self, record: &RawRecord) -> Result<RiskAssessment, PredictionError> {
        let model = self.model.as_ref().ok_or(PredictionError::ModelNotFitted)?;
        let input = InputRecord::parse(record)?;
        Ok(model.assess(&input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Feature, NUM_FEATURES};
    use ndarray::{Array1, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn predict_without_model_fails_before_validation() {
        let ctx = FitContext::new();
        // Even an empty record reports the missing model, not a missing field.
        assert!(matches!(
            ctx.predict(&RawRecord::new()),
            Err(PredictionError::ModelNotFitted)
        ));
    }

    #[test]
    fn fit_without_dataset_is_no_data() {
        let mut ctx = FitContext::new();
        assert!(matches!(ctx.fit_model(), Err(EstimationError::NoData)));
        assert!(ctx.model().is_none());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut ctx = FitContext::new();
        let dataset = Dataset::new(Array2::zeros((2, NUM_FEATURES)), Array1::zeros(2)).unwrap();
        ctx.set_dataset(dataset);

        let dir = tempfile::tempdir().unwrap();
        assert!(ctx.load_dataset(dir.path().join("missing.csv")).is_err());
        assert_eq!(ctx.dataset().map(Dataset::len), Some(2));
    }

    #[test]
    fn failed_fit_keeps_previous_model() {
        let mut ctx = FitContext::new();
        let mut rng = StdRng::seed_from_u64(11);
        let features = Array2::from_shape_fn((30, NUM_FEATURES), |_| rng.gen_range(0.0..10.0));
        let labels = Array1::from_shape_fn(30, |i| (i % 3 == 0) as u8 as f64);
        ctx.set_dataset(Dataset::new(features, labels).unwrap());
        ctx.fit_model().unwrap();
        let fitted = ctx.model().cloned();

        ctx.set_dataset(Dataset::new(Array2::zeros((0, NUM_FEATURES)), Array1::zeros(0)).unwrap());
        assert!(matches!(ctx.fit_model(), Err(EstimationError::NoData)));
        assert_eq!(ctx.model().cloned(), fitted);

        let mut singular = Array2::<f64>::zeros((30, NUM_FEATURES));
        singular.column_mut(Feature::Age.index()).fill(3.0);
        ctx.set_dataset(Dataset::new(singular, Array1::zeros(30)).unwrap());
        assert!(matches!(
            ctx.fit_model(),
            Err(EstimationError::SingularMatrix { .. })
        ));
        assert_eq!(ctx.model().cloned(), fitted);
    }
}
