//! # Model Estimation via the Normal Equation
//!
//! Fits the linear model `y ≈ X w` by ordinary least squares using the
//! closed-form solution
//!
//! ```text
//! w = (XᵀX)⁻¹ Xᵀ y
//! ```
//!
//! where `X` is the design matrix: a leading column of ones for the bias,
//! followed by one column per feature.
//!
//! The inverse is an exact LU-based inverse. There is no pseudo-inverse and no
//! ridge fallback: when `XᵀX` is singular or numerically degenerate the fit
//! fails with [`EstimationError::SingularMatrix`] and the caller must supply
//! better data.

use crate::data::Dataset;
use crate::types::Coefficients;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use ndarray_linalg::{Inverse, ReciprocalConditionNum};
use thiserror::Error;

/// Below this reciprocal condition number (1-norm estimate from LAPACK),
/// `XᵀX` is treated as singular.
pub const MIN_RECIPROCAL_CONDITION: f64 = 1e-13;

#[derive(Error, Debug)]
pub enum EstimationError {
    #[error("No data available to train the model. Load a dataset with at least one complete record.")]
    NoData,

    #[error("Matrix inversion failed. The system may be singular (non-invertible): {reason}")]
    SingularMatrix { reason: String },

    #[error("Feature matrix has {rows} rows but the label vector has {labels} entries.")]
    DimensionMismatch { rows: usize, labels: usize },

    #[error("Model has {found} coefficients, but the feature schema requires {expected}.")]
    CoefficientCount { expected: usize, found: usize },
}

/// Result of a successful fit.
#[derive(Debug, Clone)]
pub struct FitSummary {
    pub coefficients: Coefficients,
    pub num_records: usize,
    /// Sum of squared residuals on the training records.
    pub residual_sum_of_squares: f64,
}

/// Prepends the bias column of ones to a feature matrix.
pub fn design_matrix(features: ArrayView2<f64>) -> Array2<f64> {
    let mut x = Array2::<f64>::ones((features.nrows(), features.ncols() + 1));
    x.slice_mut(s![.., 1..]).assign(&features);
    x
}

/// Solves the normal equation for an arbitrary feature width.
pub fn fit_normal_equation(
    features: ArrayView2<f64>,
    labels: ArrayView1<f64>,
) -> Result<Coefficients, EstimationError> {
    if features.nrows() == 0 || labels.is_empty() {
        return Err(EstimationError::NoData);
    }
    if features.nrows() != labels.len() {
        return Err(EstimationError::DimensionMismatch {
            rows: features.nrows(),
            labels: labels.len(),
        });
    }

    let x = design_matrix(features);
    let xtx = x.t().dot(&x);
    log::debug!(
        "Design matrix is {}x{}; solving {}x{} normal equations.",
        x.nrows(),
        x.ncols(),
        xtx.nrows(),
        xtx.ncols()
    );

    let xtx_inv = internal::exact_inverse(&xtx)?;
    let weights: Array1<f64> = xtx_inv.dot(&x.t()).dot(&labels);

    if weights.iter().any(|w| !w.is_finite()) {
        return Err(EstimationError::SingularMatrix {
            reason: "the solution contains non-finite coefficients".to_string(),
        });
    }

    Ok(Coefficients::new(weights))
}

/// Fits the model on a loaded dataset and reports the training residual.
pub fn fit_dataset(dataset: &Dataset) -> Result<FitSummary, EstimationError> {
    if dataset.is_empty() {
        return Err(EstimationError::NoData);
    }
    log::info!("Fitting linear model on {} records.", dataset.len());

    let coefficients = fit_normal_equation(dataset.features(), dataset.labels())?;
    let fitted = design_matrix(dataset.features()).dot(&coefficients.as_view());
    let residual_sum_of_squares = (&dataset.labels() - &fitted).mapv(|r| r * r).sum();

    log::info!("Model fitted. Residual sum of squares: {residual_sum_of_squares:.6}");
    Ok(FitSummary {
        coefficients,
        num_records: dataset.len(),
        residual_sum_of_squares,
    })
}

mod internal {
    use super::*;

    /// Exact inverse of a square matrix, refusing singular or numerically
    /// degenerate input.
    pub(super) fn exact_inverse(matrix: &Array2<f64>) -> Result<Array2<f64>, EstimationError> {
        let rcond = matrix
            .rcond()
            .map_err(|e| EstimationError::SingularMatrix {
                reason: e.to_string(),
            })?;
        log::debug!("Reciprocal condition number of XᵀX: {rcond:.3e}");
        if !rcond.is_finite() || rcond < MIN_RECIPROCAL_CONDITION {
            return Err(EstimationError::SingularMatrix {
                reason: format!(
                    "reciprocal condition number {rcond:.3e} is below {MIN_RECIPROCAL_CONDITION:.0e}"
                ),
            });
        }

        let inverse = matrix.inv().map_err(|e| EstimationError::SingularMatrix {
            reason: e.to_string(),
        })?;
        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::SingularMatrix {
                reason: "the inverse contains non-finite entries".to_string(),
            });
        }
        Ok(inverse)
    }
}
