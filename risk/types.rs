use ndarray::{Array1, ArrayView1};
use std::ops::Deref;

/// Weights of a fitted linear model, one per design-matrix column, bias first.
///
/// Read-only. A fitted vector is replaced wholesale on refit.
#[repr(transparent)]
#[derive(Clone, Debug, PartialEq)]
pub struct Coefficients(Array1<f64>);

impl Coefficients {
    pub fn new(values: Array1<f64>) -> Self {
        Self(values)
    }

    pub fn as_view(&self) -> ArrayView1<'_, f64> {
        self.0.view()
    }

    /// Intercept weight. Zero for an empty vector.
    pub fn bias(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }
}

impl Deref for Coefficients {
    type Target = Array1<f64>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Array1<f64>> for Coefficients {
    fn from(values: Array1<f64>) -> Self {
        Self(values)
    }
}
