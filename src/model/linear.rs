use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearRegression as OrdinaryLeastSquares};
use ndarray::{Array1, ArrayView1, ArrayView2};

use super::{FittedRegressor, ModelError, Regressor, check_features, check_fit_shapes};

/// Ordinary least squares, solved by `linfa-linear`.
#[derive(Debug, Clone, Copy)]
pub struct LinearRegression {
    pub fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self {
            fit_intercept: true,
        }
    }
}

struct FittedLinear {
    inner: FittedLinearRegression<f64>,
    n_features: usize,
}

impl Regressor for LinearRegression {
    fn name(&self) -> &str {
        "linear"
    }

    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        check_fit_shapes(x, y)?;
        let dataset = Dataset::new(x.to_owned(), y.to_owned());
        let inner = OrdinaryLeastSquares::new()
            .with_intercept(self.fit_intercept)
            .fit(&dataset)
            .map_err(|e| ModelError::Solver(e.to_string()))?;
        log::debug!(
            "OLS coefficients {:?}, intercept {}",
            inner.params(),
            inner.intercept()
        );
        Ok(Box::new(FittedLinear {
            inner,
            n_features: x.ncols(),
        }))
    }
}

impl FittedRegressor for FittedLinear {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.n_features, x)?;
        let prediction: Array1<f64> = self.inner.predict(&x);
        Ok(prediction)
    }
}
