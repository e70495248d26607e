use ndarray::{Array1, ArrayView1, ArrayView2};

use super::{FittedRegressor, ModelError, Regressor, check_features, check_fit_shapes};

/// Baseline model: always predicts the mean of the training target.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanRegressor;

#[derive(Debug, Clone)]
struct FittedMean {
    mean: f64,
    n_features: usize,
}

impl Regressor for MeanRegressor {
    fn name(&self) -> &str {
        "mean"
    }

    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        check_fit_shapes(x, y)?;
        let mean = y.sum() / y.len() as f64;
        Ok(Box::new(FittedMean {
            mean,
            n_features: x.ncols(),
        }))
    }
}

impl FittedRegressor for FittedMean {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.n_features, x)?;
        Ok(Array1::from_elem(x.nrows(), self.mean))
    }
}
