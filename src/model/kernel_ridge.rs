use linfa_linalg::LinalgError;
use linfa_linalg::cholesky::SolveCInplace;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{FittedRegressor, ModelError, Regressor, check_features, check_fit_shapes};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Kernel {
    /// `k(a, b) = a · b`
    #[default]
    Linear,
    /// `k(a, b) = exp(-gamma * |a - b|^2)`
    Rbf { gamma: f64 },
}

impl Kernel {
    /// Gram matrix between the rows of `a` and the rows of `b`.
    fn matrix(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        match *self {
            Kernel::Linear => a.dot(&b.t()),
            Kernel::Rbf { gamma } => Array2::from_shape_fn((a.nrows(), b.nrows()), |(i, j)| {
                let diff = &a.row(i) - &b.row(j);
                (-gamma * diff.dot(&diff)).exp()
            }),
        }
    }
}

/// Kernel ridge regression, solved in closed form.
///
/// Fitting finds dual coefficients `c = (K + alpha * I)^-1 y` over the
/// training Gram matrix `K`; prediction is `K(x, x_train) · c`. No intercept
/// is fitted.
#[derive(Debug, Clone, Copy)]
pub struct KernelRidge {
    pub alpha: f64,
    pub kernel: Kernel,
}

impl Default for KernelRidge {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            kernel: Kernel::Linear,
        }
    }
}

struct FittedKernelRidge {
    kernel: Kernel,
    support: Array2<f64>,
    dual_coef: Array1<f64>,
}

impl Regressor for KernelRidge {
    fn name(&self) -> &str {
        "kernel_ridge"
    }

    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        check_fit_shapes(x, y)?;
        let mut gram = self.kernel.matrix(x, x);
        gram.diag_mut().mapv_inplace(|d| d + self.alpha);

        let dual_coef = gram
            .solvec_into(y.insert_axis(Axis(1)).to_owned())
            .map_err(|e| match e {
                LinalgError::NotPositiveDefinite => {
                    ModelError::NotPositiveDefinite { alpha: self.alpha }
                }
                other => ModelError::Solver(other.to_string()),
            })?
            .remove_axis(Axis(1));

        Ok(Box::new(FittedKernelRidge {
            kernel: self.kernel,
            support: x.to_owned(),
            dual_coef,
        }))
    }
}

impl FittedRegressor for FittedKernelRidge {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        check_features(self.support.ncols(), x)?;
        Ok(self.kernel.matrix(x, self.support.view()).dot(&self.dual_coef))
    }
}
