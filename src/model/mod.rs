use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod kernel_ridge;
pub mod linear;
pub mod mean;

pub use kernel_ridge::{Kernel, KernelRidge};
pub use linear::LinearRegression;
pub use mean::MeanRegressor;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature matrix has {rows} rows but target has {targets} values")]
    ShapeMismatch { rows: usize, targets: usize },
    #[error("model was fitted on {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,
    #[error("kernel matrix is not positive definite (alpha = {alpha})")]
    NotPositiveDefinite { alpha: f64 },
    #[error("linear solver failed: {0}")]
    Solver(String),
}

/// An unfitted model.
pub trait Regressor {
    /// Short model name used in logs and reports.
    fn name(&self) -> &str;

    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Box<dyn FittedRegressor>, ModelError>;
}

/// A fitted model, ready to predict.
pub trait FittedRegressor {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError>;
}

pub(crate) fn check_fit_shapes(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            rows: x.nrows(),
            targets: y.len(),
        });
    }
    if y.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    Ok(())
}

pub(crate) fn check_features(expected: usize, x: ArrayView2<f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::FeatureMismatch {
            expected,
            got: x.ncols(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Model selection from configuration
// ---------------------------------------------------------------------------

/// Serializable model choice, as written in a run file:
///
/// ```json
/// { "kind": "kernel_ridge", "alpha": 0.01, "kernel": { "type": "rbf", "gamma": 0.5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Mean,
    Linear {
        #[serde(default = "default_fit_intercept")]
        fit_intercept: bool,
    },
    KernelRidge {
        #[serde(default = "default_alpha")]
        alpha: f64,
        #[serde(default)]
        kernel: Kernel,
    },
}

fn default_fit_intercept() -> bool {
    true
}

fn default_alpha() -> f64 {
    1.0
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::KernelRidge {
            alpha: default_alpha(),
            kernel: Kernel::default(),
        }
    }
}

impl ModelSpec {
    pub fn build(&self) -> Box<dyn Regressor> {
        match self {
            ModelSpec::Mean => Box::new(MeanRegressor),
            ModelSpec::Linear { fit_intercept } => Box::new(LinearRegression {
                fit_intercept: *fit_intercept,
            }),
            ModelSpec::KernelRidge { alpha, kernel } => Box::new(KernelRidge {
                alpha: *alpha,
                kernel: *kernel,
            }),
        }
    }
}
