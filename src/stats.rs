use ndarray::ArrayView1;
use thiserror::Error;

pub const RMSE: &str = "rmse";
pub const MEAN_ERROR: &str = "mean_error";
pub const MEAN_ABSOLUTE_ERROR: &str = "mean_absolute_error";
pub const RSQUARED: &str = "rsquared";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    #[error("truth has {truth} values but prediction has {prediction}")]
    LengthMismatch { truth: usize, prediction: usize },
    #[error("cannot score an empty prediction set")]
    Empty,
}

fn check(truth: ArrayView1<f64>, prediction: ArrayView1<f64>) -> Result<(), MetricError> {
    if truth.len() != prediction.len() {
        return Err(MetricError::LengthMismatch {
            truth: truth.len(),
            prediction: prediction.len(),
        });
    }
    if truth.is_empty() {
        return Err(MetricError::Empty);
    }
    Ok(())
}

fn mean_of(values: impl Iterator<Item = f64>, n: usize) -> f64 {
    values.sum::<f64>() / n as f64
}

/// `sqrt(mean((prediction - truth)^2))`
pub fn rmse(truth: ArrayView1<f64>, prediction: ArrayView1<f64>) -> Result<f64, MetricError> {
    check(truth, prediction)?;
    let mse = mean_of(
        truth.iter().zip(prediction).map(|(&t, &p)| (p - t).powi(2)),
        truth.len(),
    );
    Ok(mse.sqrt())
}

/// `mean(prediction - truth)`
pub fn mean_error(truth: ArrayView1<f64>, prediction: ArrayView1<f64>) -> Result<f64, MetricError> {
    check(truth, prediction)?;
    Ok(mean_of(
        truth.iter().zip(prediction).map(|(&t, &p)| p - t),
        truth.len(),
    ))
}

/// `mean(|prediction - truth|)`
pub fn mean_absolute_error(
    truth: ArrayView1<f64>,
    prediction: ArrayView1<f64>,
) -> Result<f64, MetricError> {
    check(truth, prediction)?;
    Ok(mean_of(
        truth.iter().zip(prediction).map(|(&t, &p)| (p - t).abs()),
        truth.len(),
    ))
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant truth vector has `SS_tot = 0`; the score is then 1.0 for a
/// perfect prediction and 0.0 otherwise.
pub fn r_squared(truth: ArrayView1<f64>, prediction: ArrayView1<f64>) -> Result<f64, MetricError> {
    check(truth, prediction)?;
    let mean = mean_of(truth.iter().copied(), truth.len());
    let ss_res: f64 = truth
        .iter()
        .zip(prediction)
        .map(|(&t, &p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = truth.iter().map(|&t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

// ---------------------------------------------------------------------------
// Statistics record
// ---------------------------------------------------------------------------

/// Named statistic values, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    entries: Vec<(String, f64)>,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value; overwriting keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Statistics stage
// ---------------------------------------------------------------------------

/// Computes the statistics recorded for a scored prediction.
pub trait StatisticsSet {
    fn compute(
        &self,
        truth: ArrayView1<f64>,
        prediction: ArrayView1<f64>,
    ) -> Result<Statistics, MetricError>;
}

/// `rmse`, `mean_error`, `mean_absolute_error` and `rsquared`, in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegressionStatistics;

impl StatisticsSet for RegressionStatistics {
    fn compute(
        &self,
        truth: ArrayView1<f64>,
        prediction: ArrayView1<f64>,
    ) -> Result<Statistics, MetricError> {
        let mut stats = Statistics::new();
        stats.insert(RMSE, rmse(truth, prediction)?);
        stats.insert(MEAN_ERROR, mean_error(truth, prediction)?);
        stats.insert(MEAN_ABSOLUTE_ERROR, mean_absolute_error(truth, prediction)?);
        stats.insert(RSQUARED, r_squared(truth, prediction)?);
        Ok(stats)
    }
}
