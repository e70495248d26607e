use std::path::PathBuf;

use thiserror::Error;

use crate::data::filter::IndexOutOfBounds;
use crate::data::model::ColumnError;
use crate::model::ModelError;
use crate::stats::MetricError;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0} is not set")]
    MissingField(&'static str),
    #[error("No file found at {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("I/O error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Load(#[from] anyhow::Error),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    IndexOutOfBounds(#[from] IndexOutOfBounds),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Metric(#[from] MetricError),
    #[error("{what}: expected {expected} values, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("writing CSV output")]
    Csv(#[from] csv::Error),
    #[error("rendering plot: {0}")]
    Plot(String),
    #[error("invalid run file")]
    Config(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
