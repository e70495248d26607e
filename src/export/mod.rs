use std::path::{Path, PathBuf};

use ndarray::Array1;
use time::OffsetDateTime;

use crate::data::model::Dataset;
use crate::error::Result;
use crate::stats::Statistics;

pub mod plot;
pub mod statistics;
pub mod table;

pub use plot::PredictedVsMeasuredPlot;
pub use statistics::StatisticsFile;
pub use table::OutputTable;

/// Everything an exporter may read about a finished run.
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub results_dir: &'a Path,
    pub started_at: OffsetDateTime,
    pub testing_dataset: &'a Dataset,
    pub test_index: &'a [usize],
    pub labeling_features: &'a [String],
    pub input_features: &'a [String],
    pub target_feature: &'a str,
    /// Filtered testing ground truth, when the testing data has it.
    pub testing_target: Option<&'a Array1<f64>>,
    pub predictions: &'a Array1<f64>,
    pub statistics: &'a Statistics,
}

impl ExportContext<'_> {
    pub fn has_target(&self) -> bool {
        self.testing_target.is_some()
    }
}

pub trait Exporter {
    fn name(&self) -> &str;

    /// Write the artifact. `Ok(None)` means the exporter had nothing to
    /// write for this run.
    fn export(&self, ctx: &ExportContext<'_>) -> Result<Option<PathBuf>>;

    /// Reported for a run where `export` returned `Ok(None)`.
    fn skip_reason(&self, _ctx: &ExportContext<'_>) -> String {
        format!("{} had nothing to write", self.name())
    }
}

/// Statistics file, output table, then the predicted-vs-measured plot.
pub fn default_exporters() -> Vec<Box<dyn Exporter>> {
    vec![
        Box::new(StatisticsFile::default()),
        Box::new(OutputTable::default()),
        Box::new(PredictedVsMeasuredPlot::default()),
    ]
}
