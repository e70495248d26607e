use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use time::OffsetDateTime;

use crate::config::{AnalysisConfig, ResolvedConfig, local_now};
use crate::data::filter::{ExplicitOrAll, RowSelector, take_rows, take_values};
use crate::data::loader::{DatasetLoader, FileLoader};
use crate::data::model::{ColumnError, Dataset};
use crate::error::{AnalysisError, Result};
use crate::export::{ExportContext, Exporter, default_exporters};
use crate::model::Regressor;
use crate::stats::{RegressionStatistics, Statistics, StatisticsSet};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Replaceable pieces of the run.
pub struct Stages {
    pub loader: Box<dyn DatasetLoader>,
    pub train_rows: Box<dyn RowSelector>,
    pub test_rows: Box<dyn RowSelector>,
    pub statistics: Box<dyn StatisticsSet>,
    /// Run in order after scoring.
    pub exporters: Vec<Box<dyn Exporter>>,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            loader: Box::new(FileLoader),
            train_rows: Box::new(ExplicitOrAll),
            test_rows: Box::new(ExplicitOrAll),
            statistics: Box::new(RegressionStatistics),
            exporters: default_exporters(),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A step that did not run because its input was unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStep {
    pub step: String,
    pub reason: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub analysis_name: String,
    pub results_dir: PathBuf,
    pub model_name: String,
    pub train_index: Vec<usize>,
    pub test_index: Vec<usize>,
    pub predictions: Array1<f64>,
    /// Filtered testing ground truth, if the testing data had the target.
    pub testing_target: Option<Array1<f64>>,
    pub statistics: Statistics,
    /// Files written, in exporter order.
    pub artifacts: Vec<PathBuf>,
    pub skipped: Vec<SkippedStep>,
}

impl AnalysisReport {
    pub fn was_skipped(&self, step: &str) -> bool {
        self.skipped.iter().any(|s| s.step == step)
    }
}

// ---------------------------------------------------------------------------
// Run data
// ---------------------------------------------------------------------------

/// Column-selected data before row selection.
struct Unfiltered {
    train_x: Array2<f64>,
    train_y: Array1<f64>,
    test_x: Array2<f64>,
    test_y: Option<Array1<f64>>,
}

/// Row-selected data used for fit and predict.
struct Filtered {
    train_x: Array2<f64>,
    train_y: Array1<f64>,
    test_x: Array2<f64>,
    test_y: Option<Array1<f64>>,
}

const NO_TARGET: &str = "no testing target data";

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// A validated, ready-to-run analysis. Consumed by [`Analysis::run`].
pub struct Analysis {
    config: ResolvedConfig,
    model: Option<Box<dyn Regressor>>,
    stages: Stages,
    started_at: OffsetDateTime,
}

impl fmt::Debug for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analysis")
            .field("config", &self.config)
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl Analysis {
    /// Validate `config` and create the results directory.
    pub fn new(config: AnalysisConfig, model: Option<Box<dyn Regressor>>) -> Result<Self> {
        Self::with_stages(config, model, Stages::default())
    }

    pub fn with_stages(
        config: AnalysisConfig,
        model: Option<Box<dyn Regressor>>,
        stages: Stages,
    ) -> Result<Self> {
        let started_at = local_now();
        let config = config.validate(started_at)?;

        let results_dir = config.results_dir();
        if !results_dir.is_dir() {
            std::fs::create_dir_all(&results_dir)
                .map_err(|e| AnalysisError::io(&results_dir, e))?;
            log::debug!("Created results directory {}", results_dir.display());
        }

        Ok(Self {
            config,
            model,
            stages,
            started_at,
        })
    }

    /// Validate and run in one call.
    pub fn execute(
        config: AnalysisConfig,
        model: Option<Box<dyn Regressor>>,
    ) -> Result<AnalysisReport> {
        Self::new(config, model)?.run()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn results_dir(&self) -> PathBuf {
        self.config.results_dir()
    }

    /// Run every step once, in order. Artifacts written before a failing
    /// step stay on disk.
    pub fn run(self) -> Result<AnalysisReport> {
        let results_dir = self.results_dir();
        log::info!(
            "Running analysis '{}' into {}",
            self.config.analysis_name,
            results_dir.display()
        );
        let mut skipped = Vec::new();

        let (mut training, mut testing) = self.load_datasets()?;
        let unfiltered = self.unfiltered_data(&mut training, &mut testing)?;
        if unfiltered.test_y.is_none() {
            let target = &self.config.target_feature;
            let reason = if testing.has_column(target) {
                format!("'{target}' column in testing data is blank")
            } else {
                format!("testing data has no '{target}' column")
            };
            skip(&mut skipped, "testing_target", reason);
        }

        let train_index = self
            .stages
            .train_rows
            .select(&training, self.config.train_index.as_deref())?;
        let test_index = self
            .stages
            .test_rows
            .select(&testing, self.config.test_index.as_deref())?;
        let data = filter_rows(unfiltered, &train_index, &test_index)?;

        let model = self
            .model
            .as_deref()
            .ok_or(AnalysisError::MissingField("model"))?;
        log::info!(
            "Fitting {} on {} rows x {} features",
            model.name(),
            data.train_x.nrows(),
            data.train_x.ncols()
        );
        let fitted = model.fit(data.train_x.view(), data.train_y.view())?;
        let predictions = fitted.predict(data.test_x.view())?;

        let statistics = match &data.test_y {
            Some(truth) => self
                .stages
                .statistics
                .compute(truth.view(), predictions.view())?,
            None => {
                skip(&mut skipped, "statistics", NO_TARGET.to_string());
                Statistics::new()
            }
        };
        for (name, value) in statistics.iter() {
            log::info!("{name}: {value:.4}");
        }

        let ctx = ExportContext {
            results_dir: &results_dir,
            started_at: self.started_at,
            testing_dataset: &testing,
            test_index: &test_index,
            labeling_features: &self.config.labeling_features,
            input_features: &self.config.input_features,
            target_feature: &self.config.target_feature,
            testing_target: data.test_y.as_ref(),
            predictions: &predictions,
            statistics: &statistics,
        };
        let mut artifacts = Vec::new();
        for exporter in &self.stages.exporters {
            match exporter.export(&ctx)? {
                Some(path) => {
                    log::info!("{} written to {}", exporter.name(), path.display());
                    artifacts.push(path);
                }
                None => skip(&mut skipped, exporter.name(), exporter.skip_reason(&ctx)),
            }
        }

        Ok(AnalysisReport {
            analysis_name: self.config.analysis_name.clone(),
            results_dir,
            model_name: model.name().to_string(),
            train_index,
            test_index,
            predictions,
            testing_target: data.test_y,
            statistics,
            artifacts,
            skipped,
        })
    }

    fn load_datasets(&self) -> Result<(Dataset, Dataset)> {
        let training = self.load(&self.config.training_csv)?;
        let testing = self.load(&self.config.testing_csv)?;
        Ok((training, testing))
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        Ok(self.stages.loader.load(path)?)
    }

    fn unfiltered_data(&self, training: &mut Dataset, testing: &mut Dataset) -> Result<Unfiltered> {
        let target = &self.config.target_feature;
        let inputs = &self.config.input_features;

        if !training.set_y_feature(target) {
            return Err(ColumnError::Unknown(target.clone()).into());
        }
        training.set_x_features(inputs)?;
        let train_x = training.x_data()?;
        let train_y = training.y_data()?;

        // A partly filled target column still fails in y_data.
        let test_y = if testing.set_y_feature(target) && !testing.is_blank_column(target) {
            Some(testing.y_data()?)
        } else {
            None
        };
        testing.set_x_features(inputs)?;
        let test_x = testing.x_data()?;

        Ok(Unfiltered {
            train_x,
            train_y,
            test_x,
            test_y,
        })
    }
}

fn filter_rows(
    unfiltered: Unfiltered,
    train_index: &[usize],
    test_index: &[usize],
) -> Result<Filtered> {
    Ok(Filtered {
        train_x: take_rows(&unfiltered.train_x, train_index)?,
        train_y: take_values(&unfiltered.train_y, train_index)?,
        test_x: take_rows(&unfiltered.test_x, test_index)?,
        test_y: unfiltered
            .test_y
            .as_ref()
            .map(|y| take_values(y, test_index))
            .transpose()?,
    })
}

fn skip(skipped: &mut Vec<SkippedStep>, step: &str, reason: String) {
    log::warn!("Skipping {step}: {reason}");
    skipped.push(SkippedStep {
        step: step.to_string(),
        reason,
    });
}
