use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::{AnalysisError, Result};
use crate::model::ModelSpec;

/// Caller-facing analysis settings. Every field is optional here so that
/// missing values are reported by [`AnalysisConfig::validate`] by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub training_csv: Option<PathBuf>,
    pub testing_csv: Option<PathBuf>,
    pub train_index: Option<Vec<usize>>,
    pub test_index: Option<Vec<usize>>,
    #[serde(deserialize_with = "feature_list")]
    pub input_features: Option<Vec<String>>,
    pub target_feature: Option<String>,
    #[serde(deserialize_with = "feature_list")]
    pub labeling_features: Option<Vec<String>>,
    pub savepath: Option<PathBuf>,
    pub analysis_name: Option<String>,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn training_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.training_csv = Some(path.into());
        self
    }

    pub fn testing_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.testing_csv = Some(path.into());
        self
    }

    pub fn train_index(mut self, index: Vec<usize>) -> Self {
        self.train_index = Some(index);
        self
    }

    pub fn test_index(mut self, index: Vec<usize>) -> Self {
        self.test_index = Some(index);
        self
    }

    pub fn input_features<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.input_features = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn target_feature(mut self, name: impl Into<String>) -> Self {
        self.target_feature = Some(name.into());
        self
    }

    pub fn labeling_features<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.labeling_features = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn savepath(mut self, path: impl Into<PathBuf>) -> Self {
        self.savepath = Some(path.into());
        self
    }

    pub fn analysis_name(mut self, name: impl Into<String>) -> Self {
        self.analysis_name = Some(name.into());
        self
    }

    /// Check required fields and fill defaults.
    ///
    /// Checked in order: training source, testing source, input features,
    /// target feature. Only existence checks touch the filesystem.
    pub fn validate(self, now: OffsetDateTime) -> Result<ResolvedConfig> {
        let training_csv = existing_file(self.training_csv, "training_csv")?;
        let testing_csv = existing_file(self.testing_csv, "testing_csv")?;

        let input_features = self
            .input_features
            .filter(|f| !f.is_empty())
            .ok_or(AnalysisError::MissingField("input_features"))?;
        let target_feature = self
            .target_feature
            .filter(|t| !t.is_empty())
            .ok_or(AnalysisError::MissingField("target_feature"))?;
        // An independent copy: later changes to one list never show up in the other.
        let labeling_features = self
            .labeling_features
            .unwrap_or_else(|| input_features.clone());

        let savepath = match self.savepath {
            Some(path) => absolute(&path)?,
            None => std::env::current_dir().map_err(|e| AnalysisError::io(".", e))?,
        };
        let analysis_name = self
            .analysis_name
            .unwrap_or_else(|| default_analysis_name(now));

        Ok(ResolvedConfig {
            training_csv,
            testing_csv,
            train_index: self.train_index,
            test_index: self.test_index,
            input_features,
            target_feature,
            labeling_features,
            savepath,
            analysis_name,
        })
    }
}

/// A validated configuration with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub training_csv: PathBuf,
    pub testing_csv: PathBuf,
    pub train_index: Option<Vec<usize>>,
    pub test_index: Option<Vec<usize>>,
    pub input_features: Vec<String>,
    pub target_feature: String,
    pub labeling_features: Vec<String>,
    pub savepath: PathBuf,
    pub analysis_name: String,
}

impl ResolvedConfig {
    /// `<savepath>/<analysis_name>`
    pub fn results_dir(&self) -> PathBuf {
        self.savepath.join(&self.analysis_name)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| AnalysisError::io(path, e))
}

fn existing_file(path: Option<PathBuf>, field: &'static str) -> Result<PathBuf> {
    let path = absolute(&path.ok_or(AnalysisError::MissingField(field))?)?;
    if !path.is_file() {
        return Err(AnalysisError::FileNotFound(path));
    }
    Ok(path)
}

/// `Results_<YYYYmmdd_HHMMSS>`
pub fn default_analysis_name(now: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now
        .format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("Results_{stamp}")
}

/// Local wall-clock time, falling back to UTC when the offset is unknown.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Split a comma-separated feature list, dropping blanks.
pub fn parse_feature_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureList {
    Joined(String),
    Names(Vec<String>),
}

/// Accepts either `"a,b,c"` or `["a", "b", "c"]`.
fn feature_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(
        Option::<FeatureList>::deserialize(deserializer)?.map(|list| match list {
            FeatureList::Joined(s) => parse_feature_list(&s),
            FeatureList::Names(names) => names,
        }),
    )
}

// ---------------------------------------------------------------------------
// Run file
// ---------------------------------------------------------------------------

/// A JSON run file: analysis settings plus the model to fit.
///
/// ```json
/// {
///   "training_csv": "data/train.csv",
///   "testing_csv": "data/test.csv",
///   "input_features": "frac_a,frac_b,temperature",
///   "target_feature": "barrier",
///   "labeling_features": ["material"],
///   "model": { "kind": "kernel_ridge", "alpha": 0.01 }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunFile {
    #[serde(flatten)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub model: Option<ModelSpec>,
}

impl RunFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}
