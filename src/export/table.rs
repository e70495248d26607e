use std::path::PathBuf;

use super::{ExportContext, Exporter};
use crate::data::filter::check_bounds;
use crate::data::model::ColumnError;
use crate::error::{AnalysisError, Result};

/// Writes `output_data.csv`: the identifying, input and (when present)
/// target columns of every selected testing row, plus the prediction.
#[derive(Debug, Clone)]
pub struct OutputTable {
    pub file_name: String,
}

impl Default for OutputTable {
    fn default() -> Self {
        Self {
            file_name: "output_data.csv".to_string(),
        }
    }
}

/// Labeling features, input features and the optional target, in that
/// order, each name kept at its first occurrence.
pub fn output_columns(labeling: &[String], input: &[String], target: Option<&str>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(labeling.len() + input.len() + 1);
    let names = labeling
        .iter()
        .map(String::as_str)
        .chain(input.iter().map(String::as_str))
        .chain(target);
    for name in names {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    }
    columns
}

impl Exporter for OutputTable {
    fn name(&self) -> &str {
        "output_table"
    }

    fn export(&self, ctx: &ExportContext<'_>) -> Result<Option<PathBuf>> {
        if ctx.predictions.len() != ctx.test_index.len() {
            return Err(AnalysisError::ShapeMismatch {
                what: "predictions",
                expected: ctx.test_index.len(),
                got: ctx.predictions.len(),
            });
        }
        check_bounds(ctx.test_index, ctx.testing_dataset.len())?;

        let target = ctx.has_target().then_some(ctx.target_feature);
        let columns = output_columns(ctx.labeling_features, ctx.input_features, target);
        let cells = columns
            .iter()
            .map(|name| {
                ctx.testing_dataset
                    .column(name)
                    .ok_or_else(|| ColumnError::Unknown(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let path = ctx.results_dir.join(&self.file_name);
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = columns.clone();
        header.push("Prediction".to_string());
        writer.write_record(&header)?;

        for (&row, prediction) in ctx.test_index.iter().zip(ctx.predictions) {
            let mut record: Vec<String> = cells.iter().map(|col| col[row].to_string()).collect();
            record.push(prediction.to_string());
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| AnalysisError::io(&path, e))?;

        log::debug!(
            "Wrote {} rows x {} columns to {}",
            ctx.test_index.len(),
            header.len(),
            path.display()
        );
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn columns_follow_labeling_input_target_order() {
        let cols = output_columns(&names(&["material"]), &names(&["f1", "f2"]), Some("target"));
        assert_eq!(cols, vec!["material", "f1", "f2", "target"]);
    }

    #[test]
    fn default_labeling_does_not_duplicate_inputs() {
        let input = names(&["f1", "f2"]);
        let cols = output_columns(&input.clone(), &input, Some("target"));
        assert_eq!(cols, vec!["f1", "f2", "target"]);
    }

    #[test]
    fn target_column_only_with_ground_truth() {
        let cols = output_columns(&names(&["id"]), &names(&["f1"]), None);
        assert_eq!(cols, vec!["id", "f1"]);
    }
}
