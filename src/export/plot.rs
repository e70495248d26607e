use std::path::PathBuf;

use plotters::prelude::*;

use super::{ExportContext, Exporter};
use crate::error::{AnalysisError, Result};
use crate::stats::{RMSE, RSQUARED};

/// Scatter of measured (x) against predicted (y) values with a 1:1
/// guideline, rendered to SVG. Skipped without testing ground truth.
#[derive(Debug, Clone)]
pub struct PredictedVsMeasuredPlot {
    pub file_name: String,
    pub size: (u32, u32),
}

impl Default for PredictedVsMeasuredPlot {
    fn default() -> Self {
        Self {
            file_name: "predicted_vs_measured.svg".to_string(),
            size: (800, 600),
        }
    }
}

fn plot_err<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::Plot(e.to_string())
}

/// Shared axis range covering both series, padded by 5%.
fn axis_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad, hi + pad)
}

/// Annotation lines printed in the plot corner.
pub fn plot_notes(ctx: &ExportContext<'_>) -> Vec<String> {
    let mut notes = Vec::new();
    if let Some(rmse) = ctx.statistics.get(RMSE) {
        notes.push(format!("RMSE: {rmse:.3}"));
    }
    if let Some(r2) = ctx.statistics.get(RSQUARED) {
        notes.push(format!("R-squared: {r2:.3}"));
    }
    notes
}

impl Exporter for PredictedVsMeasuredPlot {
    fn name(&self) -> &str {
        "predicted_vs_measured_plot"
    }

    fn export(&self, ctx: &ExportContext<'_>) -> Result<Option<PathBuf>> {
        let Some(measured) = ctx.testing_target else {
            return Ok(None);
        };
        let predicted = ctx.predictions;
        let (lo, hi) = axis_bounds(measured.iter().chain(predicted.iter()).copied());

        let path = ctx.results_dir.join(&self.file_name);
        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(50)
                .build_cartesian_2d(lo..hi, lo..hi)
                .map_err(plot_err)?;

            chart
                .configure_mesh()
                .x_desc("Measured")
                .y_desc("Predicted")
                .draw()
                .map_err(plot_err)?;

            chart
                .draw_series(LineSeries::new(vec![(lo, lo), (hi, hi)], BLACK.stroke_width(1)))
                .map_err(plot_err)?;

            chart
                .draw_series(
                    measured
                        .iter()
                        .zip(predicted.iter())
                        .map(|(&x, &y)| Circle::new((x, y), 3, BLUE.filled())),
                )
                .map_err(plot_err)?;

            for (i, note) in plot_notes(ctx).into_iter().enumerate() {
                root.draw(&Text::new(
                    note,
                    (90, 35 + 20 * i as i32),
                    ("sans-serif", 16).into_font(),
                ))
                .map_err(plot_err)?;
            }

            root.present().map_err(plot_err)?;
        }
        Ok(Some(path))
    }

    fn skip_reason(&self, _ctx: &ExportContext<'_>) -> String {
        "no testing target data".to_string()
    }
}
