use std::fmt::Write as _;
use std::path::PathBuf;

use time::OffsetDateTime;
use time::macros::format_description;

use super::{ExportContext, Exporter};
use crate::error::{AnalysisError, Result};
use crate::stats::Statistics;

/// Writes `statistics.txt`.
#[derive(Debug, Clone)]
pub struct StatisticsFile {
    pub file_name: String,
}

impl Default for StatisticsFile {
    fn default() -> Self {
        Self {
            file_name: "statistics.txt".to_string(),
        }
    }
}

impl Exporter for StatisticsFile {
    fn name(&self) -> &str {
        "statistics"
    }

    fn export(&self, ctx: &ExportContext<'_>) -> Result<Option<PathBuf>> {
        let path = ctx.results_dir.join(&self.file_name);
        let text = render_statistics(ctx.statistics, ctx.started_at);
        std::fs::write(&path, text).map_err(|e| AnalysisError::io(&path, e))?;
        Ok(Some(path))
    }
}

/// `Statistics`, a timestamp line, then `name:value` entries (4 decimals)
/// written back to back with no separator.
pub fn render_statistics(stats: &Statistics, at: OffsetDateTime) -> String {
    let mut out = String::from("Statistics\n");
    out.push_str(&asctime(at));
    out.push('\n');
    for (name, value) in stats.iter() {
        let _ = write!(out, "{name}:{value:.4}");
    }
    out
}

/// `Mon Oct 19 08:30:05 2026`
fn asctime(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]"
    );
    at.format(&format).unwrap_or_else(|_| at.to_string())
}
