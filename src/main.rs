use std::path::PathBuf;

use anyhow::{Context, Result};
use mastml_analysis::{Analysis, RunFile};

fn main() -> Result<()> {
    env_logger::init();

    let run_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: mastml-analysis <run.json>")?;

    let run = RunFile::from_path(&run_path)
        .with_context(|| format!("reading run file {}", run_path.display()))?;
    let model = run.model.as_ref().map(|spec| spec.build());

    let report = Analysis::execute(run.analysis, model).context("analysis failed")?;

    println!(
        "Analysis '{}' ({} model, {} test rows) written to {}",
        report.analysis_name,
        report.model_name,
        report.test_index.len(),
        report.results_dir.display()
    );
    for (name, value) in report.statistics.iter() {
        println!("  {name}: {value:.4}");
    }
    for step in &report.skipped {
        println!("  skipped {}: {}", step.step, step.reason);
    }
    Ok(())
}
