use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use mastml_analysis::data::filter::{ExplicitOrAll, MetadataFilter};
use mastml_analysis::data::model::{CellValue, ColumnError};
use mastml_analysis::export::{ExportContext, Exporter, OutputTable};
use mastml_analysis::model::{
    FittedRegressor, LinearRegression, MeanRegressor, ModelError, ModelSpec, Regressor,
};
use mastml_analysis::stats::{MEAN_ABSOLUTE_ERROR, MEAN_ERROR, RMSE, RSQUARED};
use mastml_analysis::{Analysis, AnalysisConfig, AnalysisError, RunFile, Stages};
use ndarray::{Array1, ArrayView1, ArrayView2};
use tempfile::{TempDir, tempdir};

const TRAIN: &str = "\
f1,f2,target
1,2,1.0
2,1,2.0
3,0,3.0
4,1,6.0
";

const TEST: &str = "\
f1,f2,target
1,1,2.0
2,2,4.0
5,0,3.0
";

const TEST_UNLABELED: &str = "\
f1,f2
1,1
2,2
5,0
";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(train: &str, test: &str) -> Self {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("train.csv"), train).unwrap();
        std::fs::write(dir.path().join("test.csv"), test).unwrap();
        Workspace { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn config(&self) -> AnalysisConfig {
        AnalysisConfig::new()
            .training_csv(self.path().join("train.csv"))
            .testing_csv(self.path().join("test.csv"))
            .input_features(["f1", "f2"])
            .target_feature("target")
            .savepath(self.path())
            .analysis_name("run")
    }

    fn results(&self) -> PathBuf {
        self.path().join("run")
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.results().join(name)).unwrap()
    }
}

fn mean_model() -> Option<Box<dyn Regressor>> {
    Some(Box::new(MeanRegressor))
}

#[test]
fn constant_model_end_to_end() {
    let ws = Workspace::new(TRAIN, TEST);
    let report = Analysis::execute(ws.config(), mean_model()).unwrap();

    assert_eq!(report.train_index, vec![0, 1, 2, 3]);
    assert_eq!(report.test_index, vec![0, 1, 2]);
    assert_eq!(report.predictions.to_vec(), vec![3.0, 3.0, 3.0]);
    assert_eq!(report.model_name, "mean");

    let keys: Vec<_> = report.statistics.keys().collect();
    assert_eq!(keys, vec![RMSE, MEAN_ERROR, MEAN_ABSOLUTE_ERROR, RSQUARED]);
    // Residuals 1, -1, 0 against a constant prediction of 3.
    let rmse = report.statistics.get(RMSE).unwrap();
    assert!((rmse - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    assert_eq!(report.statistics.get(MEAN_ERROR), Some(0.0));
    assert_eq!(report.statistics.get(RSQUARED), Some(0.0));

    let stats = ws.read("statistics.txt");
    let lines: Vec<_> = stats.lines().collect();
    assert_eq!(lines[0], "Statistics");
    assert_eq!(
        lines[2],
        "rmse:0.8165mean_error:0.0000mean_absolute_error:0.6667rsquared:0.0000"
    );

    let csv = ws.read("output_data.csv");
    let rows: Vec<_> = csv.lines().collect();
    assert_eq!(rows[0], "f1,f2,target,Prediction");
    assert_eq!(&rows[1..], &["1,1,2,3", "2,2,4,3", "5,0,3,3"]);

    assert!(ws.results().join("predicted_vs_measured.svg").is_file());
    assert_eq!(report.artifacts.len(), 3);
    assert!(report.skipped.is_empty());
}

#[test]
fn explicit_indices_drive_fit_and_output_order() {
    let ws = Workspace::new(TRAIN, TEST);
    let config = ws.config().train_index(vec![0, 1]).test_index(vec![2, 0]);
    let report = Analysis::execute(config, mean_model()).unwrap();

    // Mean of the first two training targets.
    assert_eq!(report.predictions.to_vec(), vec![1.5, 1.5]);
    assert_eq!(report.predictions.len(), report.test_index.len());
    assert_eq!(report.testing_target.unwrap().to_vec(), vec![3.0, 2.0]);

    let csv = ws.read("output_data.csv");
    let rows: Vec<_> = csv.lines().skip(1).collect();
    assert_eq!(rows, vec!["5,0,3,1.5", "1,1,2,1.5"]);
}

#[test]
fn missing_ground_truth_skips_scoring_and_plot() {
    let ws = Workspace::new(TRAIN, TEST_UNLABELED);
    let report = Analysis::execute(ws.config(), mean_model()).unwrap();

    assert!(report.statistics.is_empty());
    assert!(report.testing_target.is_none());
    assert!(report.was_skipped("statistics"));
    assert!(report.was_skipped("predicted_vs_measured_plot"));
    assert!(report.was_skipped("testing_target"));

    let stats = ws.read("statistics.txt");
    assert_eq!(stats.lines().count(), 2);

    let csv = ws.read("output_data.csv");
    assert_eq!(csv.lines().next(), Some("f1,f2,Prediction"));
    assert!(!ws.results().join("predicted_vs_measured.svg").exists());
    assert_eq!(report.artifacts.len(), 2);
}

#[test]
fn blank_target_column_is_treated_as_unlabeled() {
    let ws = Workspace::new(TRAIN, "f1,f2,target\n1,1,\n2,2,\n");
    let report = Analysis::execute(ws.config(), mean_model()).unwrap();

    assert!(report.testing_target.is_none());
    assert!(report.statistics.is_empty());
    assert!(report.was_skipped("testing_target"));
    assert!(report.was_skipped("statistics"));
    assert!(report.was_skipped("predicted_vs_measured_plot"));
    let plot = report
        .skipped
        .iter()
        .find(|s| s.step == "predicted_vs_measured_plot")
        .unwrap();
    assert_eq!(plot.reason, "no testing target data");

    let csv = ws.read("output_data.csv");
    assert_eq!(csv.lines().next(), Some("f1,f2,Prediction"));
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn partly_filled_target_column_is_an_error() {
    let ws = Workspace::new(TRAIN, "f1,f2,target\n1,1,2.0\n2,2,\n");
    let err = Analysis::execute(ws.config(), mean_model()).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::Column(ColumnError::NonNumeric { row: 1, .. })
    ));
}

#[test]
fn labeling_columns_lead_the_output_table() {
    let train = "material,f1,f2,target\nA,1,2,1.0\nB,2,1,2.0\nC,3,0,3.0\n";
    let test = "material,f1,f2,target\nD,1,1,2.0\nE,2,2,4.0\n";
    let ws = Workspace::new(train, test);
    let config = ws.config().labeling_features(["material"]);
    Analysis::execute(config, mean_model()).unwrap();

    let csv = ws.read("output_data.csv");
    let header: Vec<_> = csv.lines().next().unwrap().split(',').collect();
    // labeling + inputs + target + Prediction
    assert_eq!(header.len(), 1 + 2 + 1 + 1);
    assert_eq!(header, vec!["material", "f1", "f2", "target", "Prediction"]);
    assert!(csv.lines().nth(1).unwrap().starts_with("D,1,1,2,"));
}

#[test]
fn construction_validates_before_any_run() {
    let ws = Workspace::new(TRAIN, TEST);

    let err = Analysis::new(
        AnalysisConfig {
            training_csv: Some(ws.path().join("missing.csv")),
            ..ws.config()
        },
        mean_model(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::FileNotFound(_)));
    assert!(!ws.results().exists());

    let err = Analysis::new(
        AnalysisConfig {
            target_feature: None,
            ..ws.config()
        },
        mean_model(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingField("target_feature")));

    let analysis = Analysis::new(ws.config(), mean_model()).unwrap();
    assert!(ws.results().is_dir());
    assert_eq!(analysis.config().labeling_features, vec!["f1", "f2"]);
}

#[test]
fn existing_results_directory_is_reused() {
    let ws = Workspace::new(TRAIN, TEST);
    std::fs::create_dir(ws.results()).unwrap();
    std::fs::write(ws.results().join("notes.txt"), "keep me").unwrap();

    Analysis::execute(ws.config(), mean_model()).unwrap();
    assert_eq!(ws.read("notes.txt"), "keep me");
}

#[test]
fn missing_model_fails_at_the_model_step() {
    let ws = Workspace::new(TRAIN, TEST);
    let err = Analysis::execute(ws.config(), None).unwrap_err();
    assert!(matches!(err, AnalysisError::MissingField("model")));
    assert_eq!(err.to_string(), "model is not set");
    // Construction already ran; nothing was exported.
    assert!(ws.results().is_dir());
    assert!(!ws.results().join("statistics.txt").exists());
}

#[test]
fn out_of_range_index_fails_fast() {
    let ws = Workspace::new(TRAIN, TEST);
    let err = Analysis::execute(ws.config().test_index(vec![0, 3]), mean_model()).unwrap_err();
    match err {
        AnalysisError::IndexOutOfBounds(e) => {
            assert_eq!(e.index, 3);
            assert_eq!(e.len, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_input_feature_is_reported() {
    let ws = Workspace::new(TRAIN, TEST);
    let config = ws.config().input_features(["f1", "density"]);
    let err = Analysis::execute(config, mean_model()).unwrap_err();
    assert_eq!(err.to_string(), "column 'density' not found in dataset");
}

struct FailingModel;

impl Regressor for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        Err(ModelError::ShapeMismatch {
            rows: x.nrows(),
            targets: y.len() + 1,
        })
    }
}

#[test]
fn model_errors_propagate_unchanged() {
    let ws = Workspace::new(TRAIN, TEST);
    let err = Analysis::execute(ws.config(), Some(Box::new(FailingModel))).unwrap_err();
    match err {
        AnalysisError::Model(ModelError::ShapeMismatch { rows, targets }) => {
            assert_eq!((rows, targets), (4, 5));
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct OffByOne;

struct FittedOffByOne;

impl Regressor for OffByOne {
    fn name(&self) -> &str {
        "off_by_one"
    }

    fn fit(
        &self,
        _x: ArrayView2<f64>,
        _y: ArrayView1<f64>,
    ) -> Result<Box<dyn FittedRegressor>, ModelError> {
        Ok(Box::new(FittedOffByOne))
    }
}

impl FittedRegressor for FittedOffByOne {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        Ok(Array1::zeros(x.nrows() + 1))
    }
}

#[test]
fn short_prediction_surfaces_as_shape_error_downstream() {
    let ws = Workspace::new(TRAIN, TEST_UNLABELED);
    let err = Analysis::execute(ws.config(), Some(Box::new(OffByOne))).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::ShapeMismatch {
            what: "predictions",
            expected: 3,
            got: 4
        }
    ));
    // Exporters before the table still ran.
    assert!(ws.results().join("statistics.txt").is_file());
}

#[test]
fn linear_model_fits_exact_relation() {
    // target = 2 * f1 - f2
    let train = "f1,f2,target\n0,0,0\n1,0,2\n0,1,-1\n2,1,3\n3,3,3\n";
    let test = "f1,f2,target\n4,1,7\n1,2,0\n";
    let ws = Workspace::new(train, test);
    let report =
        Analysis::execute(ws.config(), Some(Box::new(LinearRegression::default()))).unwrap();
    assert!(report.statistics.get(RMSE).unwrap() < 1e-8);
    assert!((report.statistics.get(RSQUARED).unwrap() - 1.0).abs() < 1e-8);
}

struct CountingExporter;

impl Exporter for CountingExporter {
    fn name(&self) -> &str {
        "row_count"
    }

    fn export(&self, ctx: &ExportContext<'_>) -> mastml_analysis::Result<Option<PathBuf>> {
        let path = ctx.results_dir.join("row_count.txt");
        std::fs::write(&path, ctx.test_index.len().to_string()).unwrap();
        Ok(Some(path))
    }
}

struct EmptyExporter;

impl Exporter for EmptyExporter {
    fn name(&self) -> &str {
        "noop"
    }

    fn export(&self, _ctx: &ExportContext<'_>) -> mastml_analysis::Result<Option<PathBuf>> {
        Ok(None)
    }
}

#[test]
fn exporters_explain_their_own_skips() {
    let ws = Workspace::new(TRAIN, TEST);
    let stages = Stages {
        exporters: vec![Box::new(EmptyExporter)],
        ..Stages::default()
    };
    let report = Analysis::with_stages(ws.config(), mean_model(), stages)
        .unwrap()
        .run()
        .unwrap();

    assert!(report.artifacts.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].step, "noop");
    assert_eq!(report.skipped[0].reason, "noop had nothing to write");
}

#[test]
fn stages_can_be_replaced() {
    let train = "group,f1,f2,target\nx,1,2,1.0\ny,2,1,5.0\nx,3,0,3.0\n";
    let test = "group,f1,f2,target\nx,1,1,2.0\ny,2,2,4.0\nx,5,0,3.0\n";
    let ws = Workspace::new(train, test);

    let only_x = MetadataFilter {
        filters: [(
            "group".to_string(),
            BTreeSet::from([CellValue::String("x".into())]),
        )]
        .into(),
    };
    let stages = Stages {
        train_rows: Box::new(only_x),
        test_rows: Box::new(ExplicitOrAll),
        exporters: vec![Box::new(OutputTable::default()), Box::new(CountingExporter)],
        ..Stages::default()
    };

    let report = Analysis::with_stages(ws.config(), mean_model(), stages)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.train_index, vec![0, 2]);
    assert_eq!(report.predictions.to_vec(), vec![2.0, 2.0, 2.0]);
    assert_eq!(ws.read("row_count.txt"), "3");
    assert!(!ws.results().join("statistics.txt").exists());
}

#[test]
fn run_file_drives_a_full_analysis() {
    let ws = Workspace::new(TRAIN, TEST);
    let run_path = ws.path().join("run.json");
    let json = format!(
        r#"{{
            "training_csv": {train:?},
            "testing_csv": {test:?},
            "input_features": "f1,f2",
            "target_feature": "target",
            "savepath": {save:?},
            "analysis_name": "from_file",
            "model": {{"kind": "mean"}}
        }}"#,
        train = ws.path().join("train.csv").display().to_string(),
        test = ws.path().join("test.csv").display().to_string(),
        save = ws.path().display().to_string(),
    );
    std::fs::write(&run_path, json).unwrap();

    let run = RunFile::from_path(&run_path).unwrap();
    assert_eq!(run.model, Some(ModelSpec::Mean));
    let model = run.model.as_ref().map(|spec| spec.build());
    let report = Analysis::execute(run.analysis, model).unwrap();
    assert_eq!(report.analysis_name, "from_file");
    assert!(ws.path().join("from_file").join("output_data.csv").is_file());
}
