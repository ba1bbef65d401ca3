//! End-to-end tests: raw CSV through Clean, Train, Evaluate and Predict.

use carprice_core::config::CarPriceConfig;
use carprice_core::persistence::tmp_path;
use carprice_core::{
    ArtifactError, CarPriceError, ModelArtifact, Pipeline, PipelineError, RawRow, Schema,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const MODELS: [(&str, f64, &str); 3] = [
    ("Hyundai Creta", 1_000_000.0, "SUV"),
    ("Maruti Swift", 500_000.0, "HatchBack"),
    ("Honda City", 800_000.0, "Sedan"),
];

fn raw_csv() -> String {
    let mut out = String::from(",Car Name,Year,Distance,Owner,Fuel,Location,Drive,Type,Price\n");
    for i in 0..66usize {
        let (name, base, body) = MODELS[i % 3];
        let year = 2015 + (i % 9) as i64;
        let distance = 10_000 + (i as i64 * 1_117) % 70_000;
        let owner = 1 + (i % 2) as i64;
        let fuel = if i % 4 == 0 { "DIESEL" } else { "PETROL" };
        let drive = if i % 5 == 0 { "Automatic" } else { "Manual" };
        let price = base - (2023 - year) as f64 * 40_000.0 - distance as f64 * 0.5;
        out.push_str(&format!(
            "{i},{name},{year},{distance},{owner},{fuel},KA-05,{drive},{body},{}\n",
            price as i64
        ));
    }
    // Rejected by Clean.
    out.push_str("66,Hyundai Creta,2020,-10,1,PETROL,KA-05,Manual,SUV,900000\n");
    out.push_str("67,Hyundai Creta,2020,1000,1,PETROL,KA-05,Manual,SUV,0\n");
    out.push_str("68,Hyundai Creta,2020,1000,1,PETROL,KA-05,Manual,SUV,\n");
    out.push_str("69,Hyundai,2020,1000,1,PETROL,KA-05,Manual,SUV,900000\n");
    out
}

fn config() -> CarPriceConfig {
    let mut config = CarPriceConfig::default();
    config.training.n_trees = 60;
    config
}

fn pipeline(dir: &Path) -> Pipeline {
    let pipeline = Pipeline::new(config(), dir);
    let raw = &pipeline.paths().raw_data;
    std::fs::create_dir_all(raw.parent().unwrap()).unwrap();
    std::fs::write(raw, raw_csv()).unwrap();
    pipeline
}

fn creta() -> RawRow {
    json!({
        "Year": 2020, "Distance": 35000, "Owner": 1, "Fuel": "PETROL",
        "Location": "KA-05", "Drive": "Manual", "Type": "SUV",
        "Brand": "Hyundai", "Model": "Creta"
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[test]
fn test_clean_drops_invalid_rows_and_writes_canonical_columns() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());

    let report = pipeline.clean(None, None).unwrap();
    assert_eq!(report.input_rows, 70);
    assert_eq!(report.kept, 66);
    assert_eq!(report.dropped, 4);

    let cleaned = std::fs::read_to_string(&pipeline.paths().cleaned_data).unwrap();
    let header = cleaned.lines().next().unwrap();
    assert_eq!(
        header,
        "Year,Distance,Owner,Fuel,Location,Drive,Type,Brand,Model,Price"
    );
    assert!(cleaned.contains(",Hyundai,Creta,"));
}

#[test]
fn test_full_pipeline_and_creta_prediction() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());

    let run = pipeline.run_all().unwrap();
    assert_eq!(run.train.train_rows + run.train.holdout_rows, 66);
    let metrics = run.metrics.unwrap();
    assert_eq!(metrics.rows, run.train.holdout_rows);
    assert!(metrics.mae.is_finite());
    assert_eq!(run.train.holdout_metrics, Some(metrics));

    let artifact_path = &pipeline.paths().artifact;
    assert!(artifact_path.exists());
    assert!(!tmp_path(artifact_path).exists());

    let artifact: ModelArtifact = ModelArtifact::load(artifact_path).unwrap();
    let prices = artifact.predict(&[creta()]).unwrap();
    assert_eq!(prices.len(), 1);
    assert!(prices[0].is_finite());
    assert!(prices[0] > 0.0, "price {}", prices[0]);
}

#[test]
fn test_round_trip_predictions_are_identical() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());
    pipeline.clean(None, None).unwrap();
    pipeline.train(None).unwrap();

    let path = &pipeline.paths().artifact;
    let first: ModelArtifact = ModelArtifact::load(path).unwrap();
    let copy = dir.path().join("copy.json");
    first.save(&copy).unwrap();
    let second: ModelArtifact = ModelArtifact::load(&copy).unwrap();

    let mut batch = vec![creta()];
    let mut swift = creta();
    swift.insert("Brand".into(), json!("Maruti"));
    swift.insert("Model".into(), json!("Swift"));
    batch.push(swift);
    let mut unseen = creta();
    unseen.insert("Brand".into(), json!("Lamborghini"));
    unseen.insert("Model".into(), json!("Huracan"));
    batch.push(unseen);

    let a = first.predict(&batch).unwrap();
    let b = second.predict(&batch).unwrap();
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn test_artifact_from_other_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());
    pipeline.clean(None, None).unwrap();
    pipeline.train(None).unwrap();

    let err = ModelArtifact::<carprice_core::GradientBoostedTrees>::load_expecting(
        &pipeline.paths().artifact,
        &Schema::with_version("v2"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CarPriceError::Artifact(ArtifactError::Incompatible { .. })
    ));
}

#[test]
fn test_batch_predict_uses_latest_file() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());
    pipeline.clean(None, None).unwrap();
    pipeline.train(None).unwrap();

    let new_data = &pipeline.paths().new_data_dir;
    std::fs::create_dir_all(new_data).unwrap();
    std::fs::write(
        new_data.join("batch_2024_01.csv"),
        "Car Name,Year,Distance,Owner,Fuel,Location,Drive,Type\n\
         Honda City,2019,40000,1,PETROL,KA-05,Manual,Sedan\n",
    )
    .unwrap();
    std::fs::write(
        new_data.join("batch_2024_02.csv"),
        ",Car Name,Year,Distance,Owner,Fuel,Location,Drive,Type\n\
         0,Hyundai Creta,2020,35000,1,PETROL,KA-05,Manual,SUV\n\
         1,Skoda Octavia,2018,52000,2,DIESEL,DL-3C,Automatic,Sedan\n",
    )
    .unwrap();

    let report = pipeline.predict(None, None).unwrap();
    assert!(report.input.ends_with("batch_2024_02.csv"));
    assert_eq!(report.rows, 2);
    assert_eq!(report.output, pipeline.paths().predictions_output());

    let output = std::fs::read_to_string(&report.output).unwrap();
    let mut lines = output.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Year,Distance,Owner,Fuel,Location,Drive,Type,Brand,Model,Predicted_Price"
    );
    let first: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(first[7], "Hyundai");
    assert_eq!(first[8], "Creta");
    let price: f64 = first[9].parse().unwrap();
    assert!(price.is_finite() && price > 0.0);
}

#[test]
fn test_predict_before_train_reports_missing_artifact() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());
    let input = dir.path().join("one.csv");
    std::fs::write(
        &input,
        "Car Name,Year,Distance,Owner,Fuel,Location,Drive,Type\n\
         Honda City,2019,40000,1,PETROL,KA-05,Manual,Sedan\n",
    )
    .unwrap();

    let err = pipeline.predict(Some(&input), None).unwrap_err();
    assert_eq!(err.code(), "ARTIFACT_NOT_FOUND");
}

#[test]
fn test_failed_training_writes_no_artifact() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(config(), dir.path());
    let cleaned = &pipeline.paths().cleaned_data;
    std::fs::create_dir_all(cleaned.parent().unwrap()).unwrap();
    std::fs::write(
        cleaned,
        "Year,Distance,Owner,Fuel,Location,Drive,Type,Brand,Model,Price\n",
    )
    .unwrap();

    let err = pipeline.train(None).unwrap_err();
    assert_eq!(err.code(), "EMPTY_TRAINING_SET");
    assert!(!pipeline.paths().artifact.exists());
    assert!(!tmp_path(&pipeline.paths().artifact).exists());
}

#[test]
fn test_evaluate_rejects_unlabelled_input() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(dir.path());
    pipeline.clean(None, None).unwrap();
    pipeline.train(None).unwrap();

    let input = dir.path().join("unlabelled.csv");
    std::fs::write(
        &input,
        "Car Name,Year,Distance,Owner,Fuel,Location,Drive,Type\n\
         Honda City,2019,40000,1,PETROL,KA-05,Manual,Sedan\n",
    )
    .unwrap();
    let err = pipeline.evaluate(Some(&input)).unwrap_err();
    assert!(matches!(
        err,
        CarPriceError::Pipeline(PipelineError::MissingLabels { rows: 1 })
    ));
}
