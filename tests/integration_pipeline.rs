//! End-to-end tests over a saved MeteoSwiss sounding

use chrono::{TimeZone, Utc};
use emagramm::cleaner::clean;
use emagramm::gradient::compute_gradient;
use emagramm::parser::parse_sounding;
use emagramm::{
    EmagrammConfig, MeasurementTable, Slot, SoundingError, SoundingProcessor, StabilityBand,
    Station, StationStore, SvgRenderer, process_text,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const FIXTURE: &str = "Milano_VSST80.LSSW_20210302_0000.txt";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(FIXTURE)
}

fn table(rows: Vec<Vec<f64>>) -> MeasurementTable {
    MeasurementTable::new(vec!["Height".to_string(), "Temp".to_string()], rows)
}

#[test]
fn test_fixture_through_every_stage() {
    let text = fs::read_to_string(fixture_path()).unwrap();
    let now = Utc.with_ymd_and_hms(2021, 3, 2, 6, 0, 0).unwrap();

    let result = process_text(&text, FIXTURE, now).unwrap();

    assert_eq!(result.station_code, "VSST80");
    assert_eq!(result.slot, Slot::Current);
    assert_eq!(result.meta.location, "Milano");
    assert_eq!(result.meta.date_label(), "02-03-2021");
    assert_eq!(result.meta.observation_time, "0000");
    assert_eq!(result.meta.headers, vec!["Press", "Height", "Temp", "RH"]);

    // Duplicate and sentinel rows removed
    assert_eq!(result.table.len(), 7);
    assert_eq!(result.gradient.len(), 6);
    assert_eq!(
        result.bands,
        vec![
            Some(StabilityBand::VeryStable),
            Some(StabilityBand::Stable),
            Some(StabilityBand::Unstable),
            Some(StabilityBand::VeryStable),
            Some(StabilityBand::SlightlyStable),
            Some(StabilityBand::Neutral),
        ]
    );
}

#[test]
fn test_fixture_resolves_to_previous_after_twelve_hours() {
    let text = fs::read_to_string(fixture_path()).unwrap();
    let now = Utc.with_ymd_and_hms(2021, 3, 2, 12, 0, 0).unwrap();

    let result = process_text(&text, FIXTURE, now).unwrap();
    assert_eq!(result.slot, Slot::Previous);
}

#[test]
fn test_sentinel_row_removed_before_gradient() {
    let cleaned = clean(&table(vec![
        vec![100.0, 15.0],
        vec![9999.9, 999.0],
        vec![200.0, 14.0],
    ]));
    assert_eq!(cleaned.rows(), &[vec![100.0, 15.0], vec![200.0, 14.0]]);

    let samples = compute_gradient(&cleaned).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].height_delta, 100.0);
    assert!((samples[0].temp_gradient - -1.0).abs() < 1.0e-9);
    assert_eq!(
        emagramm::stability::classify(samples[0].temp_gradient),
        Some(StabilityBand::VeryStable)
    );
}

#[test]
fn test_equal_heights_use_floor_delta() {
    let samples = compute_gradient(&table(vec![vec![100.0, 15.0], vec![100.0, 15.0]])).unwrap();

    assert_eq!(samples[0].height_delta, 0.1);
    assert_eq!(samples[0].temp_gradient, 0.0);
    assert_eq!(
        emagramm::stability::classify(samples[0].temp_gradient),
        Some(StabilityBand::Neutral)
    );
}

#[test]
fn test_five_line_file_is_malformed() {
    let text: String = fs::read_to_string(fixture_path())
        .unwrap()
        .lines()
        .take(5)
        .map(|l| format!("{}\n", l))
        .collect();

    match parse_sounding(&text, FIXTURE) {
        Err(SoundingError::MalformedSounding { file, line, .. }) => {
            assert_eq!(file, FIXTURE);
            assert_eq!(line, 5);
        }
        other => panic!("Expected MalformedSounding error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_offline_cycle_renders_and_persists() {
    let temp_dir = TempDir::new().unwrap();
    let raw_dir = temp_dir.path().join("rawfiles");
    fs::create_dir_all(&raw_dir).unwrap();
    let raw_file = raw_dir.join(FIXTURE);
    fs::copy(fixture_path(), &raw_file).unwrap();

    let config = EmagrammConfig::default()
        .with_stations(vec![Station::new("Milano", "VSST80")])
        .with_output_root(temp_dir.path());
    let now = Utc.with_ymd_and_hms(2021, 3, 2, 6, 0, 0).unwrap();

    let processor = SoundingProcessor::new(config.clone(), SvgRenderer::new(&config.image_dir));
    let outcome = processor.run_offline(&[raw_file], now).await.unwrap();

    assert_eq!(outcome.stats.files_processed, 1);
    assert_eq!(outcome.stats.files_failed, 0);
    assert_eq!(outcome.stats.images_rendered, 1);

    let svg = fs::read_to_string(config.image_dir.join("VSST80_current.svg")).unwrap();
    assert!(svg.contains("Gradient in Milano on 02-03-2021, at 0000"));

    let stored = StationStore::new(&config.storage_file).load().unwrap();
    assert_eq!(stored, outcome.stations);
    assert_eq!(stored[0].get(Slot::Current).unwrap().gradient.len(), 6);
}
