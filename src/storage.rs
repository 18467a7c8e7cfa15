//! Persistence of the per-station current/previous aggregate.
//!
//! The store is a JSON document with an explicit schema version. Its record
//! types mirror, but are independent of, the in-memory models so the file
//! format stays stable when those change. Every save overwrites the whole
//! document.

use crate::constants::STORAGE_SCHEMA_VERSION;
use crate::error::{Result, SoundingError};
use crate::models::{GradientSample, MeasurementTable, Slot, SoundingMeta, SoundingResult, StationSlot};
use crate::stability::StabilityBand;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub stations: Vec<StoredStation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredStation {
    pub station_code: String,
    pub station_name: String,
    pub current: Option<StoredSounding>,
    pub previous: Option<StoredSounding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSounding {
    pub slot: StoredSlot,
    pub metadata: StoredMetadata,
    pub table: StoredTable,
    pub gradient: Vec<StoredGradient>,
    /// Band per gradient sample, `null` where unclassified
    pub classification: Vec<Option<StoredBand>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredSlot {
    Current,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMetadata {
    pub location: String,
    pub observation_date: NaiveDate,
    pub observation_time: String,
    pub observation_hour: u32,
    pub observation_instant: DateTime<Utc>,
    pub headers: Vec<String>,
    pub units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredGradient {
    pub height_mid: f64,
    pub height_delta: f64,
    pub temp_mid: f64,
    pub temp_gradient: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoredBand {
    Unstable,
    Neutral,
    SlightlyStable,
    Stable,
    VeryStable,
}

// -----------------------------------------------------------------------------
// Conversions
// -----------------------------------------------------------------------------

impl From<Slot> for StoredSlot {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Current => StoredSlot::Current,
            Slot::Previous => StoredSlot::Previous,
        }
    }
}

impl From<StoredSlot> for Slot {
    fn from(slot: StoredSlot) -> Self {
        match slot {
            StoredSlot::Current => Slot::Current,
            StoredSlot::Previous => Slot::Previous,
        }
    }
}

impl From<StabilityBand> for StoredBand {
    fn from(band: StabilityBand) -> Self {
        match band {
            StabilityBand::Unstable => StoredBand::Unstable,
            StabilityBand::Neutral => StoredBand::Neutral,
            StabilityBand::SlightlyStable => StoredBand::SlightlyStable,
            StabilityBand::Stable => StoredBand::Stable,
            StabilityBand::VeryStable => StoredBand::VeryStable,
        }
    }
}

impl From<StoredBand> for StabilityBand {
    fn from(band: StoredBand) -> Self {
        match band {
            StoredBand::Unstable => StabilityBand::Unstable,
            StoredBand::Neutral => StabilityBand::Neutral,
            StoredBand::SlightlyStable => StabilityBand::SlightlyStable,
            StoredBand::Stable => StabilityBand::Stable,
            StoredBand::VeryStable => StabilityBand::VeryStable,
        }
    }
}

impl From<&GradientSample> for StoredGradient {
    fn from(s: &GradientSample) -> Self {
        Self {
            height_mid: s.height_mid,
            height_delta: s.height_delta,
            temp_mid: s.temp_mid,
            temp_gradient: s.temp_gradient,
        }
    }
}

impl From<StoredGradient> for GradientSample {
    fn from(s: StoredGradient) -> Self {
        Self {
            height_mid: s.height_mid,
            height_delta: s.height_delta,
            temp_mid: s.temp_mid,
            temp_gradient: s.temp_gradient,
        }
    }
}

impl From<&SoundingResult> for StoredSounding {
    fn from(result: &SoundingResult) -> Self {
        let meta = &result.meta;
        Self {
            slot: result.slot.into(),
            metadata: StoredMetadata {
                location: meta.location.clone(),
                observation_date: meta.observation_date,
                observation_time: meta.observation_time.clone(),
                observation_hour: meta.observation_hour,
                observation_instant: meta.observation_instant,
                headers: meta.headers.clone(),
                units: meta.units.clone(),
            },
            table: StoredTable {
                columns: result.table.headers().to_vec(),
                rows: result.table.rows().to_vec(),
            },
            gradient: result.gradient.iter().map(StoredGradient::from).collect(),
            classification: result.bands.iter().map(|b| b.map(StoredBand::from)).collect(),
        }
    }
}

impl From<&StationSlot> for StoredStation {
    fn from(slot: &StationSlot) -> Self {
        Self {
            station_code: slot.station_code.clone(),
            station_name: slot.station_name.clone(),
            current: slot.current.as_ref().map(StoredSounding::from),
            previous: slot.previous.as_ref().map(StoredSounding::from),
        }
    }
}

impl StoredSounding {
    fn into_result(self, station_code: &str, path: &Path) -> Result<SoundingResult> {
        let corrupt = |reason: String| SoundingError::CorruptStore {
            path: path.to_path_buf(),
            reason: format!("{} ({}): {}", station_code, Slot::from(self.slot), reason),
        };

        let width = self.table.columns.len();
        if let Some(row) = self.table.rows.iter().position(|r| r.len() != width) {
            return Err(corrupt(format!("table row {} does not have {} values", row, width)));
        }
        if self.classification.len() != self.gradient.len() {
            return Err(corrupt(format!(
                "{} classifications for {} gradient samples",
                self.classification.len(),
                self.gradient.len()
            )));
        }

        let m = self.metadata;
        Ok(SoundingResult {
            station_code: station_code.to_string(),
            slot: self.slot.into(),
            meta: SoundingMeta {
                location: m.location,
                observation_date: m.observation_date,
                observation_time: m.observation_time,
                observation_hour: m.observation_hour,
                observation_instant: m.observation_instant,
                headers: m.headers,
                units: m.units,
            },
            table: MeasurementTable::new(self.table.columns, self.table.rows),
            gradient: self.gradient.into_iter().map(GradientSample::from).collect(),
            bands: self
                .classification
                .into_iter()
                .map(|b| b.map(StabilityBand::from))
                .collect(),
        })
    }
}

// -----------------------------------------------------------------------------
// Store
// -----------------------------------------------------------------------------

/// JSON file holding the latest aggregate of all stations
#[derive(Debug, Clone)]
pub struct StationStore {
    path: PathBuf,
}

impl StationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the store with the given station aggregate
    pub fn save(&self, stations: &[StationSlot], generated_at: DateTime<Utc>) -> Result<()> {
        let document = StoredDocument {
            schema_version: STORAGE_SCHEMA_VERSION,
            generated_at,
            stations: stations.iter().map(StoredStation::from).collect(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, json)?;

        info!(
            "Saved {} stations to {}",
            document.stations.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the raw document, checking its schema version
    pub fn load_document(&self) -> Result<StoredDocument> {
        let content = fs::read_to_string(&self.path)?;
        let document: StoredDocument = serde_json::from_str(&content)?;

        if document.schema_version != STORAGE_SCHEMA_VERSION {
            return Err(SoundingError::UnsupportedSchema {
                path: self.path.clone(),
                found: document.schema_version,
                expected: STORAGE_SCHEMA_VERSION,
            });
        }

        debug!(
            "Loaded store {} generated at {}",
            self.path.display(),
            document.generated_at
        );
        Ok(document)
    }

    /// Load the station aggregate back into the in-memory models
    pub fn load(&self) -> Result<Vec<StationSlot>> {
        self.load_document()?
            .stations
            .into_iter()
            .map(|stored| -> Result<StationSlot> {
                let code = stored.station_code;
                Ok(StationSlot {
                    current: stored
                        .current
                        .map(|s| s.into_result(&code, &self.path))
                        .transpose()?,
                    previous: stored
                        .previous
                        .map(|s| s.into_result(&code, &self.path))
                        .transpose()?,
                    station_name: stored.station_name,
                    station_code: code,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::process_text;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const TEXT: &str = "Payerne\n\n02-03-2021 0000\n\nHeight Temp\nm C\n\n\
                        491 5.0\n600 4.0\n700 4.5\n800 4.5\n";

    fn sample_slots() -> Vec<StationSlot> {
        let now = Utc.with_ymd_and_hms(2021, 3, 2, 6, 0, 0).unwrap();
        let result = process_text(TEXT, "Payerne_VSST76.LSSW_20210302_0000.txt", now).unwrap();

        let mut payerne = StationSlot::new("VSST76", "Payerne");
        payerne.assign(result);
        vec![payerne, StationSlot::new("VSST80", "Milano")]
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = StationStore::new(dir.path().join("state").join("stations.json"));
        let slots = sample_slots();
        let generated_at = Utc.with_ymd_and_hms(2021, 3, 2, 6, 5, 0).unwrap();

        store.save(&slots, generated_at).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, slots);
        assert_eq!(store.load_document().unwrap().generated_at, generated_at);
    }

    #[test]
    fn test_document_layout() {
        let dir = TempDir::new().unwrap();
        let store = StationStore::new(dir.path().join("stations.json"));
        store.save(&sample_slots(), Utc::now()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();

        assert_eq!(json["schema_version"], 1);
        let payerne = &json["stations"][0];
        assert_eq!(payerne["station_code"], "VSST76");
        assert_eq!(payerne["current"]["slot"], "current");
        assert_eq!(payerne["current"]["metadata"]["observation_time"], "0000");
        assert_eq!(payerne["current"]["classification"][0], "very_stable");
        assert!(payerne["previous"].is_null());
        assert!(json["stations"][1]["current"].is_null());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let dir = TempDir::new().unwrap();
        let store = StationStore::new(dir.path().join("stations.json"));

        store.save(&sample_slots(), Utc::now()).unwrap();
        store
            .save(&[StationSlot::new("VSST78", "Stuttgart")], Utc::now())
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![StationSlot::new("VSST78", "Stuttgart")]);
    }

    #[test]
    fn test_unsupported_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stations.json");
        fs::write(
            &path,
            r#"{"schema_version": 99, "generated_at": "2021-03-02T06:00:00Z", "stations": []}"#,
        )
        .unwrap();

        match StationStore::new(&path).load().unwrap_err() {
            SoundingError::UnsupportedSchema { found, expected, .. } => {
                assert_eq!(found, 99);
                assert_eq!(expected, STORAGE_SCHEMA_VERSION);
            }
            other => panic!("Expected UnsupportedSchema, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_table_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = StationStore::new(dir.path().join("stations.json"));
        store.save(&sample_slots(), Utc::now()).unwrap();

        let mut document = store.load_document().unwrap();
        if let Some(current) = document.stations[0].current.as_mut() {
            current.table.rows[0].pop();
        }
        fs::write(store.path(), serde_json::to_string(&document).unwrap()).unwrap();

        assert!(matches!(
            store.load(),
            Err(SoundingError::CorruptStore { .. })
        ));
    }

    #[test]
    fn test_missing_store_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = StationStore::new(dir.path().join("absent.json"));
        assert!(matches!(store.load(), Err(SoundingError::Io(_))));
    }
}
