//! Core data structures for sounding processing.
//!
//! Defines the parsed metadata and measurement table, the derived gradient
//! samples, per-station aggregation slots and run statistics. Each pipeline
//! stage produces a new value of one of these types rather than mutating a
//! shared record.

use crate::stability::StabilityBand;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::path::PathBuf;

/// Which of the two most recent launches a sounding belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Current,
    Previous,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Current, Slot::Previous];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Current => "current",
            Slot::Previous => "previous",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata extracted from the sounding preamble
#[derive(Debug, Clone, PartialEq)]
pub struct SoundingMeta {
    /// Title line with whitespace and `/` replaced by `_`
    pub location: String,
    pub observation_date: NaiveDate,
    /// Raw `HHMM` token as it appears in the file
    pub observation_time: String,
    pub observation_hour: u32,
    pub observation_instant: DateTime<Utc>,
    pub headers: Vec<String>,
    pub units: Vec<String>,
}

impl SoundingMeta {
    /// Date formatted the way the source files print it
    pub fn date_label(&self) -> String {
        self.observation_date.format("%d-%m-%Y").to_string()
    }
}

/// Ordered rows of numeric measurements keyed by column header.
///
/// Every row holds exactly one value per header.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTable {
    headers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl MeasurementTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == headers.len()));
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of one column in row order
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Value of a named column in a given row
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let index = self.column_index(name)?;
        self.rows.get(row).map(|r| r[index])
    }
}

/// Finite difference between two adjacent measurement rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientSample {
    pub height_mid: f64,
    pub height_delta: f64,
    pub temp_mid: f64,
    /// °C per 100 m
    pub temp_gradient: f64,
}

impl GradientSample {
    /// Lower and upper height of the layer this sample spans
    pub fn span(&self) -> (f64, f64) {
        let half = 0.5 * self.height_delta;
        (self.height_mid - half, self.height_mid + half)
    }
}

/// Fully processed sounding for one station and slot
#[derive(Debug, Clone, PartialEq)]
pub struct SoundingResult {
    pub station_code: String,
    pub slot: Slot,
    pub meta: SoundingMeta,
    pub table: MeasurementTable,
    pub gradient: Vec<GradientSample>,
    /// One entry per gradient sample; `None` where no band applies
    pub bands: Vec<Option<StabilityBand>>,
}

/// Current and previous soundings of one station
#[derive(Debug, Clone, PartialEq)]
pub struct StationSlot {
    pub station_code: String,
    pub station_name: String,
    pub current: Option<SoundingResult>,
    pub previous: Option<SoundingResult>,
}

impl StationSlot {
    pub fn new(station_code: impl Into<String>, station_name: impl Into<String>) -> Self {
        Self {
            station_code: station_code.into(),
            station_name: station_name.into(),
            current: None,
            previous: None,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&SoundingResult> {
        match slot {
            Slot::Current => self.current.as_ref(),
            Slot::Previous => self.previous.as_ref(),
        }
    }

    /// Place a result in the slot it resolved to.
    ///
    /// When the slot is already occupied the more recent observation wins;
    /// on equal instants the held result stays.
    pub fn assign(&mut self, result: SoundingResult) -> Assignment {
        let target = match result.slot {
            Slot::Current => &mut self.current,
            Slot::Previous => &mut self.previous,
        };

        let incoming = result.meta.observation_instant;
        match target.as_ref().map(|held| held.meta.observation_instant) {
            Some(held) if held == incoming => Assignment::Duplicate,
            Some(held) if held > incoming => Assignment::Rejected(result),
            _ => target
                .replace(result)
                .map_or(Assignment::Filled, Assignment::Replaced),
        }
    }
}

/// Outcome of `StationSlot::assign`
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// The slot was empty
    Filled,
    /// The slot already held the same observation
    Duplicate,
    /// An older observation was displaced and is returned
    Replaced(SoundingResult),
    /// The incoming observation is older than the held one
    Rejected(SoundingResult),
}

/// A file that could not be turned into a `SoundingResult`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub identifier: String,
    pub reason: String,
}

/// Statistics for one fetch-and-process cycle
#[derive(Debug, Default)]
pub struct CycleStats {
    pub files_fetched: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub images_rendered: usize,
    pub images_failed: usize,
    pub failures: Vec<FileFailure>,
    /// Plots that could not be written; their soundings are still stored
    pub render_failures: Vec<FileFailure>,
    pub storage_path: Option<PathBuf>,
    pub processing_time_ms: u128,
}

impl CycleStats {
    pub fn record_failure(&mut self, identifier: impl Into<String>, reason: impl Into<String>) {
        self.files_failed += 1;
        self.failures.push(FileFailure {
            identifier: identifier.into(),
            reason: reason.into(),
        });
    }

    pub fn record_render_failure(&mut self, image: impl Into<String>, reason: impl Into<String>) {
        self.images_failed += 1;
        self.render_failures.push(FileFailure {
            identifier: image.into(),
            reason: reason.into(),
        });
    }
}
