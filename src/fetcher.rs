//! Raw sounding supplier.
//!
//! Builds MeteoSwiss radio-sounding URLs and raw file names for a station
//! and time slot, fetches the text over HTTP and saves it alongside the
//! other raw files. Failures are reported, never retried.

use crate::config::Station;
use crate::constants::{PRODUCT_SUFFIX, SOUNDING_CADENCE_HOURS};
use crate::error::{Result, SoundingError};
use crate::models::Slot;
use chrono::{DateTime, Duration, Timelike, Utc};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tokio::fs;
use tracing::debug;

const USER_AGENT: &str = concat!("emagramm/", env!("CARGO_PKG_VERSION"));

/// One station/slot fetch, with the URL and file name it resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub station: Station,
    pub slot: Slot,
    pub url: String,
    pub file_name: String,
}

impl FetchRequest {
    pub fn new(base_url: &str, station: &Station, slot: Slot, now: DateTime<Utc>) -> Self {
        let reference = slot_reference_time(slot, now);
        Self {
            station: station.clone(),
            slot,
            url: fetch_url(base_url, &station.code, reference),
            file_name: raw_file_name(&station.name, &station.code, reference),
        }
    }
}

/// Time the launch of a slot is looked up for: now, or 12 hours earlier
pub fn slot_reference_time(slot: Slot, now: DateTime<Utc>) -> DateTime<Utc> {
    match slot {
        Slot::Current => now,
        Slot::Previous => now - Duration::hours(SOUNDING_CADENCE_HOURS),
    }
}

/// Launch hour for a reference time: 12 if past noon, otherwise 0
pub fn launch_hour(reference: DateTime<Utc>) -> u32 {
    if reference.hour() > 12 { 12 } else { 0 }
}

/// `.LSSW_YYYYMMDD_HH00.txt`
pub fn date_time_suffix(reference: DateTime<Utc>) -> String {
    format!(
        ".{}_{}_{:02}00.txt",
        PRODUCT_SUFFIX,
        reference.format("%Y%m%d"),
        launch_hour(reference)
    )
}

pub fn fetch_url(base_url: &str, station_code: &str, reference: DateTime<Utc>) -> String {
    format!("{}{}{}", base_url, station_code, date_time_suffix(reference))
}

pub fn raw_file_name(station_name: &str, station_code: &str, reference: DateTime<Utc>) -> String {
    format!(
        "{}_{}{}",
        station_name,
        station_code,
        date_time_suffix(reference)
    )
}

/// Source of raw sounding text
pub trait RawTextSupplier {
    fn fetch(&self, request: &FetchRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Fetches soundings over HTTP
#[derive(Debug, Clone)]
pub struct HttpSupplier {
    client: reqwest::Client,
}

impl HttpSupplier {
    pub fn new(timeout: StdDuration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SoundingError::configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl RawTextSupplier for HttpSupplier {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        let fetch_error = |reason: String| SoundingError::Fetch {
            station: request.station.code.clone(),
            url: request.url.clone(),
            reason,
        };

        debug!(station = %request.station.code, url = %request.url, "Fetching sounding");

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP status {}", status.as_u16())));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }
}

/// Write fetched text to `raw_dir/file_name`, returning the full path
pub async fn save_raw(raw_dir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
    fs::create_dir_all(raw_dir).await?;
    let path = raw_dir.join(file_name);
    fs::write(&path, text).await?;
    debug!("Saved raw sounding to {}", path.display());
    Ok(path)
}
