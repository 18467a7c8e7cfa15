//! Tests for the processor module
//!
//! Runs whole cycles against an in-memory supplier and a temporary output
//! root.


use crate::config::{EmagrammConfig, Station};
use crate::error::{Result, SoundingError};
use crate::fetcher::{FetchRequest, RawTextSupplier};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::Path;

pub const BASE_URL: &str = "http://soundings.test/";

/// Serves sounding text by URL; unknown URLs fail like an HTTP 404
#[derive(Debug, Default)]
pub struct MockSupplier {
    responses: HashMap<String, String>,
}

impl MockSupplier {
    pub fn with(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses.insert(url.into(), text.into());
        self
    }
}

impl RawTextSupplier for MockSupplier {
    async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        self.responses
            .get(&request.url)
            .cloned()
            .ok_or_else(|| SoundingError::Fetch {
                station: request.station.code.clone(),
                url: request.url.clone(),
                reason: "HTTP status 404".to_string(),
            })
    }
}

/// 2021-03-02 14:30 UTC: current slot is the 12Z launch, previous the 00Z one
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 2, 14, 30, 0).unwrap()
}

pub fn url(code: &str, stamp: &str) -> String {
    format!("{}{}.LSSW_{}.txt", BASE_URL, code, stamp)
}

pub fn sounding(location: &str, date: &str, time: &str, rows: &str) -> String {
    format!(
        "{}\n\n{} {}\n\nHeight Temp\nm C\n\n{}",
        location, date, time, rows
    )
}

pub fn test_config(root: &Path) -> EmagrammConfig {
    EmagrammConfig::default()
        .with_stations(vec![
            Station::new("Payerne", "VSST76"),
            Station::new("Milano", "VSST80"),
        ])
        .with_base_url(BASE_URL)
        .with_output_root(root)
}
