//! Configuration management and validation.
//!
//! Provides the station list, endpoint and output locations for a fetch
//! cycle, loaded from a TOML file or built from defaults.

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_IMAGE_DIR, DEFAULT_RAW_DIR,
    DEFAULT_STATIONS, DEFAULT_STORAGE_FILE, default_station_name,
};
use crate::error::{Result, SoundingError};
use crate::parser::extract_station_code;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// A radio-sounding station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Display name, also used in raw file names. Known codes may omit it.
    #[serde(default)]
    pub name: String,
    /// MeteoSwiss product code, e.g. `VSST80`
    pub code: String,
}

impl Station {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Global configuration for a fetch-and-process cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmagrammConfig {
    /// Prefix the station code and date suffix are appended to
    pub base_url: String,

    /// Stations fetched each cycle
    pub stations: Vec<Station>,

    /// Where the station aggregate is persisted
    pub storage_file: PathBuf,

    /// Directory raw sounding text is saved to
    pub raw_dir: PathBuf,

    /// Directory plots are written to
    pub image_dir: PathBuf,

    /// HTTP request timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Skip plot rendering
    pub render: bool,
}

impl Default for EmagrammConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stations: DEFAULT_STATIONS
                .iter()
                .map(|(code, name)| Station::new(*name, *code))
                .collect(),
            storage_file: PathBuf::from(DEFAULT_STORAGE_FILE),
            raw_dir: PathBuf::from(DEFAULT_RAW_DIR),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            render: true,
        }
    }
}

impl EmagrammConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            "Loaded configuration from {} with {} stations",
            path.display(),
            config.stations.len()
        );
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| SoundingError::configuration(format!("invalid TOML: {}", e)))?;
        config.fill_default_names();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(SoundingError::configuration("base_url must not be empty"));
        }
        if self.stations.is_empty() {
            return Err(SoundingError::configuration("no stations configured"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(SoundingError::configuration(
                "fetch_timeout_secs must be greater than zero",
            ));
        }

        let mut codes = HashSet::new();
        for station in &self.stations {
            if station.name.trim().is_empty() {
                return Err(SoundingError::configuration(format!(
                    "station {} needs a name",
                    station.code
                )));
            }
            if extract_station_code(&station.code).as_deref() != Some(station.code.as_str()) {
                return Err(SoundingError::configuration(format!(
                    "station '{}' has invalid code '{}'",
                    station.name, station.code
                )));
            }
            if !codes.insert(station.code.as_str()) {
                return Err(SoundingError::configuration(format!(
                    "duplicate station code '{}'",
                    station.code
                )));
            }
        }

        Ok(())
    }

    /// Name unnamed stations after the known MeteoSwiss sites
    fn fill_default_names(&mut self) {
        for station in &mut self.stations {
            if station.name.is_empty() {
                if let Some(name) = default_station_name(&station.code) {
                    station.name = name.to_string();
                }
            }
        }
    }

    /// Replace the station list
    pub fn with_stations(mut self, stations: Vec<Station>) -> Self {
        self.stations = stations;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Put storage, raw files and images under one directory
    pub fn with_output_root(mut self, root: &Path) -> Self {
        self.storage_file = root.join(DEFAULT_STORAGE_FILE);
        self.raw_dir = root.join(DEFAULT_RAW_DIR);
        self.image_dir = root.join(DEFAULT_IMAGE_DIR);
        self
    }

    pub fn without_rendering(mut self) -> Self {
        self.render = false;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EmagrammConfig::default();
        config.validate().unwrap();
        assert_eq!(config.stations.len(), 4);
        assert_eq!(config.stations[0], Station::new("Payerne", "VSST76"));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_toml() {
        let content = r#"
base_url = "https://example.org/soundings/"
storage_file = "state/stations.json"
fetch_timeout_secs = 10

[[stations]]
name = "Milano"
code = "VSST80"
"#;
        let config = EmagrammConfig::from_toml_str(content).unwrap();

        assert_eq!(config.base_url, "https://example.org/soundings/");
        assert_eq!(config.stations, vec![Station::new("Milano", "VSST80")]);
        assert_eq!(config.storage_file, PathBuf::from("state/stations.json"));
        // Unspecified fields fall back to defaults
        assert_eq!(config.raw_dir, PathBuf::from(DEFAULT_RAW_DIR));
        assert!(config.render);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("emagramm.toml");
        std::fs::write(&path, "[[stations]]\nname = \"Payerne\"\ncode = \"VSST76\"\n").unwrap();

        let config = EmagrammConfig::load(&path).unwrap();
        assert_eq!(config.stations.len(), 1);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_sample_config_matches_defaults() {
        let sample = EmagrammConfig::from_toml_str(include_str!("../emagramm.toml")).unwrap();
        let defaults = EmagrammConfig::default();

        assert_eq!(sample.base_url, defaults.base_url);
        assert_eq!(sample.stations, defaults.stations);
        assert_eq!(sample.storage_file, defaults.storage_file);
    }

    #[test]
    fn test_known_station_name_filled_in() {
        let config =
            EmagrammConfig::from_toml_str("[[stations]]\ncode = \"VSST77\"\n").unwrap();
        assert_eq!(config.stations[0].name, "München");

        let unknown = EmagrammConfig::from_toml_str("[[stations]]\ncode = \"VSST55\"\n");
        assert!(matches!(unknown, Err(SoundingError::Configuration { .. })));
    }

    #[test]
    fn test_invalid_station_code_rejected() {
        let config =
            EmagrammConfig::default().with_stations(vec![Station::new("Nowhere", "XX01")]);
        assert!(matches!(
            config.validate(),
            Err(SoundingError::Configuration { .. })
        ));

        let padded =
            EmagrammConfig::default().with_stations(vec![Station::new("Milano", "VSST801")]);
        assert!(padded.validate().is_err());
    }

    #[test]
    fn test_duplicate_station_code_rejected() {
        let config = EmagrammConfig::default().with_stations(vec![
            Station::new("Milano", "VSST80"),
            Station::new("Linate", "VSST80"),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        assert!(matches!(
            EmagrammConfig::from_toml_str("stations = 3"),
            Err(SoundingError::Configuration { .. })
        ));
    }

    #[test]
    fn test_output_root() {
        let config = EmagrammConfig::default().with_output_root(Path::new("/tmp/out"));
        assert_eq!(config.storage_file, PathBuf::from("/tmp/out/stations.json"));
        assert_eq!(config.image_dir, PathBuf::from("/tmp/out/static/images"));
    }
}
