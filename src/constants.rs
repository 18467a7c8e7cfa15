//! Application constants for the emagramm processor
//!
//! Sounding file layout, sentinel values, stability thresholds, plot
//! bounds and the default station list.

// =============================================================================
// Sounding File Layout
// =============================================================================

/// Number of preamble lines before the first data row
pub const PREAMBLE_LINES: usize = 7;

/// Line index of the station/location title
pub const LOCATION_LINE: usize = 0;

/// Line index of the "date time" line
pub const DATETIME_LINE: usize = 2;

/// Line index of the column header names
pub const HEADER_LINE: usize = 4;

/// Line index of the unit labels
pub const UNITS_LINE: usize = 5;

/// Accepted day-first date formats on the date-time line
pub const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d.%m.%Y"];

/// Pattern identifying a MeteoSwiss radio-sounding station code
pub const STATION_CODE_PATTERN: &str = r"VSST[0-9]{2}";

// =============================================================================
// Cleaning
// =============================================================================

/// Values the sounding files use to mark a missing measurement
pub const MISSING_VALUE_SENTINELS: &[f64] = &[9999.9, 999.0];

/// Standard column names
pub mod columns {
    pub const HEIGHT: &str = "Height";
    pub const TEMP: &str = "Temp";
}

// =============================================================================
// Gradient and Stability
// =============================================================================

/// Substitute for a zero height difference between adjacent rows.
/// Approximate: a workaround for repeated heights, not a physical floor.
pub const ZERO_HEIGHT_DELTA_SUBSTITUTE: f64 = 0.1;

/// Gradients are expressed per this many metres
pub const GRADIENT_REFERENCE_METRES: f64 = 100.0;

/// Upper bounds (inclusive) of the stable bands, in °C per 100 m
pub mod thresholds {
    pub const NEUTRAL_LOWER: f64 = -0.5;
    pub const SLIGHTLY_STABLE_LOWER: f64 = -0.6;
    pub const STABLE_LOWER: f64 = -0.8;
    /// Gradients at or below this value are left unclassified
    pub const VERY_STABLE_LOWER: f64 = -100.0;
}

// =============================================================================
// Slot Resolution and Fetching
// =============================================================================

/// Soundings are launched every this many hours
pub const SOUNDING_CADENCE_HOURS: i64 = 12;

/// Product suffix in raw file names and URLs
pub const PRODUCT_SUFFIX: &str = "LSSW";

/// Default MeteoSwiss radio-sounding endpoint
pub const DEFAULT_BASE_URL: &str =
    "https://www.meteoschweiz.admin.ch/product/input/radio-soundings/";

/// Default HTTP request timeout
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_STORAGE_FILE: &str = "stations.json";
pub const DEFAULT_RAW_DIR: &str = "rawfiles";
pub const DEFAULT_IMAGE_DIR: &str = "static/images";

/// Stations fetched when no configuration file overrides them
pub const DEFAULT_STATIONS: &[(&str, &str)] = &[
    ("VSST76", "Payerne"),
    ("VSST77", "München"),
    ("VSST78", "Stuttgart"),
    ("VSST80", "Milano"),
];

// =============================================================================
// Storage and Rendering
// =============================================================================

/// Version of the persisted station document
pub const STORAGE_SCHEMA_VERSION: u32 = 1;

/// Plot axis bounds
pub const PLOT_HEIGHT_RANGE: (f64, f64) = (0.0, 5000.0);
pub const PLOT_TEMP_RANGE: (f64, f64) = (-30.0, 10.0);

/// Opacity of the stability spans
pub const SPAN_OPACITY: f64 = 0.5;

/// Line colour of the temperature profile
pub const TEMP_PROFILE_COLOR: &str = "#3F3F3F";

/// Line colour of the gradient profile
pub const GRADIENT_PROFILE_COLOR: &str = "#1f77b4";

/// Look up the display name of a known station code
pub fn default_station_name(code: &str) -> Option<&'static str> {
    DEFAULT_STATIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Check whether a value is one of the missing-value sentinels
pub fn is_missing_sentinel(value: f64, sentinels: &[f64]) -> bool {
    sentinels.iter().any(|s| *s == value)
}
