//! Sounding preamble parsing and metadata extraction.
//!
//! The first seven lines of a sounding hold the location title, the
//! observation date and time, the column headers and their units. This
//! module turns them into a `SoundingMeta` and reports where data rows begin.

use crate::constants::{
    DATE_FORMATS, DATETIME_LINE, HEADER_LINE, LOCATION_LINE, PREAMBLE_LINES, UNITS_LINE,
};
use crate::error::{Result, SoundingError};
use crate::models::SoundingMeta;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static LOCATION_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s/]").expect("valid location regex"));

/// Extract metadata from the preamble of a sounding.
///
/// `lines` is the whole file split into lines; `file` identifies it in
/// errors. Returns the metadata and the index of the first data line.
pub fn parse_preamble(lines: &[&str], file: &str) -> Result<(SoundingMeta, usize)> {
    if lines.len() < PREAMBLE_LINES {
        // Last line present, or line 1 for an empty file
        return Err(SoundingError::malformed(
            file,
            lines.len().max(1),
            format!(
                "expected at least {} preamble lines, found {}",
                PREAMBLE_LINES,
                lines.len()
            ),
        ));
    }

    let mut builder = SoundingMetaBuilder::new();
    for (line_num, line) in lines.iter().take(PREAMBLE_LINES).enumerate() {
        builder.parse_line(line_num, line, file)?;
    }
    let meta = builder.build(file)?;

    debug!(
        "Parsed preamble for {}: location={}, instant={}, {} columns",
        file,
        meta.location,
        meta.observation_instant,
        meta.headers.len()
    );

    Ok((meta, PREAMBLE_LINES))
}

/// Builder for sounding metadata extraction
struct SoundingMetaBuilder {
    location: Option<String>,
    date: Option<NaiveDate>,
    time: Option<(String, u32)>,
    headers: Option<Vec<String>>,
    units: Option<Vec<String>>,
}

impl SoundingMetaBuilder {
    fn new() -> Self {
        Self {
            location: None,
            date: None,
            time: None,
            headers: None,
            units: None,
        }
    }

    fn parse_line(&mut self, line_num: usize, line: &str, file: &str) -> Result<()> {
        match line_num {
            LOCATION_LINE => {
                self.location = Some(normalize_location(line));
            }
            DATETIME_LINE => {
                let (date, time, hour) = parse_datetime_line(line)
                    .map_err(|reason| SoundingError::malformed(file, line_num + 1, reason))?;
                self.date = Some(date);
                self.time = Some((time, hour));
            }
            HEADER_LINE => {
                let headers: Vec<String> = line.split_whitespace().map(String::from).collect();
                if headers.is_empty() {
                    return Err(SoundingError::malformed(
                        file,
                        line_num + 1,
                        "column header line is empty",
                    ));
                }
                self.headers = Some(headers);
            }
            UNITS_LINE => {
                self.units = Some(line.split_whitespace().map(String::from).collect());
            }
            _ => {} // Blank separator lines
        }

        Ok(())
    }

    fn build(self, file: &str) -> Result<SoundingMeta> {
        let missing = |line: usize, what: &str| {
            SoundingError::malformed(file, line + 1, format!("missing {}", what))
        };

        let location = self.location.ok_or_else(|| missing(LOCATION_LINE, "location"))?;
        let observation_date = self.date.ok_or_else(|| missing(DATETIME_LINE, "date"))?;
        let (observation_time, observation_hour) =
            self.time.ok_or_else(|| missing(DATETIME_LINE, "time"))?;
        let headers = self.headers.ok_or_else(|| missing(HEADER_LINE, "headers"))?;
        let units = self.units.unwrap_or_default();

        let observation_instant = observation_date
            .and_hms_opt(observation_hour, 0, 0)
            .ok_or_else(|| {
                SoundingError::malformed(
                    file,
                    DATETIME_LINE + 1,
                    format!("invalid observation hour {}", observation_hour),
                )
            })?
            .and_utc();

        Ok(SoundingMeta {
            location,
            observation_date,
            observation_time,
            observation_hour,
            observation_instant,
            headers,
            units,
        })
    }
}

/// Trim the title and replace whitespace and `/` with `_`
pub fn normalize_location(line: &str) -> String {
    LOCATION_SEPARATORS
        .replace_all(line.trim(), "_")
        .into_owned()
}

/// Parse "DD-MM-YYYY HHMM" into the date, the raw time token and the hour
fn parse_datetime_line(line: &str) -> std::result::Result<(NaiveDate, String, u32), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(format!(
            "expected 'date time' tokens, found {} token(s) in '{}'",
            tokens.len(),
            line.trim()
        ));
    }

    let date = parse_date(tokens[0])?;
    let hour = parse_hour(tokens[1])?;

    Ok((date, tokens[1].to_string(), hour))
}

/// Parse a day-first date token
fn parse_date(token: &str) -> std::result::Result<NaiveDate, String> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
        .ok_or_else(|| format!("invalid date '{}', expected DD-MM-YYYY", token))
}

/// Hour from the first two characters of an `HHMM` token
fn parse_hour(token: &str) -> std::result::Result<u32, String> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid time '{}', expected HHMM", token));
    }

    let hour: u32 = token[0..2]
        .parse()
        .map_err(|_| format!("invalid hour in time '{}'", token))?;
    if hour > 23 {
        return Err(format!("hour {} out of range in time '{}'", hour, token));
    }

    Ok(hour)
}
