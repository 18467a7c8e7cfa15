//! Sounding text parser.
//!
//! Turns one raw sounding file into metadata plus an uncleaned
//! `MeasurementTable`. Any structural problem fails the whole file; no
//! partial table is ever returned.

use crate::constants::STATION_CODE_PATTERN;
use crate::error::{Result, SoundingError};
use crate::header::parse_preamble;
use crate::models::{MeasurementTable, SoundingMeta};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static STATION_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(STATION_CODE_PATTERN).expect("valid station code regex"));

/// Output of the parse stage, before cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct RawSounding {
    /// Path or URL the text came from
    pub identifier: String,
    /// Station code recovered from the identifier, if it carries one
    pub station_code: Option<String>,
    pub meta: SoundingMeta,
    pub table: MeasurementTable,
}

/// Parse the full text of a sounding file
pub fn parse_sounding(text: &str, identifier: &str) -> Result<RawSounding> {
    let lines: Vec<&str> = text.lines().collect();
    let (meta, data_start) = parse_preamble(&lines, identifier)?;

    let width = meta.headers.len();
    let mut rows = Vec::with_capacity(lines.len().saturating_sub(data_start));

    for (offset, line) in lines[data_start..].iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_number = data_start + offset + 1;
        rows.push(parse_row(line, width, identifier, line_number)?);
    }

    debug!("Parsed {} data rows from {}", rows.len(), identifier);

    let table = MeasurementTable::new(meta.headers.clone(), rows);
    Ok(RawSounding {
        identifier: identifier.to_string(),
        station_code: extract_station_code(identifier),
        meta,
        table,
    })
}

/// Find the first `VSSTnn` token in a path or URL
pub fn extract_station_code(identifier: &str) -> Option<String> {
    STATION_CODE
        .find(identifier)
        .map(|m| m.as_str().to_string())
}

fn parse_row(line: &str, width: usize, file: &str, line_number: usize) -> Result<Vec<f64>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != width {
        return Err(SoundingError::malformed(
            file,
            line_number,
            format!("expected {} columns, found {}", width, tokens.len()),
        ));
    }

    tokens
        .iter()
        .map(|token| match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(SoundingError::malformed(
                file,
                line_number,
                format!("non-numeric value '{}'", token),
            )),
        })
        .collect()
}
