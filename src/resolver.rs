//! Station identity and current/previous slot resolution.

use crate::config::Station;
use crate::constants::SOUNDING_CADENCE_HOURS;
use crate::error::{Result, SoundingError};
use crate::models::Slot;
use crate::parser::RawSounding;
use chrono::{DateTime, Duration, Utc};

/// Where a parsed sounding belongs in the station aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub station_code: String,
    pub station_name: String,
    pub slot: Slot,
}

/// `Current` when the observation is less than 12 hours old, else `Previous`.
///
/// Exactly 12 hours resolves to `Previous`.
pub fn resolve_slot(observation_instant: DateTime<Utc>, now: DateTime<Utc>) -> Slot {
    if now - observation_instant < Duration::hours(SOUNDING_CADENCE_HOURS) {
        Slot::Current
    } else {
        Slot::Previous
    }
}

/// Match a parsed sounding to a configured station and a slot
pub fn resolve(raw: &RawSounding, stations: &[Station], now: DateTime<Utc>) -> Result<Resolution> {
    let code = raw
        .station_code
        .as_deref()
        .ok_or_else(|| SoundingError::UnknownStation {
            file: raw.identifier.clone(),
            reason: "identifier carries no station code".to_string(),
        })?;

    let station = stations
        .iter()
        .find(|s| s.code == code)
        .ok_or_else(|| SoundingError::UnknownStation {
            file: raw.identifier.clone(),
            reason: format!("station {} is not configured", code),
        })?;

    Ok(Resolution {
        station_code: station.code.clone(),
        station_name: station.name.clone(),
        slot: resolve_slot(raw.meta.observation_instant, now),
    })
}
