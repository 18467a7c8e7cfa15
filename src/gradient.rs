//! Temperature gradient over height.
//!
//! Midpoint finite differences between adjacent rows of a cleaned table,
//! expressed in °C per 100 m.

use crate::constants::{GRADIENT_REFERENCE_METRES, ZERO_HEIGHT_DELTA_SUBSTITUTE, columns};
use crate::error::{Result, SoundingError};
use crate::models::{GradientSample, MeasurementTable};
use tracing::{debug, warn};

/// Compute one `GradientSample` per adjacent row pair.
///
/// Requires at least two rows and the `Height` and `Temp` columns. The
/// result has `table.len() - 1` samples in row order.
pub fn compute_gradient(table: &MeasurementTable) -> Result<Vec<GradientSample>> {
    let heights = table.column(columns::HEIGHT).ok_or_else(|| {
        SoundingError::insufficient(format!("missing '{}' column", columns::HEIGHT))
    })?;
    let temps = table.column(columns::TEMP).ok_or_else(|| {
        SoundingError::insufficient(format!("missing '{}' column", columns::TEMP))
    })?;

    if table.len() < 2 {
        return Err(SoundingError::insufficient(format!(
            "need at least 2 rows, found {}",
            table.len()
        )));
    }

    let samples: Vec<GradientSample> = heights
        .windows(2)
        .zip(temps.windows(2))
        .map(|(h, t)| gradient_sample(h[0], h[1], t[0], t[1]))
        .collect();

    debug!("Computed {} gradient samples", samples.len());
    Ok(samples)
}

fn gradient_sample(h0: f64, h1: f64, t0: f64, t1: f64) -> GradientSample {
    let mut height_delta = h1 - h0;
    if height_delta == 0.0 {
        height_delta = ZERO_HEIGHT_DELTA_SUBSTITUTE;
    } else if height_delta < 0.0 {
        warn!("Height decreases between {} m and {} m", h0, h1);
    }

    GradientSample {
        height_mid: (h0 + h1) / 2.0,
        height_delta,
        temp_mid: (t0 + t1) / 2.0,
        temp_gradient: (t1 - t0) / height_delta * GRADIENT_REFERENCE_METRES,
    }
}
