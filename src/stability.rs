//! Atmospheric stability classification of gradient samples.
//!
//! Each gradient (°C per 100 m) maps to one of five ordered bands, checked
//! from most unstable to most stable with the first match winning:
//!
//! | Band           | Range                 | Colour    |
//! |----------------|-----------------------|-----------|
//! | Unstable       | `x > 0`               | `#ff8000` |
//! | Neutral        | `-0.5 < x <= 0`       | `#f2f2f2` |
//! | SlightlyStable | `-0.6 < x <= -0.5`    | `#66ff99` |
//! | Stable         | `-0.8 < x <= -0.6`    | `#33cc33` |
//! | VeryStable     | `-100 < x <= -0.8`    | `#0099ff` |
//!
//! Gradients at or below -100 are left unclassified.

use crate::constants::thresholds;
use crate::models::GradientSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StabilityBand {
    Unstable,
    Neutral,
    SlightlyStable,
    Stable,
    VeryStable,
}

impl StabilityBand {
    pub const ALL: [StabilityBand; 5] = [
        StabilityBand::Unstable,
        StabilityBand::Neutral,
        StabilityBand::SlightlyStable,
        StabilityBand::Stable,
        StabilityBand::VeryStable,
    ];

    /// Span fill colour used by the plot
    pub fn color(&self) -> &'static str {
        match self {
            StabilityBand::Unstable => "#ff8000",
            StabilityBand::Neutral => "#f2f2f2",
            StabilityBand::SlightlyStable => "#66ff99",
            StabilityBand::Stable => "#33cc33",
            StabilityBand::VeryStable => "#0099ff",
        }
    }
}

/// Classify one gradient value; `None` for `x <= -100` and NaN
pub fn classify(temp_gradient: f64) -> Option<StabilityBand> {
    let x = temp_gradient;
    if x > 0.0 {
        Some(StabilityBand::Unstable)
    } else if thresholds::NEUTRAL_LOWER < x && x <= 0.0 {
        Some(StabilityBand::Neutral)
    } else if thresholds::SLIGHTLY_STABLE_LOWER < x && x <= thresholds::NEUTRAL_LOWER {
        Some(StabilityBand::SlightlyStable)
    } else if thresholds::STABLE_LOWER < x && x <= thresholds::SLIGHTLY_STABLE_LOWER {
        Some(StabilityBand::Stable)
    } else if thresholds::VERY_STABLE_LOWER < x && x <= thresholds::STABLE_LOWER {
        Some(StabilityBand::VeryStable)
    } else {
        None
    }
}

/// Classify every sample, keeping positions aligned with the input
pub fn classify_samples(samples: &[GradientSample]) -> Vec<Option<StabilityBand>> {
    samples.iter().map(|s| classify(s.temp_gradient)).collect()
}

/// Height span marker handed to the rendering sink
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandSpan {
    pub lower: f64,
    pub upper: f64,
    pub color: &'static str,
}

/// Span markers for all classified samples; unclassified ones get none
pub fn band_spans(samples: &[GradientSample], bands: &[Option<StabilityBand>]) -> Vec<BandSpan> {
    samples
        .iter()
        .zip(bands)
        .filter_map(|(sample, band)| {
            band.map(|b| {
                let (lower, upper) = sample.span();
                BandSpan {
                    lower,
                    upper,
                    color: b.color(),
                }
            })
        })
        .collect()
}
