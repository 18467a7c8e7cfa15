//! Emagramm Library
//!
//! Fetches MeteoSwiss radiosonde soundings and turns them into vertical
//! temperature-gradient profiles with an atmospheric stability class per
//! layer.
//!
//! This library provides tools for:
//! - Parsing the fixed-layout sounding text (preamble plus whitespace table)
//! - Cleaning missing-value sentinels and duplicate rows
//! - Computing layer gradients in °C per 100 m and classifying stability
//! - Resolving each sounding to its station and current/previous slot
//! - Persisting the per-station aggregate as versioned JSON
//! - Rendering gradient plots with stability bands as SVG

pub mod cleaner;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetcher;
pub mod gradient;
pub mod header;
pub mod models;
pub mod parser;
pub mod processor;
pub mod render;
pub mod resolver;
pub mod stability;
pub mod storage;

// Re-export commonly used types
pub use config::{EmagrammConfig, Station};
pub use error::{Result, SoundingError};
pub use fetcher::{FetchRequest, HttpSupplier, RawTextSupplier};
pub use models::{
    Assignment, CycleStats, GradientSample, MeasurementTable, Slot, SoundingResult, StationSlot,
};
pub use processor::{CycleOutcome, SoundingProcessor, process_text};
pub use render::{RenderSink, SvgRenderer};
pub use stability::StabilityBand;
pub use storage::StationStore;
