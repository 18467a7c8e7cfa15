//! Sounding processing pipeline and fetch cycle.
//!
//! A single sounding flows through parse → clean → gradient → classify,
//! each stage returning a new value. A cycle runs that pipeline for every
//! configured station and slot, aggregates the results per station,
//! renders them and persists the aggregate. A failing file is logged and
//! recorded; it never stops the rest of the cycle.

#[cfg(test)]
pub mod tests;

use crate::cleaner::clean;
use crate::config::EmagrammConfig;
use crate::error::{Result, SoundingError};
use crate::fetcher::{FetchRequest, RawTextSupplier, save_raw};
use crate::gradient::compute_gradient;
use crate::models::{Assignment, CycleStats, Slot, SoundingResult, StationSlot};
use crate::parser::{RawSounding, parse_sounding};
use crate::render::{RenderRequest, RenderSink, image_file_name};
use crate::resolver::{resolve, resolve_slot};
use crate::stability::classify_samples;
use crate::storage::StationStore;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Run the full pipeline on one sounding text.
///
/// The station code comes from `identifier`; the slot is resolved against
/// `now`.
pub fn process_text(text: &str, identifier: &str, now: DateTime<Utc>) -> Result<SoundingResult> {
    let raw = parse_sounding(text, identifier)?;
    let station_code = raw
        .station_code
        .clone()
        .ok_or_else(|| SoundingError::UnknownStation {
            file: identifier.to_string(),
            reason: "identifier carries no station code".to_string(),
        })?;
    let slot = resolve_slot(raw.meta.observation_instant, now);

    analyse(raw, station_code, slot)
}

/// Clean, differentiate and classify a parsed sounding
pub fn analyse(raw: RawSounding, station_code: String, slot: Slot) -> Result<SoundingResult> {
    let table = clean(&raw.table);
    if table.len() < raw.table.len() {
        debug!(
            "{}: {} of {} rows kept after cleaning",
            raw.identifier,
            table.len(),
            raw.table.len()
        );
    }

    let gradient = compute_gradient(&table)?;
    let bands = classify_samples(&gradient);

    Ok(SoundingResult {
        station_code,
        slot,
        meta: raw.meta,
        table,
        gradient,
        bands,
    })
}

/// Station aggregate and statistics produced by one cycle
#[derive(Debug)]
pub struct CycleOutcome {
    pub stations: Vec<StationSlot>,
    pub stats: CycleStats,
}

/// Drives fetch, processing, rendering and persistence for all stations
#[derive(Debug)]
pub struct SoundingProcessor<R> {
    config: EmagrammConfig,
    renderer: R,
    store: StationStore,
    show_progress: bool,
}

impl<R: RenderSink> SoundingProcessor<R> {
    pub fn new(config: EmagrammConfig, renderer: R) -> Self {
        let store = StationStore::new(config.storage_file.clone());
        Self {
            config,
            renderer,
            store,
            show_progress: false,
        }
    }

    /// Show a progress bar while fetching
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &EmagrammConfig {
        &self.config
    }

    /// Fetch the current and previous sounding of every station and process them
    pub async fn run_fetch_cycle<S: RawTextSupplier>(
        &self,
        supplier: &S,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome> {
        let start_time = Instant::now();
        let mut stations = self.empty_slots();
        let mut stats = CycleStats::default();

        let requests: Vec<FetchRequest> = Slot::ALL
            .iter()
            .flat_map(|slot| {
                self.config
                    .stations
                    .iter()
                    .map(move |station| FetchRequest::new(&self.config.base_url, station, *slot, now))
            })
            .collect();

        info!(
            "Fetching {} soundings for {} stations",
            requests.len(),
            self.config.stations.len()
        );

        let pb = self.progress_bar(requests.len() as u64);
        for request in &requests {
            pb.set_message(format!("{} ({})", request.station.name, request.slot));

            let text = match supplier.fetch(request).await {
                Ok(text) => text,
                Err(e) => {
                    error!("{:#}", e);
                    stats.record_failure(&request.url, e.to_string());
                    pb.inc(1);
                    continue;
                }
            };
            stats.files_fetched += 1;

            let identifier = match save_raw(&self.config.raw_dir, &request.file_name, &text).await {
                Ok(path) => path.display().to_string(),
                Err(e) => {
                    warn!("Could not save raw file {}: {}", request.file_name, e);
                    request.file_name.clone()
                }
            };

            self.ingest(&mut stations, &mut stats, &text, &identifier, now);
            pb.inc(1);
        }
        pb.finish_with_message("All soundings fetched");

        self.finish(stations, stats, start_time, now)
    }

    /// Reprocess raw files saved by earlier cycles
    pub async fn run_offline(&self, files: &[PathBuf], now: DateTime<Utc>) -> Result<CycleOutcome> {
        let start_time = Instant::now();
        let mut stations = self.empty_slots();
        let mut stats = CycleStats::default();

        info!("Reprocessing {} raw files", files.len());

        for path in files {
            let identifier = path.display().to_string();
            match fs::read_to_string(path).await {
                Ok(text) => self.ingest(&mut stations, &mut stats, &text, &identifier, now),
                Err(e) => {
                    error!("Failed to read {}: {}", identifier, e);
                    stats.record_failure(identifier, e.to_string());
                }
            }
        }

        self.finish(stations, stats, start_time, now)
    }

    fn empty_slots(&self) -> Vec<StationSlot> {
        self.config
            .stations
            .iter()
            .map(|s| StationSlot::new(s.code.clone(), s.name.clone()))
            .collect()
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    /// Process one sounding text into its station slot, recording any failure
    fn ingest(
        &self,
        stations: &mut [StationSlot],
        stats: &mut CycleStats,
        text: &str,
        identifier: &str,
        now: DateTime<Utc>,
    ) {
        let outcome = parse_sounding(text, identifier).and_then(|raw| {
            let resolution = resolve(&raw, &self.config.stations, now)?;
            analyse(raw, resolution.station_code, resolution.slot)
        });

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to process {}: {:#}", identifier, e);
                stats.record_failure(identifier, e.to_string());
                return;
            }
        };

        stats.files_processed += 1;
        debug!(
            "{} resolved to {} ({}), {} gradient samples",
            identifier,
            result.station_code,
            result.slot,
            result.gradient.len()
        );

        let slot = result.slot;
        let Some(station) = stations
            .iter_mut()
            .find(|s| s.station_code == result.station_code)
        else {
            return;
        };

        match station.assign(result) {
            Assignment::Filled => {}
            Assignment::Duplicate => debug!(
                "{} ({}): same observation already held, ignoring {}",
                station.station_code, slot, identifier
            ),
            Assignment::Replaced(older) => warn!(
                "{} ({}): replaced observation from {} with a newer one",
                station.station_code, slot, older.meta.observation_instant
            ),
            Assignment::Rejected(older) => warn!(
                "{} ({}): keeping the newer sounding, discarded observation from {}",
                station.station_code, slot, older.meta.observation_instant
            ),
        }
    }

    fn finish(
        &self,
        stations: Vec<StationSlot>,
        mut stats: CycleStats,
        start_time: Instant,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome> {
        if self.config.render {
            self.render_all(&stations, &mut stats);
        }

        self.store.save(&stations, now)?;
        stats.storage_path = Some(self.store.path().to_path_buf());
        stats.processing_time_ms = start_time.elapsed().as_millis();

        info!(
            "Cycle complete: {} processed, {} failed, {} images ({} failed)",
            stats.files_processed, stats.files_failed, stats.images_rendered, stats.images_failed
        );

        Ok(CycleOutcome { stations, stats })
    }

    fn render_all(&self, stations: &[StationSlot], stats: &mut CycleStats) {
        for station in stations {
            for slot in Slot::ALL {
                let Some(result) = station.get(slot) else {
                    continue;
                };

                let date = result.meta.date_label();
                let request = RenderRequest::from_result(result, &station.station_name, &date);
                match self.renderer.render(&request) {
                    Ok(_) => stats.images_rendered += 1,
                    Err(e) => {
                        error!("{:#}", e);
                        stats.record_render_failure(
                            image_file_name(&station.station_code, slot),
                            e.to_string(),
                        );
                    }
                }
            }
        }
    }
}
