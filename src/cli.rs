//! Command-line interface components.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::config::EmagrammConfig;

#[derive(Parser, Debug)]
#[command(name = "emagramm")]
#[command(about = "Fetch radiosonde soundings, classify temperature gradients and plot stability bands")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// TOML configuration file (built-in MeteoSwiss defaults if omitted)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reprocess saved raw files matching this glob instead of fetching
    #[arg(long, value_name = "GLOB")]
    pub raw_files: Option<String>,

    /// Skip rendering plots
    #[arg(long)]
    pub no_render: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Load the configuration file, or the defaults, and apply CLI overrides
    pub fn load_config(&self) -> Result<EmagrammConfig> {
        let config = match &self.config {
            Some(path) => EmagrammConfig::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => EmagrammConfig::default(),
        };

        Ok(if self.no_render {
            config.without_rendering()
        } else {
            config
        })
    }
}

/// Set up stderr logging; `RUST_LOG` overrides the level from `--verbose`
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("emagramm={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Expand a raw-file glob into a sorted list of files
pub fn collect_raw_files(pattern: &str) -> Result<Vec<PathBuf>> {
    debug!("Searching for raw files with pattern: {}", pattern);

    let mut files: Vec<PathBuf> = glob::glob(pattern)
        .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No raw files match {}", pattern);
    }

    Ok(files)
}
