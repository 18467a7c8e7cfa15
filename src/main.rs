use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::*;
use emagramm::cli::{self, Args};
use emagramm::{CycleStats, HttpSupplier, SoundingProcessor, SvgRenderer};
use std::process;

fn main() {
    let args = Args::parse();
    cli::setup_logging(&args);

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to install CTRL+C signal handler")?;
                eprintln!("\nReceived CTRL+C, shutting down...");
                anyhow::bail!("Processing interrupted by user")
            }
        }
    });

    match result {
        Ok(stats) => {
            print_summary(&stats);
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<CycleStats> {
    let config = args.load_config()?;
    let now = Utc::now();

    println!(
        "{} {} stations at {}",
        "Processing soundings for".bright_green().bold(),
        config.stations.len().to_string().bright_white().bold(),
        now.format("%Y-%m-%d %H:%M UTC")
    );

    let renderer = SvgRenderer::new(&config.image_dir);
    let processor = SoundingProcessor::new(config, renderer).with_progress(!args.verbose);

    let outcome = match &args.raw_files {
        Some(pattern) => {
            let files = cli::collect_raw_files(pattern)?;
            processor.run_offline(&files, now).await?
        }
        None => {
            let supplier = HttpSupplier::new(processor.config().fetch_timeout())?;
            processor.run_fetch_cycle(&supplier, now).await?
        }
    };

    Ok(outcome.stats)
}

fn print_summary(stats: &CycleStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files fetched:".bright_cyan(),
        stats.files_fetched.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
        for failure in &stats.failures {
            println!("    {} {}", failure.identifier.bright_red(), failure.reason);
        }
    }
    println!(
        "  {} {}",
        "Images rendered:".bright_cyan(),
        stats.images_rendered.to_string().bright_white().bold()
    );
    if stats.images_failed > 0 {
        println!(
            "  {} {}",
            "Images failed:".bright_red(),
            stats.images_failed.to_string().bright_red().bold()
        );
        for failure in &stats.render_failures {
            println!("    {} {}", failure.identifier.bright_red(), failure.reason);
        }
    }
    if let Some(path) = &stats.storage_path {
        println!(
            "  {} {}",
            "Stored to:".bright_cyan(),
            path.display().to_string().bright_white()
        );
    }
}
