//! Command-line front end for rgbd-annotate.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rgbd_annotate::config::AppConfig;
use rgbd_annotate::format::LoadOutcome;
use rgbd_annotate::model::OffsetVector;
use rgbd_annotate::overlay::{OverlayRequest, render_overlay};
use rgbd_annotate::{AnnotationStore, Dataset, Result};

/// RGB/depth correspondence annotation tools.
#[derive(Debug, Parser)]
#[command(author, version, about = "RGB/depth correspondence annotation")]
struct Cli {
    /// Configuration file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Pair RGB and depth images by file stem and report annotation progress.
    Scan {
        #[arg(long)]
        rgb_dir: PathBuf,
        #[arg(long)]
        depth_dir: PathBuf,
        /// Annotation store. Defaults to the configured store.
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Print the records of an annotation store.
    Summary {
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Blend a depth image over an RGB image with the jet colormap.
    Overlay {
        #[arg(long)]
        rgb: PathBuf,
        #[arg(long)]
        depth: PathBuf,
        /// Horizontal offset. Defaults to the configured offset.
        #[arg(long, allow_hyphen_values = true)]
        dx: Option<i32>,
        /// Vertical offset. Defaults to the configured offset.
        #[arg(long, allow_hyphen_values = true)]
        dy: Option<i32>,
        /// Depth weight in [0, 1]. Defaults to the configured alpha.
        #[arg(long)]
        alpha: Option<f32>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write a configuration file with default values.
    InitConfig {
        /// Destination. Defaults to the platform config directory.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AppConfig::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Scan {
            rgb_dir,
            depth_dir,
            store,
        } => scan(&rgb_dir, &depth_dir, &store_path(store, config)),
        Command::Summary { store } => summary(&store_path(store, config)),
        Command::Overlay {
            rgb,
            depth,
            dx,
            dy,
            alpha,
            output,
        } => {
            let fallback = config.default_offset()?;
            let offset = OffsetVector::new(
                dx.unwrap_or(fallback.dx()),
                dy.unwrap_or(fallback.dy()),
            )?;
            let alpha = alpha.unwrap_or(config.preferences.overlay_alpha);
            overlay(&rgb, &depth, offset, alpha, &output)
        }
        Command::InitConfig { path } => {
            let config = AppConfig::new();
            let written = match path {
                Some(path) => {
                    config.save_to_path(&path)?;
                    path
                }
                None => config.save_to_default_path()?,
            };
            println!("Wrote {}", written.display());
            Ok(())
        }
    }
}

fn store_path(explicit: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    explicit.unwrap_or_else(|| config.preferences.store_path.clone())
}

fn open_store(path: &Path) -> Result<AnnotationStore> {
    let (store, outcome) = AnnotationStore::open(path)?;
    if let LoadOutcome::Recovered(e) = outcome {
        eprintln!("warning: {e}; treating the store as empty");
    }
    Ok(store)
}

fn scan(rgb_dir: &Path, depth_dir: &Path, store_path: &Path) -> Result<()> {
    let build = Dataset::from_folders(rgb_dir, depth_dir)?;
    let store = open_store(store_path)?;

    let mut annotated = 0;
    for pair in build.dataset.pairs() {
        let points = store.get(&pair.identity()).map_or(0, |record| record.len());
        if points > 0 {
            annotated += 1;
        }
        println!(
            "{}\t{}\t{} points",
            pair.rgb.display(),
            pair.depth.display(),
            points
        );
    }
    for skipped in &build.skipped {
        println!("skipped: {skipped}");
    }
    println!(
        "{} pairs, {} annotated, {} skipped",
        build.dataset.len(),
        annotated,
        build.skipped.len()
    );
    Ok(())
}

fn summary(store_path: &Path) -> Result<()> {
    let store = open_store(store_path)?;
    for (key, record) in store.records() {
        println!("{}\t{} points", key, record.len());
    }
    println!("{} annotated pairs in {}", store.len(), store_path.display());
    Ok(())
}

fn overlay(
    rgb: &Path,
    depth: &Path,
    offset: OffsetVector,
    alpha: f32,
    output: &Path,
) -> Result<()> {
    let base = image::open(rgb)?.to_rgb8();
    let secondary = image::open(depth)?.to_rgb8();

    let request = OverlayRequest::new(&base, Some(&secondary), offset, alpha);
    let blended = render_overlay(&request.resolve());
    blended.save(output)?;

    log::info!("Wrote overlay with offset {} to {:?}", offset, output);
    Ok(())
}
