//! avasus CLI - avalanche susceptibility and start-zone pipeline

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use geo_types::{Geometry, MultiPolygon};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use avasus_algorithms::avalanche::{
    discover_tiles, run_start_zones, run_susceptibility, AvalancheConfig, Layout,
    StartZoneReport, SusceptibilityReport,
};
use avasus_core::io::read_geotiff;
use avasus_core::{FsStore, VectorLayer};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "avasus")]
#[command(author, version, about = "Avalanche susceptibility and start-zone polygons", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Store location and settings shared by the pipeline commands
#[derive(Args)]
struct Workspace {
    /// Directory holding inputs and receiving every artifact
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
    /// Prefix below the root for pipeline outputs
    #[arg(short, long, default_value = "")]
    output: String,
    /// JSON file overriding the default configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Build susceptibility and terrain-trap rasters from DEM tiles
    Susceptibility {
        #[command(flatten)]
        workspace: Workspace,
        /// Glob selecting the DEM tiles, relative to the root
        #[arg(short, long, default_value = "dem/*.tif")]
        dems: String,
    },
    /// Carve start-zone polygons from a previous susceptibility run
    StartZones {
        #[command(flatten)]
        workspace: Workspace,
        /// Study-area boundary: a vector layer or a geometry as JSON
        #[arg(short, long)]
        study_area: PathBuf,
    },
    /// Susceptibility followed by start zones
    Run {
        #[command(flatten)]
        workspace: Workspace,
        /// Glob selecting the DEM tiles, relative to the root
        #[arg(short, long, default_value = "dem/*.tif")]
        dems: String,
        /// Study-area boundary: a vector layer or a geometry as JSON
        #[arg(short, long)]
        study_area: PathBuf,
    },
    /// Print the configuration as JSON (defaults merged with --config)
    Config {
        /// JSON file overriding the default configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<AvalancheConfig> {
    let Some(path) = path else {
        return Ok(AvalancheConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    AvalancheConfig::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_study_area(path: &Path) -> Result<MultiPolygon<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read study area {}", path.display()))?;
    let area = match serde_json::from_str::<VectorLayer>(&text) {
        Ok(layer) => layer.to_multipolygon(),
        Err(_) => {
            let geometry: Geometry<f64> = serde_json::from_str(&text)
                .context("Study area is neither a vector layer nor a geometry")?;
            match geometry {
                Geometry::Polygon(p) => MultiPolygon(vec![p]),
                Geometry::MultiPolygon(mp) => mp,
                _ => bail!("Study area must be a polygon or multipolygon"),
            }
        }
    };
    if area.0.is_empty() {
        bail!("Study area {} has no polygon", path.display());
    }
    Ok(area)
}

fn open(workspace: &Workspace) -> Result<(FsStore, Layout, AvalancheConfig)> {
    if !workspace.root.is_dir() {
        bail!("Root {} is not a directory", workspace.root.display());
    }
    let config = load_config(workspace.config.as_deref())?;
    Ok((FsStore::new(&workspace.root), Layout::new(workspace.output.as_str()), config))
}

fn susceptibility(store: &FsStore, layout: &Layout, dems: &str, config: &AvalancheConfig) -> Result<SusceptibilityReport> {
    let tiles = discover_tiles(store, dems).context("Failed to list DEM tiles")?;
    if tiles.is_empty() {
        bail!("No DEM tile matches {}", dems);
    }
    let pb = spinner(&format!("Processing {} tile(s)...", tiles.len()));
    let start = Instant::now();
    let report = run_susceptibility(store, layout, &tiles, config).context("Susceptibility run failed");
    pb.finish_and_clear();
    let report = report?;

    println!("Susceptibility: {} tile(s) in {:.2?}", report.tiles.len(), start.elapsed());
    for output in &report.mosaics {
        println!("  {}", output);
    }
    for note in &report.notes {
        info!(?note, "tile note");
    }
    Ok(report)
}

fn start_zones(store: &FsStore, layout: &Layout, study_area: &Path, config: &AvalancheConfig) -> Result<StartZoneReport> {
    let area = load_study_area(study_area)?;
    let pb = spinner("Carving start zones...");
    let start = Instant::now();
    let report = run_start_zones(store, layout, &area, config).context("Start-zone run failed");
    pb.finish_and_clear();
    let report = report?;

    println!("Start zones: {} polygon(s) in {:.2?}", report.total(), start.elapsed());
    for tile in &report.tiles {
        println!("  tile {}: {} -> {}", tile.tile.index, tile.zones, tile.output);
    }
    Ok(report)
}

/// Print tile failures and turn them into a non-zero exit
fn check_failures<'a>(failures: impl IntoIterator<Item = &'a avasus_algorithms::avalanche::TileError>) -> Result<()> {
    let mut count = 0;
    for e in failures {
        eprintln!("  {}", e);
        count += 1;
    }
    if count > 0 {
        bail!("{} tile(s) failed", count);
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let raster = read_geotiff(&input).with_context(|| format!("Failed to read {}", input.display()))?;
            pb.finish_and_clear();
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if let Some(std) = stats.std_dev {
                println!("  Std dev: {:.4}", std);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        Commands::Susceptibility { workspace, dems } => {
            let (store, layout, config) = open(&workspace)?;
            let report = susceptibility(&store, &layout, &dems, &config)?;
            check_failures(&report.failed)?;
        }

        Commands::StartZones { workspace, study_area } => {
            let (store, layout, config) = open(&workspace)?;
            let report = start_zones(&store, &layout, &study_area, &config)?;
            check_failures(&report.failed)?;
        }

        Commands::Run { workspace, dems, study_area } => {
            let (store, layout, config) = open(&workspace)?;
            let first = susceptibility(&store, &layout, &dems, &config)?;
            let second = start_zones(&store, &layout, &study_area, &config)?;
            check_failures(first.failed.iter().chain(second.failed.iter()))?;
        }

        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
