// src/main.rs
//! OSM Buildings - load building footprints for map tiles

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use osm_buildings::{
    builder::json::JsonExporter,
    map::{
        tile_math::{latitude_to_fractional_y, longitude_to_fractional_x},
        to_mercator, tile_size, tile_size_at_equator, GeoBoundary, HttpTransport, TileCache, TileLoader,
    },
    BuildingLayer, LayerConfig, LayerSettings,
};
use std::path::PathBuf;

/// A radius of 2 is already 25 Overpass queries
const MAX_RADIUS: u32 = 2;

#[derive(Parser)]
#[command(name = "osm-buildings", version, about = "Load OSM building footprints for map tiles")]
struct Cli {
    /// Cache directory, overriding the configured one
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the tile containing a point, and optionally its neighbours
    Load {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
        zoom: Option<u8>,
        /// Also load tiles within this many tiles of the center one
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=MAX_RADIUS as i64))]
        radius: u32,
        /// Write the footprints as a JSON FeatureCollection
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the tile containing a point
    Tile {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
        zoom: Option<u8>,
    },
    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show or write the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    Stats,
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    /// Write the current configuration (defaults if none) to disk
    Init,
}

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let config = LayerConfig::load().context("Failed to load configuration")?;

    let cache_dir = match cli.cache_dir {
        Some(dir) => dir,
        None => config.cache_dir()?,
    };

    match cli.command {
        Command::Load {
            lat,
            lon,
            zoom,
            radius,
            output,
        } => load(&config, cache_dir, lat, lon, zoom, radius, output).await,
        Command::Tile { lat, lon, zoom } => {
            show_tile(zoom.unwrap_or(config.zoom), lat, lon);
            Ok(())
        }
        Command::Cache { action } => {
            let cache = TileCache::new(cache_dir).context("Failed to open cache")?;
            match action {
                CacheAction::Stats => {
                    let stats = cache.stats()?;
                    println!("Cache:   {}", cache.dir().display());
                    println!("Entries: {}", stats.entries);
                    println!("Size:    {:.2} MB", stats.size_mb());
                    if let Some(newest) = stats.newest {
                        println!("Newest:  {}", newest.to_rfc3339());
                    }
                }
                CacheAction::Clear => {
                    let removed = cache.clear()?;
                    println!("Removed {} cached responses from {}", removed, cache.dir().display());
                }
            }
            Ok(())
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Show => println!("{}", serde_json::to_string_pretty(&config)?),
                ConfigAction::Init => {
                    let path = config.save().context("Failed to save configuration")?;
                    println!("Configuration written to {}", path.display());
                }
            }
            Ok(())
        }
    }
}

async fn load(
    config: &LayerConfig,
    cache_dir: PathBuf,
    lat: f64,
    lon: f64,
    zoom: Option<u8>,
    radius: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    let settings = LayerSettings {
        zoom: zoom.unwrap_or(config.zoom),
        url: config.url_template.clone(),
        params: config.params.clone(),
        origin: to_mercator(lat, lon),
    };

    let transport = HttpTransport::new(config.timeout(), config.user_agent.as_deref())?;
    let cache = TileCache::new(cache_dir).context("Failed to open cache")?;
    let layer = BuildingLayer::new(settings, TileLoader::new(cache, transport), JsonExporter::new());

    let mut failures = 0;
    for (tile, result) in layer.ingest_area(lat, lon, radius).await {
        match result {
            Ok(report) => {
                println!(
                    "{:<18} {:>5} buildings  {:?}{}",
                    tile.to_string(),
                    report.built.len(),
                    report.origin,
                    if report.unresolved.is_empty() {
                        String::new()
                    } else {
                        format!("  ({} unresolved relation members)", report.unresolved.len())
                    }
                );
            }
            Err(e) => {
                failures += 1;
                eprintln!("{:<18} failed: {}", tile.to_string(), e);
            }
        }
    }

    println!("{} ways, {} relations in layer", layer.ways().len(), layer.relations().len());

    let exporter = layer.into_builder();
    if let Some(path) = output {
        exporter
            .export_to_file(&path)
            .with_context(|| format!("Failed to export buildings to {}", path.display()))?;
        println!("Exported {} buildings to {}", exporter.building_count(), path.display());
    }

    if failures > 0 {
        anyhow::bail!("{} tile(s) failed to load", failures);
    }
    Ok(())
}

fn show_tile(zoom: u8, lat: f64, lon: f64) {
    let tile = osm_buildings::map::geo_to_tile(zoom, lat, lon);
    let boundary = GeoBoundary::of_tile(tile);

    println!("Tile:       {}", tile);
    println!(
        "Offset:     {:.4}, {:.4}",
        longitude_to_fractional_x(zoom, lon),
        latitude_to_fractional_y(zoom, lat)
    );
    println!("North-west: {:.7}, {:.7}", boundary.start_lat, boundary.start_lon);
    println!("South-east: {:.7}, {:.7}", boundary.end_lat, boundary.end_lon);
    println!("Size:       {:.1} m ({:.1} m at the equator)", tile_size(zoom, lat), tile_size_at_equator(zoom));
}
