//! Tile-by-tile orchestration over a [`Store`]
//!
//! [`run_susceptibility`] derives, reclassifies and fuses every DEM tile,
//! writes a manifest of per-tile records and mosaics the final rasters.
//! [`run_start_zones`] reads that manifest back and carves start zones per
//! tile. A failing tile is recorded and skipped; its siblings go on.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use avasus_core::raster::Raster;
use avasus_core::{Error, PixelType, Result, Store};

use crate::algebra::reclassify;
use crate::terrain::{aspect, slope, vrm, SlopeParams, VrmParams};

use super::config::AvalancheConfig;
use super::error::{Stage, TileError};
use super::fusion::{fuse, FusionInputs};
use super::layout::{Layout, TileId};
use super::ridges::extract_ridges;
use super::start_zones::{fishnet_layers, start_zones, zone_layer};

/// Store names of everything one tile produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileArtifacts {
    pub tile: TileId,
    pub slope: String,
    pub aspect: String,
    pub vrm: String,
    pub tpi: String,
    pub ridges: String,
    pub poly_ridges: String,
    pub slope_reclass: String,
    pub connected_reclass: String,
    pub aspect_reclass: String,
    pub vrm_reclass: String,
    pub ridge_distance: String,
    pub start_susceptibility: String,
    pub connect_susceptibility: String,
    pub gullies: String,
    pub steep_falls: String,
}

impl TileArtifacts {
    pub fn new(layout: &Layout, tile: TileId) -> Self {
        Self {
            slope: layout.slope(&tile),
            aspect: layout.aspect(&tile),
            vrm: layout.vrm(&tile),
            tpi: layout.tpi(&tile),
            ridges: layout.ridges(&tile),
            poly_ridges: layout.poly_ridges(&tile),
            slope_reclass: layout.slope_reclass(&tile),
            connected_reclass: layout.connected_reclass(&tile),
            aspect_reclass: layout.aspect_reclass(&tile),
            vrm_reclass: layout.vrm_reclass(&tile),
            ridge_distance: layout.dist_to_ridges(&tile),
            start_susceptibility: layout.start_split(&tile),
            connect_susceptibility: layout.connect_split(&tile),
            gullies: layout.gullies_split(&tile),
            steep_falls: layout.steep_falls_split(&tile),
            tile,
        }
    }
}

/// Conditions worth reporting that do not fail a tile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileNote {
    /// TPI standard deviation was zero (or the TPI had no valid cell)
    DegenerateTpi { tile: usize, std_dev: f64 },
    /// No ridge region was found
    EmptyRidges { tile: usize },
}

/// Outcome of a susceptibility run
#[derive(Debug, Default)]
pub struct SusceptibilityReport {
    pub tiles: Vec<TileArtifacts>,
    pub failed: Vec<TileError>,
    pub notes: Vec<TileNote>,
    /// Mosaics written
    pub mosaics: Vec<String>,
    /// Tiles absent from the mosaics
    pub missing: Vec<usize>,
}

impl SusceptibilityReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run terrain, reclassification, ridges and fusion over every tile, then
/// write the manifest and the mosaics.
///
/// Only failures outside a single tile (invalid config, manifest or mosaic
/// writes) end the run with an error.
pub fn run_susceptibility(
    store: &dyn Store,
    layout: &Layout,
    tiles: &[TileId],
    config: &AvalancheConfig,
) -> Result<SusceptibilityReport> {
    config.validate()?;
    info!(tiles = tiles.len(), "susceptibility run");

    let mut report = SusceptibilityReport::default();
    for tile in tiles {
        match susceptibility_tile(store, layout, tile, config) {
            Ok((artifacts, notes)) => {
                report.tiles.push(artifacts);
                report.notes.extend(notes);
            }
            Err(e) => {
                warn!(tile = tile.index, stage = %e.stage, error = %e.source, "tile failed");
                report.missing.push(tile.index);
                report.failed.push(e);
            }
        }
    }

    let manifest = serde_json::to_value(&report.tiles).map_err(|e| Error::store(layout.manifest(), e))?;
    store.write_json(&layout.manifest(), &manifest)?;

    if !report.missing.is_empty() {
        warn!(missing = ?report.missing, "mosaics have gaps for failed tiles");
    }
    let pick = |f: fn(&TileArtifacts) -> &String| report.tiles.iter().map(|a| f(a).clone()).collect::<Vec<_>>();
    let mosaics = [
        (layout.full_start(), PixelType::Float32, pick(|a| &a.start_susceptibility)),
        (layout.full_connect(), PixelType::Float32, pick(|a| &a.connect_susceptibility)),
        (layout.full_gullies(), PixelType::UInt8, pick(|a| &a.gullies)),
        (layout.full_steep_falls(), PixelType::UInt8, pick(|a| &a.steep_falls)),
    ];
    for (output, pixel, inputs) in mosaics {
        if inputs.is_empty() {
            warn!(output = %output, "no tile to mosaic");
            continue;
        }
        let merged = store.mosaic(&inputs, &output, pixel)?;
        info!(output = %output, rows = merged.rows(), cols = merged.cols(), "mosaic written");
        report.mosaics.push(output);
    }

    Ok(report)
}

fn susceptibility_tile(
    store: &dyn Store,
    layout: &Layout,
    tile: &TileId,
    config: &AvalancheConfig,
) -> std::result::Result<(TileArtifacts, Vec<TileNote>), TileError> {
    let at = |stage| TileError::at(tile.index, stage);
    let put = |name: &str, raster: &Raster<f64>, pixel: PixelType| {
        store.write_raster(name, raster, pixel).map_err(at(Stage::Store))
    };
    let artifacts = TileArtifacts::new(layout, tile.clone());
    let mut notes = Vec::new();

    info!(tile = tile.index, source = %tile.source, "processing tile");
    let dem = store.read_raster(&tile.source).map_err(at(Stage::Store))?.with_nan_nodata();
    debug!(tile = tile.index, rows = dem.rows(), cols = dem.cols(), cell = dem.cell_size(), "DEM loaded");

    let slope = slope(&dem, SlopeParams::default()).map_err(at(Stage::Terrain))?;
    let aspect = aspect(&dem).map_err(at(Stage::Terrain))?;
    let vrm = vrm(&slope, &aspect, VrmParams { window: config.vrm_window }).map_err(at(Stage::Terrain))?;
    put(&artifacts.slope, &slope, PixelType::Float32)?;
    put(&artifacts.aspect, &aspect, PixelType::Float32)?;
    put(&artifacts.vrm, &vrm, PixelType::Float32)?;

    let tables = &config.tables;
    let classify = |raster: &Raster<f64>, table| reclassify(raster, table).map_err(at(Stage::Reclassify));
    let slope_start = classify(&slope, &tables.slope_start)?;
    let slope_connected = classify(&slope, &tables.slope_connected)?;
    let steep_falls = classify(&slope, &tables.steep_falls)?;
    let aspect_class = classify(&aspect, &tables.aspect)?;
    let vrm_class = classify(&vrm, &tables.vrm)?;
    put(&artifacts.slope_reclass, &slope_start, PixelType::Float32)?;
    put(&artifacts.connected_reclass, &slope_connected, PixelType::Float32)?;
    put(&artifacts.aspect_reclass, &aspect_class, PixelType::Float32)?;
    put(&artifacts.vrm_reclass, &vrm_class, PixelType::Float32)?;
    put(&artifacts.steep_falls, &steep_falls, PixelType::UInt8)?;

    let ridges = extract_ridges(&dem, config).map_err(at(Stage::Ridges))?;
    if ridges.masks.degenerate {
        notes.push(TileNote::DegenerateTpi {
            tile: tile.index,
            std_dev: ridges.masks.stats.std_dev,
        });
    }
    if ridges.ridges.is_empty() {
        warn!(tile = tile.index, "no ridge found");
        notes.push(TileNote::EmptyRidges { tile: tile.index });
    }
    put(&artifacts.tpi, &ridges.tpi, PixelType::Float32)?;
    put(&artifacts.ridges, &ridges.masks.ridges, PixelType::UInt8)?;
    put(&artifacts.gullies, &ridges.masks.gullies, PixelType::UInt8)?;
    put(&artifacts.ridge_distance, &ridges.distance, PixelType::Float32)?;
    let vectors = [
        (artifacts.poly_ridges.clone(), &ridges.ridges),
        (layout.inner_ring(tile), &ridges.inner_ring),
        (layout.outer_ring(tile), &ridges.outer_ring),
    ];
    for (name, layer) in vectors {
        store.write_vector(&name, layer).map_err(at(Stage::Store))?;
    }
    store
        .write_vector(&layout.ridge_distance_vector(tile), &ridges.merged())
        .map_err(at(Stage::Store))?;

    let fused = fuse(
        FusionInputs {
            slope_start: &slope_start,
            slope_connected: &slope_connected,
            aspect: &aspect_class,
            vrm: &vrm_class,
            ridge_distance: &ridges.distance,
        },
        &config.fusion,
    )
    .map_err(at(Stage::Fusion))?;
    put(&artifacts.start_susceptibility, &fused.start, PixelType::Float32)?;
    put(&artifacts.connect_susceptibility, &fused.connected, PixelType::Float32)?;

    Ok((artifacts, notes))
}

/// Start zones written for one tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartZoneTile {
    pub tile: TileId,
    pub zones: usize,
    pub output: String,
}

/// Outcome of a start-zone run
#[derive(Debug, Default)]
pub struct StartZoneReport {
    pub tiles: Vec<StartZoneTile>,
    pub failed: Vec<TileError>,
}

impl StartZoneReport {
    /// Start zones over all tiles
    pub fn total(&self) -> usize {
        self.tiles.iter().map(|t| t.zones).sum()
    }
}

/// Tile records of the last susceptibility run
pub fn read_manifest(store: &dyn Store, layout: &Layout) -> Result<Vec<TileArtifacts>> {
    let name = layout.manifest();
    serde_json::from_value(store.read_json(&name)?).map_err(|e| Error::store(name, e))
}

/// Carve start zones for every tile of the manifest.
pub fn run_start_zones(
    store: &dyn Store,
    layout: &Layout,
    study_area: &MultiPolygon<f64>,
    config: &AvalancheConfig,
) -> Result<StartZoneReport> {
    config.validate()?;
    if study_area.0.is_empty() {
        return Err(Error::InvalidParameter {
            name: "study_area",
            value: "empty".into(),
            reason: "start zones need a study-area polygon".into(),
        });
    }
    let tiles = read_manifest(store, layout)?;
    info!(tiles = tiles.len(), radius = config.start_radius, "start-zone run");

    let mut report = StartZoneReport::default();
    for artifacts in &tiles {
        match start_zone_tile(store, layout, artifacts, study_area, config) {
            Ok(done) => {
                info!(tile = done.tile.index, zones = done.zones, "start zones written");
                report.tiles.push(done);
            }
            Err(e) => {
                warn!(tile = e.tile, stage = %e.stage, error = %e.source, "tile failed");
                report.failed.push(e);
            }
        }
    }
    Ok(report)
}

fn start_zone_tile(
    store: &dyn Store,
    layout: &Layout,
    artifacts: &TileArtifacts,
    study_area: &MultiPolygon<f64>,
    config: &AvalancheConfig,
) -> std::result::Result<StartZoneTile, TileError> {
    let tile = &artifacts.tile;
    let at = |stage| TileError::at(tile.index, stage);
    let radius = config.start_radius;

    let susceptibility = store
        .read_raster(&artifacts.start_susceptibility)
        .map_err(at(Stage::Store))?;
    let ridges = store.read_vector(&artifacts.poly_ridges).map_err(at(Stage::Store))?;
    let carved = start_zones(&susceptibility, &ridges.polygons(), study_area, config)
        .map_err(at(Stage::StartZones))?;

    let crs = susceptibility.crs().cloned();
    let (cells, labels) = fishnet_layers(&carved.fishnet, crs.clone());
    store.write_vector(&layout.fishnet(radius, tile), &cells).map_err(at(Stage::Store))?;
    store
        .write_vector(&layout.fishnet_labels(radius, tile), &labels)
        .map_err(at(Stage::Store))?;

    let output = layout.start_zones(radius, tile);
    store
        .write_vector(&output, &zone_layer(tile.index, &carved.zones, crs))
        .map_err(at(Stage::Store))?;

    Ok(StartZoneTile {
        tile: tile.clone(),
        zones: carved.zones.len(),
        output,
    })
}
