//! Avalanche susceptibility and start-zone pipeline
//!
//! Per DEM tile:
//!
//! 1. slope, aspect and VRM ([`crate::terrain`])
//! 2. reclassification of each into ordinal weights ([`ReclassTables`])
//! 3. TPI ridge and gully masks, ridge polygons, ridge-distance raster ([`ridges`])
//! 4. weighted fusion into start and connected susceptibility ([`fusion`])
//!
//! then mosaics across tiles, and later the start-zone carving of
//! [`start_zones`] against a study-area boundary. Every artifact name comes
//! from a [`Layout`] and a [`TileId`].

pub mod config;
pub mod error;
pub mod fusion;
pub mod layout;
pub mod pipeline;
pub mod ridges;
pub mod start_zones;

pub use config::{AvalancheConfig, DegenerateTpi, FusionWeights, ReclassTables, RidgeWeights};
pub use error::{Stage, TileError};
pub use fusion::{fuse, FusionInputs, Susceptibility};
pub use layout::{discover_tiles, Layout, TileId};
pub use pipeline::{
    read_manifest, run_start_zones, run_susceptibility, StartZoneReport, StartZoneTile,
    SusceptibilityReport, TileArtifacts, TileNote,
};
pub use ridges::{extract_ridges, ridge_masks, RidgeMasks, RidgeProducts, TpiStats, WEIGHT_FIELD};
pub use start_zones::{start_zones, susceptible_area, StartZones, AREA_FIELD, TILE_FIELD};
