//! # avasus algorithms
//!
//! Raster and vector algorithms behind the avalanche susceptibility toolkit.
//!
//! ## Available Algorithm Categories
//!
//! - **terrain**: Slope, aspect, vector ruggedness (VRM), topographic position (TPI)
//! - **statistics**: Focal mean/sum/count over square and circular windows
//! - **algebra**: Reclassification tables, band math, weighted sums
//! - **vector**: Buffer, overlay, polygonize, max-area rasterize, fishnet
//! - **avalanche**: Per-tile susceptibility pipeline and start-zone carving

pub mod algebra;
pub mod avalanche;
mod maybe_rayon;
pub mod statistics;
pub mod terrain;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::terrain::{
        aspect, slope, tpi, vrm, vrm_from_dem, Aspect, Slope, SlopeParams, Tpi, TpiParams,
        Vrm, VrmParams, FLAT_ASPECT,
    };
    pub use crate::statistics::{focal_statistics, FocalParams, FocalStatistic};
    pub use crate::algebra::{
        band_math, reclassify, weighted_sum, ReclassEntry, ReclassifyParams,
    };
    pub use crate::vector::{
        buffer_point, buffer_polygons, dissolve, erase, explode, fishnet, outside_buffer,
        polygonize, rasterize_max_area, BoundingBox, BufferParams, RasterizeParams,
    };
    pub use crate::avalanche::{
        discover_tiles, run_start_zones, run_susceptibility, AvalancheConfig, Layout, TileId,
    };
    pub use avasus_core::prelude::*;
}
