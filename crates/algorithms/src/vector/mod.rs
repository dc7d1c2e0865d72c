//! Vector analysis algorithms
//!
//! - Buffer: point circles, outward polygon buffers and outside-only rings
//! - Overlay: dissolve, erase, explode
//! - Polygonize: raster regions to polygons with exact cell boundaries
//! - Rasterize: weighted polygons to a grid by largest covered area
//! - Fishnet: regular square sampling grids with center labels
//! - Area filter and extents

mod buffer;
mod fishnet;
mod measurements;
mod overlay;
mod polygonize;
mod rasterize;
mod spatial;

pub use buffer::{buffer_point, buffer_polygons, outside_buffer, BufferParams};
pub use fishnet::{fishnet, Fishnet};
pub use measurements::filter_min_area;
pub use overlay::{dissolve, erase, explode, union_all};
pub use polygonize::{polygonize, Region};
pub use rasterize::{rasterize_max_area, RasterizeParams};
pub use spatial::BoundingBox;
