//! Raster data structures and operations

mod element;
mod geotransform;
mod grid;
mod mosaic;
mod neighborhood;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use mosaic::mosaic;
pub use neighborhood::Neighborhood;
