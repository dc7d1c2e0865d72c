//! Cell-by-cell raster algebra
//!
//! - Reclassify: ordered breakpoint tables mapping values to classes
//! - Band math: unary cell functions and weighted sums of aligned rasters

mod band_math;
mod reclassify;

pub use band_math::{band_math, weighted_sum};
pub use reclassify::{reclassify, ReclassEntry, ReclassifyParams};
