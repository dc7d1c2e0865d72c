//! Statistical operations on raster data
//!
//! - **focal**: Moving window sums, counts and means over square or circular windows

pub mod focal;

pub use focal::{focal_statistics, focal_sums, FocalParams, FocalStatistic};
