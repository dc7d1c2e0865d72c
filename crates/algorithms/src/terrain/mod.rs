//! Terrain derivatives used by the susceptibility model
//!
//! - **slope**: Horn slope in degrees
//! - **aspect**: Horn aspect as a compass bearing, `-1` on flat cells
//! - **vrm**: Vector Ruggedness Measure from slope and aspect
//! - **tpi**: Topographic Position Index over a circular window

mod aspect;
mod slope;
mod tpi;
mod vrm;

pub use aspect::{aspect, Aspect, FLAT_ASPECT};
pub use slope::{slope, Slope, SlopeParams};
pub use tpi::{tpi, Tpi, TpiParams};
pub use vrm::{vrm, vrm_from_dem, Vrm, VrmParams};

use avasus_core::raster::Raster;

/// Horn (1981) partial derivatives at (row, col).
///
/// Returns `(dz/dx, dz/dy)` per map unit, x growing east and y growing with
/// the row index (south on a north-up grid), or `None` when the center cell
/// is missing. Neighbours outside the raster or flagged as no-data take the
/// center value, so edge cells still get a gradient.
///
/// ```text
/// a b c
/// d e f
/// g h i
/// ```
pub(crate) fn horn_gradient(
    dem: &Raster<f64>,
    row: usize,
    col: usize,
    dx: f64,
    dy: f64,
) -> Option<(f64, f64)> {
    let (r, c) = (row as isize, col as isize);
    let e = dem.value_at(r, c)?;
    let z = |dr: isize, dc: isize| dem.value_at(r + dr, c + dc).unwrap_or(e);

    let (a, b, cc) = (z(-1, -1), z(-1, 0), z(-1, 1));
    let (d, f) = (z(0, -1), z(0, 1));
    let (g, h, i) = (z(1, -1), z(1, 0), z(1, 1));

    let dz_dx = ((cc + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * dx);
    let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + cc)) / (8.0 * dy);
    Some((dz_dx, dz_dy))
}

/// Cell width and height of a DEM in map units
pub(crate) fn cell_sizes(dem: &Raster<f64>) -> (f64, f64) {
    let gt = dem.transform();
    (gt.pixel_width.abs(), gt.pixel_height.abs())
}

#[cfg(test)]
pub(crate) mod test_dems {
    use avasus_core::{GeoTransform, Raster};

    /// `size`×`size` DEM on a grid with the given cell size, from `f(row, col)`
    pub fn dem_from(size: usize, cell: f64, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut dem = Raster::new(size, size);
        dem.set_transform(GeoTransform::new(0.0, size as f64 * cell, cell, -cell));
        dem.set_nodata(Some(f64::NAN));
        for row in 0..size {
            for col in 0..size {
                dem.set(row, col, f(row, col)).unwrap();
            }
        }
        dem
    }

    pub fn flat(size: usize) -> Raster<f64> {
        dem_from(size, 10.0, |_, _| 1500.0)
    }
}
