//! Slope calculation from DEMs
//!
//! Rate of change of elevation in degrees using Horn's (1981) 3x3 method.

use crate::maybe_rayon::*;
use avasus_core::raster::Raster;
use avasus_core::{Algorithm, Error, Result};

use super::{cell_sizes, horn_gradient};

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    /// Vertical exaggeration applied to elevations (default 1.0)
    pub z_factor: f64,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self { z_factor: 1.0 }
    }
}

/// Slope algorithm
#[derive(Debug, Clone, Default)]
pub struct Slope;

impl Algorithm for Slope {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = SlopeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Slope"
    }

    fn description(&self) -> &'static str {
        "Slope in degrees from a DEM using Horn's method"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        slope(&input, params)
    }
}

/// Calculate slope in degrees, in `[0, 90]`
///
/// ```text
/// slope = atan(z_factor * sqrt(dz/dx² + dz/dy²))
/// ```
///
/// No-data cells stay NaN. Edge cells reuse the center value for the missing
/// side of the window, so a flat tile is slope 0 everywhere.
pub fn slope(dem: &Raster<f64>, params: SlopeParams) -> Result<Raster<f64>> {
    let (rows, cols) = dem.shape();
    let (dx, dy) = cell_sizes(dem);
    if dx <= 0.0 || dy <= 0.0 {
        return Err(Error::Algorithm("DEM cell size must be positive".into()));
    }

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if let Some((dz_dx, dz_dy)) = horn_gradient(dem, row, col, dx, dy) {
                    let rise = params.z_factor * (dz_dx * dz_dx + dz_dy * dz_dy).sqrt();
                    *out = rise.atan().to_degrees();
                }
            }
            row_data
        })
        .collect();

    dem.derive(output_data, Some(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::test_dems::{dem_from, flat};

    #[test]
    fn test_slope_flat_everywhere() {
        let result = slope(&flat(10), SlopeParams::default()).unwrap();
        for v in result.data().iter() {
            assert!(v.abs() < 1e-12, "Expected 0 slope on a flat DEM, got {}", v);
        }
    }

    #[test]
    fn test_slope_plane_45_degrees() {
        // rises 10 m per 10 m cell to the east
        let dem = dem_from(10, 10.0, |_, col| col as f64 * 10.0);
        let result = Slope.execute_default(dem).unwrap();
        let v = result.get(5, 5).unwrap();
        assert!((v - 45.0).abs() < 1e-9, "Expected 45°, got {}", v);
        // interior of the tile is uniform
        assert!((result.get(3, 3).unwrap() - v).abs() < 1e-9);
    }

    #[test]
    fn test_slope_range_on_rough_surface() {
        let dem = dem_from(12, 10.0, |r, c| ((r * 7 + c * 13) % 11) as f64 * 40.0);
        let result = slope(&dem, SlopeParams::default()).unwrap();
        for v in result.data().iter().filter(|v| v.is_finite()) {
            assert!((0.0..=90.0).contains(v), "slope out of range: {}", v);
        }
    }

    #[test]
    fn test_slope_nodata_center_and_neighbour() {
        let mut dem = dem_from(5, 10.0, |_, col| col as f64 * 10.0);
        dem.set(2, 2, f64::NAN).unwrap();
        let result = slope(&dem, SlopeParams::default()).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        // neighbour of the hole still gets a value
        assert!(result.get(2, 1).unwrap().is_finite());
    }
}
