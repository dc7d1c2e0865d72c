//! Aspect calculation from DEMs
//!
//! Compass bearing of steepest descent (0 = north, clockwise) from Horn's
//! 3x3 gradient. Flat cells get [`FLAT_ASPECT`].

use std::f64::consts::PI;

use crate::maybe_rayon::*;
use avasus_core::raster::Raster;
use avasus_core::{Algorithm, Error, Result};

use super::{cell_sizes, horn_gradient};

/// Aspect of cells with no gradient
pub const FLAT_ASPECT: f64 = -1.0;

/// Gradient magnitude below which a cell counts as flat
const FLAT_THRESHOLD: f64 = 1e-10;

/// Aspect algorithm
#[derive(Debug, Clone, Default)]
pub struct Aspect;

impl Algorithm for Aspect {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Aspect"
    }

    fn description(&self) -> &'static str {
        "Downslope compass bearing in degrees, -1 on flat cells"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        aspect(&input)
    }
}

/// Calculate aspect in degrees `[0, 360)`, or `-1` where the surface is flat.
///
/// No-data cells stay NaN.
pub fn aspect(dem: &Raster<f64>) -> Result<Raster<f64>> {
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
                let Some((dz_dx, dz_dy)) = horn_gradient(dem, row, col, dx, dy) else {
                    continue;
                };
                if dz_dx.abs() < FLAT_THRESHOLD && dz_dy.abs() < FLAT_THRESHOLD {
                    *out = FLAT_ASPECT;
                    continue;
                }
                // Descent points along (-dz/dx) east and (+dz/dy) north, since
                // rows grow southward.
                let bearing = (-dz_dx).atan2(dz_dy);
                let bearing = if bearing < 0.0 { bearing + 2.0 * PI } else { bearing };
                // guard the 360 wrap from rounding
                *out = bearing.to_degrees() % 360.0;
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

    fn center_aspect(f: impl Fn(usize, usize) -> f64) -> f64 {
        let result = aspect(&dem_from(7, 10.0, f)).unwrap();
        result.get(3, 3).unwrap()
    }

    #[test]
    fn test_aspect_cardinal_directions() {
        // elevation falls toward the north (rows grow southward)
        let north = center_aspect(|r, _| r as f64 * 5.0);
        assert!(north.abs() < 1e-9, "expected 0, got {}", north);

        let east = center_aspect(|_, c| 100.0 - c as f64 * 5.0);
        assert!((east - 90.0).abs() < 1e-9, "expected 90, got {}", east);

        let south = center_aspect(|r, _| 100.0 - r as f64 * 5.0);
        assert!((south - 180.0).abs() < 1e-9, "expected 180, got {}", south);

        let west = center_aspect(|_, c| c as f64 * 5.0);
        assert!((west - 270.0).abs() < 1e-9, "expected 270, got {}", west);
    }

    #[test]
    fn test_aspect_flat_sentinel_everywhere() {
        let result = aspect(&flat(10)).unwrap();
        assert!(result.data().iter().all(|&v| v == FLAT_ASPECT));
    }

    #[test]
    fn test_aspect_nodata_stays_nodata() {
        let mut dem = flat(5);
        dem.set(0, 0, f64::NAN).unwrap();
        let result = Aspect.execute(dem, ()).unwrap();
        assert!(result.get(0, 0).unwrap().is_nan());
        assert_eq!(result.get(1, 1).unwrap(), FLAT_ASPECT);
    }
}
