//! Vector Ruggedness Measure (VRM)
//!
//! Terrain ruggedness as the dispersion of unit surface normals in a square
//! window (Sappington et al., 2007):
//!
//! ```text
//! x = sin(aspect)·sin(slope)
//! y = cos(aspect)·sin(slope)
//! z = cos(slope)
//! VRM = 1 - |(Σx, Σy, Σz)| / n
//! ```
//!
//! `n` is the full window cell count (25 for the 5×5 default). The sums skip
//! missing cells, so near tile edges or holes fewer normals contribute while
//! the divisor stays fixed.

use avasus_core::raster::{Neighborhood, Raster};
use avasus_core::{Algorithm, Error, Result};
use ndarray::{Array2, Zip};

use super::{aspect, slope, SlopeParams, FLAT_ASPECT};
use crate::statistics::focal_sums;

/// Parameters for VRM calculation
#[derive(Debug, Clone)]
pub struct VrmParams {
    /// Side of the square window in cells, odd (default 5)
    pub window: usize,
}

impl Default for VrmParams {
    fn default() -> Self {
        Self { window: 5 }
    }
}

/// VRM algorithm, taking a DEM
#[derive(Debug, Clone, Default)]
pub struct Vrm;

impl Algorithm for Vrm {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = VrmParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "VRM"
    }

    fn description(&self) -> &'static str {
        "Vector Ruggedness Measure: dispersion of surface normals in a square window"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        vrm_from_dem(&input, params)
    }
}

/// VRM straight from a DEM, via Horn slope and aspect
pub fn vrm_from_dem(dem: &Raster<f64>, params: VrmParams) -> Result<Raster<f64>> {
    let slope = slope(dem, SlopeParams::default())?;
    let aspect = aspect(dem)?;
    vrm(&slope, &aspect, params)
}

/// Compute VRM from slope and aspect rasters in degrees.
///
/// Flat cells (aspect `-1`) count as aspect 0. Cells where slope or aspect
/// is missing, and cells whose window holds no normal, are NaN. Both inputs
/// must be on the same grid.
pub fn vrm(slope: &Raster<f64>, aspect: &Raster<f64>, params: VrmParams) -> Result<Raster<f64>> {
    if params.window == 0 || params.window % 2 == 0 {
        return Err(Error::InvalidParameter {
            name: "window",
            value: params.window.to_string(),
            reason: "VRM window must be an odd number of cells".into(),
        });
    }
    slope.ensure_aligned(aspect)?;

    let (rows, cols) = slope.shape();
    let mut nx = Array2::from_elem((rows, cols), f64::NAN);
    let mut ny = Array2::from_elem((rows, cols), f64::NAN);
    let mut nz = Array2::from_elem((rows, cols), f64::NAN);

    for row in 0..rows {
        for col in 0..cols {
            let (r, c) = (row as isize, col as isize);
            let (Some(s), Some(a)) = (slope.value_at(r, c), aspect.value_at(r, c)) else {
                continue;
            };
            let a = if a == FLAT_ASPECT { 0.0 } else { a };
            let (s, a) = (s.to_radians(), a.to_radians());
            nx[[row, col]] = a.sin() * s.sin();
            ny[[row, col]] = a.cos() * s.sin();
            nz[[row, col]] = s.cos();
        }
    }

    let window = Neighborhood::Square(params.window / 2);
    let n = (params.window * params.window) as f64;
    let (sx, count) = focal_sums(&nx, &window);
    let (sy, _) = focal_sums(&ny, &window);
    let (sz, _) = focal_sums(&nz, &window);

    let mut output = slope.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    Zip::from(output.data_mut())
        .and(&nz)
        .and(&count)
        .and(&sx)
        .and(&sy)
        .and(&sz)
        .for_each(|o, &center, &k, &x, &y, &z| {
            *o = if center.is_nan() || k == 0 {
                f64::NAN
            } else {
                // clamp rounding just below 0
                (1.0 - (x * x + y * y + z * z).sqrt() / n).max(0.0)
            };
        });

    Ok(output)
}
