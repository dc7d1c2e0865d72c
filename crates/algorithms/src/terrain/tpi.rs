//! Topographic Position Index (TPI)
//!
//! Difference between a cell's elevation and the mean elevation of a
//! circular window around it (Weiss, 2001):
//!
//!   TPI = z_center - mean(z in window)
//!
//! Positive values mark ridges and hilltops, negative values valleys.
//! The window includes the center cell and ignores missing cells, so edge
//! cells are compared with the part of the circle inside the tile.

use avasus_core::raster::{Neighborhood, Raster};
use avasus_core::{Algorithm, Error, Result};
use ndarray::Zip;
use tracing::warn;

use crate::statistics::{focal_statistics, FocalParams, FocalStatistic};

/// Parameters for TPI calculation
#[derive(Debug, Clone)]
pub struct TpiParams {
    /// Window radius in map units (default 200)
    pub radius: f64,
}

impl Default for TpiParams {
    fn default() -> Self {
        Self { radius: 200.0 }
    }
}

/// TPI algorithm
#[derive(Debug, Clone, Default)]
pub struct Tpi;

impl Algorithm for Tpi {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = TpiParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "TPI"
    }

    fn description(&self) -> &'static str {
        "Topographic Position Index: elevation relative to a circular neighborhood mean"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        tpi(&input, params)
    }
}

/// Calculate the Topographic Position Index.
///
/// The radius is converted to cells with the DEM's cell size. A radius
/// smaller than one cell is widened to one cell with a warning, so coarse
/// DEMs still get a 4-neighbour window.
pub fn tpi(dem: &Raster<f64>, params: TpiParams) -> Result<Raster<f64>> {
    let cell = dem.cell_size().abs();
    if !(params.radius.is_finite() && params.radius > 0.0) {
        return Err(Error::InvalidParameter {
            name: "radius",
            value: params.radius.to_string(),
            reason: "TPI radius must be positive".into(),
        });
    }
    if !(cell.is_finite() && cell > 0.0) {
        return Err(Error::Algorithm("DEM cell size must be positive".into()));
    }
    let radius = if params.radius < cell {
        warn!(radius = params.radius, cell, "TPI radius below one cell, using one cell");
        cell
    } else {
        params.radius
    };

    let mean = focal_statistics(
        dem,
        FocalParams {
            neighborhood: Neighborhood::circle_map_units(radius, cell),
            statistic: FocalStatistic::Mean,
        },
    )?;

    let mut output = mean;
    Zip::from(output.data_mut())
        .and(dem.data())
        .for_each(|m, &z| {
            *m = if dem.is_nodata(z) { f64::NAN } else { z - *m };
        });
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::test_dems::{dem_from, flat};

    #[test]
    fn test_tpi_flat_is_zero() {
        let result = tpi(&flat(10), TpiParams { radius: 30.0 }).unwrap();
        assert!(result.data().iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_tpi_peak_positive_valley_negative() {
        let peak = dem_from(11, 10.0, |r, c| if (r, c) == (5, 5) { 120.0 } else { 100.0 });
        let result = Tpi.execute(peak, TpiParams { radius: 20.0 }).unwrap();
        // 13-cell circle: 120 - (120 + 12*100) / 13
        let expected = 20.0 - 20.0 / 13.0;
        let v = result.get(5, 5).unwrap();
        assert!((v - expected).abs() < 1e-9, "expected {}, got {}", expected, v);
        assert!(result.get(5, 4).unwrap() < 0.0);

        let valley = dem_from(11, 10.0, |_, c| (c as f64 - 5.0).abs() * 10.0);
        let result = tpi(&valley, TpiParams { radius: 30.0 }).unwrap();
        assert!(result.get(5, 5).unwrap() < 0.0);
    }

    #[test]
    fn test_tpi_nodata_and_radius_checks() {
        let mut dem = flat(6);
        dem.set(2, 2, f64::NAN).unwrap();
        let result = tpi(&dem, TpiParams { radius: 20.0 }).unwrap();
        assert!(result.get(2, 2).unwrap().is_nan());
        assert!(result.get(2, 3).unwrap().abs() < 1e-9);
        assert!(tpi(&dem, TpiParams { radius: 0.0 }).is_err());
        assert!(tpi(&dem, TpiParams { radius: f64::NAN }).is_err());
    }

    #[test]
    fn test_tpi_radius_below_cell_uses_one_cell() {
        let peak = dem_from(5, 10.0, |r, c| if (r, c) == (2, 2) { 120.0 } else { 100.0 });
        let narrow = tpi(&peak, TpiParams { radius: 5.0 }).unwrap();
        let one_cell = tpi(&peak, TpiParams { radius: 10.0 }).unwrap();
        // center plus its 4 neighbours: 120 - (120 + 4*100) / 5
        assert!((narrow.get(2, 2).unwrap() - 16.0).abs() < 1e-9);
        assert_eq!(narrow.data(), one_cell.data());
    }
}
