//! Focal (moving window) statistics
//!
//! Windows are described by a [`Neighborhood`]. Missing cells (NaN, no-data,
//! or outside the raster) are ignored rather than zero-filled, so windows
//! at the raster edge and around holes simply contain fewer values.
//!
//! Sums are computed from per-row prefix sums: each window row is a
//! contiguous run of columns, so a cell costs one subtraction per window
//! row instead of one addition per window cell. This keeps the 200 m TPI
//! circle (over a thousand cells on a 10 m grid) cheap.

use ndarray::Array2;
use crate::maybe_rayon::*;
use avasus_core::raster::{Neighborhood, Raster};
use avasus_core::{Error, Result};

/// Available focal statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocalStatistic {
    /// Arithmetic mean of the valid cells
    Mean,
    /// Sum of the valid cells
    Sum,
    /// Number of valid cells
    Count,
}

/// Parameters for focal statistics
#[derive(Debug, Clone)]
pub struct FocalParams {
    pub neighborhood: Neighborhood,
    pub statistic: FocalStatistic,
}

impl Default for FocalParams {
    fn default() -> Self {
        Self {
            neighborhood: Neighborhood::Square(1),
            statistic: FocalStatistic::Mean,
        }
    }
}

/// Compute a focal statistic for every cell.
///
/// Cells whose window holds no valid value are NaN.
pub fn focal_statistics(raster: &Raster<f64>, params: FocalParams) -> Result<Raster<f64>> {
    if params.neighborhood.radius() == 0 {
        return Err(Error::InvalidParameter {
            name: "neighborhood",
            value: format!("{:?}", params.neighborhood),
            reason: "window must reach at least one neighbour".into(),
        });
    }

    let (rows, cols) = raster.shape();
    let values = raster.data().mapv(|v| if raster.is_nodata(v) { f64::NAN } else { v });
    let (sums, counts) = focal_sums(&values, &params.neighborhood);

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    ndarray::Zip::from(output.data_mut())
        .and(&sums)
        .and(&counts)
        .for_each(|o, &s, &n| {
            *o = match params.statistic {
                _ if n == 0 => f64::NAN,
                FocalStatistic::Mean => s / n as f64,
                FocalStatistic::Sum => s,
                FocalStatistic::Count => n as f64,
            };
        });

    Ok(output)
}

/// Windowed sum and number of valid values for every cell of `values`.
///
/// Non-finite entries are treated as missing.
pub fn focal_sums(values: &Array2<f64>, neighborhood: &Neighborhood) -> (Array2<f64>, Array2<u32>) {
    let (rows, cols) = values.dim();

    // prefix[r][c] holds the sum over columns 0..c of row r
    let mut prefix = Array2::<f64>::zeros((rows, cols + 1));
    let mut prefix_n = Array2::<u32>::zeros((rows, cols + 1));
    for r in 0..rows {
        for c in 0..cols {
            let v = values[[r, c]];
            let (add, n) = if v.is_finite() { (v, 1) } else { (0.0, 0) };
            prefix[[r, c + 1]] = prefix[[r, c]] + add;
            prefix_n[[r, c + 1]] = prefix_n[[r, c]] + n;
        }
    }

    let spans = neighborhood.row_spans();
    let pairs: Vec<(f64, u32)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![(0.0, 0u32); cols];
            for (col, cell) in row_data.iter_mut().enumerate() {
                for &(dr, w) in &spans {
                    let rr = row as isize + dr;
                    if rr < 0 || rr >= rows as isize {
                        continue;
                    }
                    let rr = rr as usize;
                    let c0 = (col as isize - w).max(0) as usize;
                    let c1 = ((col as isize + w) as usize).min(cols - 1) + 1;
                    cell.0 += prefix[[rr, c1]] - prefix[[rr, c0]];
                    cell.1 += prefix_n[[rr, c1]] - prefix_n[[rr, c0]];
                }
            }
            row_data
        })
        .collect();

    let sums = Array2::from_shape_fn((rows, cols), |(r, c)| pairs[r * cols + c].0);
    let counts = Array2::from_shape_fn((rows, cols), |(r, c)| pairs[r * cols + c].1);
    (sums, counts)
}
