//! Band math operations
//!
//! Cell-wise functions of one raster and weighted sums of several aligned
//! rasters. No-data (NaN) in any input gives no-data in the output.

use crate::maybe_rayon::*;
use avasus_core::raster::Raster;
use avasus_core::{Error, Result};

/// Apply a unary function to every valid cell in a raster.
///
/// # Example
/// ```ignore
/// // any valid cell becomes 1
/// let mask = band_math(&susceptibility, |_| 1.0)?;
/// ```
pub fn band_math<F>(raster: &Raster<f64>, f: F) -> Result<Raster<f64>>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if let Some(v) = raster.value_at(row as isize, col as isize) {
                    *out = f(v);
                }
            }
            row_data
        })
        .collect();

    raster.derive(data, Some(f64::NAN))
}

/// Weighted sum `Σ wᵢ·rasterᵢ` over rasters on the same grid.
///
/// Misaligned inputs are an [`Error::Alignment`]; nothing is resampled.
pub fn weighted_sum(layers: &[(&Raster<f64>, f64)]) -> Result<Raster<f64>> {
    let (first, _) = layers.first().ok_or_else(|| Error::InvalidParameter {
        name: "layers",
        value: "0".into(),
        reason: "weighted sum needs at least one raster".into(),
    })?;
    for (raster, _) in &layers[1..] {
        first.ensure_aligned(raster)?;
    }

    let (rows, cols) = first.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (r, c) = (row as isize, col as isize);
                *out = layers
                    .iter()
                    .map(|(raster, w)| raster.value_at(r, c).map(|v| v * w))
                    .sum::<Option<f64>>()
                    .unwrap_or(f64::NAN);
            }
            row_data
        })
        .collect();

    first.derive(data, Some(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use avasus_core::GeoTransform;

    fn make_band(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(5, 5, value);
        r.set_transform(GeoTransform::new(0.0, 5.0, 1.0, -1.0));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn test_band_math_unary() {
        let mut input = make_band(100.0);
        input.set(1, 1, f64::NAN).unwrap();
        let result = band_math(&input, |_| 1.0).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), 1.0);
        assert!(result.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_weighted_sum() {
        let (slope, vrm, aspect, ridge) = (make_band(9.0), make_band(7.0), make_band(6.0), make_band(0.0));
        let result =
            weighted_sum(&[(&slope, 1.0), (&vrm, 0.5), (&aspect, 0.5), (&ridge, 0.5)]).unwrap();
        assert_eq!(result.get(2, 2).unwrap(), 9.0 + 3.5 + 3.0);
    }

    #[test]
    fn test_weighted_sum_propagates_nodata() {
        let a = make_band(1.0);
        let mut b = make_band(2.0);
        b.set(3, 4, f64::NAN).unwrap();
        let result = weighted_sum(&[(&a, 1.0), (&b, 1.0)]).unwrap();
        assert!(result.get(3, 4).unwrap().is_nan());
        assert_eq!(result.get(0, 0).unwrap(), 3.0);
    }

    #[test]
    fn test_weighted_sum_alignment() {
        let a = make_band(1.0);
        let mut b = make_band(2.0);
        b.set_transform(GeoTransform::new(10.0, 5.0, 1.0, -1.0));
        assert!(matches!(weighted_sum(&[(&a, 1.0), (&b, 1.0)]), Err(Error::Alignment(_))));
        assert!(weighted_sum(&[]).is_err());
    }
}
