//! Main Raster type

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// Origin tolerance (map units) used when checking grid alignment
const ALIGN_TOLERANCE: f64 = 1e-6;

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in a 2D grid with associated
/// geographic metadata (transform and CRS).
///
/// # Example
///
/// ```ignore
/// use avasus_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// let value = raster.get(10, 20)?;
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// Coordinate reference system
    crs: Option<CRS>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a raster from existing data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Create a raster with the same metadata but different data type
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: None,
        }
    }

    /// Create a raster on the same grid from row-major cell values.
    ///
    /// The row-parallel kernels collect a flat `Vec` and hand it back here
    /// together with the output no-data value.
    pub fn derive<U: RasterElement>(&self, values: Vec<U>, nodata: Option<U>) -> Result<Raster<U>> {
        let (rows, cols) = self.shape();
        let mut output = self.with_same_meta::<U>(rows, cols);
        output.nodata = nodata;
        output.data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(output)
    }

    /// Create a raster with the same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            crs: self.crs.clone(),
            nodata: self.nodata,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the CRS
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Set the CRS
    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells)
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Value at (row, col) as `f64`, or `None` for no-data and out-of-range cells
    pub fn value_at(&self, row: isize, col: isize) -> Option<f64> {
        if row < 0 || col < 0 || row as usize >= self.rows() || col as usize >= self.cols() {
            return None;
        }
        let v = self.data[(row as usize, col as usize)];
        if self.is_nodata(v) {
            return None;
        }
        v.to_f64().filter(|f| f.is_finite())
    }

    /// Check that `other` lies on exactly the same grid as `self`.
    ///
    /// Cell-by-cell algebra never resamples; mismatched shape, transform or
    /// CRS is reported as [`Error::Alignment`].
    pub fn ensure_aligned<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::Alignment(format!(
                "shape ({}, {}) vs ({}, {})",
                self.rows(),
                self.cols(),
                other.rows(),
                other.cols()
            )));
        }
        if !self.transform.same_grid(other.transform(), ALIGN_TOLERANCE) {
            return Err(Error::Alignment(format!(
                "transform {:?} vs {:?}",
                self.transform,
                other.transform()
            )));
        }
        if let (Some(a), Some(b)) = (self.crs(), other.crs()) {
            if !a.is_equivalent(b) {
                return Err(Error::Alignment(format!("CRS {} vs {}", a, b)));
            }
        }
        Ok(())
    }

    // Statistics

    /// Calculate basic statistics (min, max, mean, population standard deviation,
    /// count of valid cells)
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }

            if min.is_none_or(|m| value < m) {
                min = Some(value);
            }
            if max.is_none_or(|m| value > m) {
                max = Some(value);
            }

            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        let mean = if count > 0 {
            Some(sum / count as f64)
        } else {
            None
        };

        // Second pass keeps the variance numerically stable for large offsets
        let std_dev = mean.map(|m| {
            let sq: f64 = self
                .data
                .iter()
                .filter(|v| !self.is_nodata(**v))
                .filter_map(|v| v.to_f64())
                .map(|v| (v - m) * (v - m))
                .sum();
            (sq / count as f64).sqrt()
        });

        RasterStatistics {
            min,
            max,
            mean,
            std_dev,
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

impl Raster<f64> {
    /// Replace cells flagged by the raster's own no-data value with NaN and
    /// set the no-data marker to NaN.
    pub fn with_nan_nodata(mut self) -> Self {
        if let Some(nd) = self.nodata {
            if !nd.is_nan() {
                self.data.mapv_inplace(|v| if v.is_nodata(Some(nd)) { f64::NAN } else { v });
            }
        }
        self.nodata = Some(f64::NAN);
        self
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.set(10, 0, 1.0).is_err());
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster: Raster<f64> = Raster::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f64).unwrap();
            }
        }

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(99.0));
        assert_eq!(stats.valid_count, 100);
        assert_relative_eq!(stats.mean.unwrap(), 49.5);
        // population std of 0..99
        assert_relative_eq!(stats.std_dev.unwrap(), (9999.0f64 / 12.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let mut raster = Raster::filled(4, 4, 2.0);
        raster.set_nodata(Some(f64::NAN));
        raster.set(0, 0, f64::NAN).unwrap();
        let stats = raster.statistics();
        assert_eq!(stats.valid_count, 15);
        assert_eq!(stats.nodata_count, 1);
        assert_relative_eq!(stats.std_dev.unwrap(), 0.0);
    }

    #[test]
    fn test_statistics_all_nodata() {
        let raster = Raster::filled(3, 3, f64::NAN);
        let stats = raster.statistics();
        assert!(stats.mean.is_none());
        assert!(stats.std_dev.is_none());
    }

    #[test]
    fn test_ensure_aligned() {
        let mut a: Raster<f64> = Raster::new(5, 5);
        a.set_transform(GeoTransform::new(0.0, 50.0, 10.0, -10.0));
        let b = a.like(1.0);
        assert!(a.ensure_aligned(&b).is_ok());

        let mut shifted = a.like(1.0);
        shifted.set_transform(GeoTransform::new(10.0, 50.0, 10.0, -10.0));
        assert!(matches!(a.ensure_aligned(&shifted), Err(Error::Alignment(_))));

        let small: Raster<f64> = Raster::new(4, 5);
        assert!(matches!(a.ensure_aligned(&small), Err(Error::Alignment(_))));

        let mut other_crs = a.like(1.0);
        a.set_crs(Some(CRS::from_epsg(32612)));
        other_crs.set_crs(Some(CRS::from_epsg(26912)));
        assert!(matches!(a.ensure_aligned(&other_crs), Err(Error::Alignment(_))));
    }

    #[test]
    fn test_value_at_and_nan_nodata() {
        let mut r = Raster::filled(2, 2, 1.0);
        r.set(0, 1, -9999.0).unwrap();
        r.set_nodata(Some(-9999.0));
        let r = r.with_nan_nodata();
        assert!(r.get(0, 1).unwrap().is_nan());
        assert_eq!(r.value_at(0, 0), Some(1.0));
        assert_eq!(r.value_at(0, 1), None);
        assert_eq!(r.value_at(-1, 0), None);
        assert_eq!(r.value_at(0, 2), None);
    }

    #[test]
    fn test_derive_keeps_grid() {
        let mut src: Raster<f64> = Raster::new(2, 3);
        src.set_transform(GeoTransform::new(100.0, 50.0, 10.0, -10.0));
        src.set_crs(Some(CRS::lv95()));

        let out = src.derive(vec![1.0, 2.0, 3.0, 4.0, 5.0, f64::NAN], Some(f64::NAN)).unwrap();
        assert_eq!(out.get(1, 0).unwrap(), 4.0);
        assert_eq!(out.transform().origin_x, 100.0);
        assert_eq!(out.crs(), Some(&CRS::lv95()));
        assert!(out.nodata().is_some_and(f64::is_nan));
        assert!(src.derive(vec![1.0; 5], None).is_err());
    }
}
