//! Raster reclassification
//!
//! Maps continuous values to ordinal classes with an ordered table of
//! `[min, max)` ranges. The first range containing a value wins; values in
//! no range, and no-data cells, become NaN.

use serde::{Deserialize, Serialize};
use crate::maybe_rayon::*;
use avasus_core::raster::Raster;
use avasus_core::{Error, Result};

/// A reclassification entry mapping an input range to an output class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReclassEntry {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (exclusive, except for the last entry when
    /// [`ReclassifyParams::last_inclusive`] is set)
    pub max: f64,
    /// Output class; `None` maps the range to no-data
    pub value: Option<f64>,
}

impl ReclassEntry {
    pub fn new(min: f64, max: f64, value: f64) -> Self {
        Self { min, max, value: Some(value) }
    }

    /// A range whose cells become no-data
    pub fn nodata(min: f64, max: f64) -> Self {
        Self { min, max, value: None }
    }
}

/// Parameters for reclassification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReclassifyParams {
    /// Ordered reclassification table
    pub classes: Vec<ReclassEntry>,
    /// Whether the last entry also includes its upper bound
    #[serde(default = "default_last_inclusive")]
    pub last_inclusive: bool,
}

fn default_last_inclusive() -> bool {
    true
}

impl Default for ReclassifyParams {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            last_inclusive: true,
        }
    }
}

impl ReclassifyParams {
    pub fn new(classes: Vec<ReclassEntry>) -> Self {
        Self { classes, last_inclusive: true }
    }

    /// Class for a single value, `None` when unmatched or mapped to no-data
    pub fn classify(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let last = self.classes.len().checked_sub(1)?;
        self.classes
            .iter()
            .enumerate()
            .find(|(i, e)| {
                value >= e.min && (value < e.max || (*i == last && self.last_inclusive && value == e.max))
            })
            .and_then(|(_, e)| e.value)
    }

    fn validate(&self) -> Result<()> {
        match self.classes.iter().find(|e| e.min.is_nan() || e.max.is_nan() || e.min > e.max) {
            Some(bad) => Err(Error::InvalidParameter {
                name: "classes",
                value: format!("[{}, {})", bad.min, bad.max),
                reason: "range bounds must be ordered numbers".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Reclassify raster values based on a classification table.
///
/// # Example
/// ```ignore
/// // slope in degrees to start-zone weight
/// let params = ReclassifyParams::new(vec![
///     ReclassEntry::nodata(0.0, 28.0),
///     ReclassEntry::new(28.0, 30.0, 4.0),
///     ReclassEntry::new(30.0, 35.0, 7.0),
///     ReclassEntry::new(35.0, 45.0, 9.0),
///     ReclassEntry::new(45.0, 90.0, 7.0),
/// ]);
/// let weights = reclassify(&slope, &params)?;
/// ```
pub fn reclassify(raster: &Raster<f64>, params: &ReclassifyParams) -> Result<Raster<f64>> {
    params.validate()?;
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                if let Some(v) = raster.value_at(row as isize, col as isize) {
                    *out = params.classify(v).unwrap_or(f64::NAN);
                }
            }
            row_data
        })
        .collect();

    raster.derive(data, Some(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use avasus_core::GeoTransform;

    fn slope_raster() -> Raster<f64> {
        let values = vec![
            0.0, 27.9, 28.0, 29.99,
            30.0, 34.5, 35.0, 44.9,
            45.0, 60.0, 90.0, f64::NAN,
        ];
        let mut r = Raster::from_vec(values, 3, 4).unwrap();
        r.set_transform(GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        r.set_nodata(Some(f64::NAN));
        r
    }

    fn start_table() -> ReclassifyParams {
        ReclassifyParams::new(vec![
            ReclassEntry::nodata(0.0, 28.0),
            ReclassEntry::new(28.0, 30.0, 4.0),
            ReclassEntry::new(30.0, 35.0, 7.0),
            ReclassEntry::new(35.0, 45.0, 9.0),
            ReclassEntry::new(45.0, 90.0, 7.0),
        ])
    }

    #[test]
    fn test_reclassify_breakpoints() {
        let result = reclassify(&slope_raster(), &start_table()).unwrap();
        let got: Vec<f64> = result.data().iter().copied().collect();
        let expected = [
            f64::NAN, f64::NAN, 4.0, 4.0,
            7.0, 7.0, 9.0, 9.0,
            7.0, 7.0, 7.0, f64::NAN,
        ];
        for (g, e) in got.iter().zip(expected.iter()) {
            assert!(g == e || (g.is_nan() && e.is_nan()), "got {} expected {}", g, e);
        }
    }

    #[test]
    fn test_reclassify_last_bound_exclusive() {
        let mut table = start_table();
        table.last_inclusive = false;
        assert_eq!(table.classify(90.0), None);
        assert_eq!(table.classify(89.999), Some(7.0));
    }

    #[test]
    fn test_first_match_wins() {
        let table = ReclassifyParams::new(vec![
            ReclassEntry::new(0.0, 10.0, 1.0),
            ReclassEntry::new(5.0, 15.0, 2.0),
        ]);
        assert_eq!(table.classify(7.0), Some(1.0));
        assert_eq!(table.classify(12.0), Some(2.0));
        assert_eq!(table.classify(-1.0), None);
    }

    #[test]
    fn test_reclassify_deterministic() {
        let a = reclassify(&slope_raster(), &start_table()).unwrap();
        let b = reclassify(&slope_raster(), &start_table()).unwrap();
        for (x, y) in a.data().iter().zip(b.data().iter()) {
            assert!(x == y || (x.is_nan() && y.is_nan()));
        }
    }

    #[test]
    fn test_reclassify_empty_table_and_bad_range() {
        let result = reclassify(&slope_raster(), &ReclassifyParams::default()).unwrap();
        assert!(result.data().iter().all(|v| v.is_nan()));

        let bad = ReclassifyParams::new(vec![ReclassEntry::new(5.0, 1.0, 1.0)]);
        assert!(reclassify(&slope_raster(), &bad).is_err());
    }

    #[test]
    fn test_table_json_uses_null_for_nodata() {
        let json = serde_json::to_value(start_table()).unwrap();
        assert!(json["classes"][0]["value"].is_null());
        let back: ReclassifyParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, start_table());
    }
}
