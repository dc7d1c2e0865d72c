//! Regular sampling grids
//!
//! A fishnet is a lattice of square cells anchored at the lower-left corner
//! of an extent. It always covers the whole extent, so the last row and
//! column may reach past the upper and right edges.

use geo::{Point, Polygon};
use avasus_core::{Error, Result};

use super::spatial::BoundingBox;

/// Whole-cell slack when counting rows and columns
const FIT_TOLERANCE: f64 = 1e-9;

/// Fishnet cells and their center labels
#[derive(Debug, Clone)]
pub struct Fishnet {
    pub rows: usize,
    pub cols: usize,
    /// Cell polygons, row by row from the bottom
    pub cells: Vec<Polygon<f64>>,
    /// Cell centers, same order as `cells`
    pub labels: Vec<Point<f64>>,
}

/// Build a fishnet of `cell_size` squares covering `extent`.
///
/// Columns are `ceil(width / cell_size)`, rows `ceil(height / cell_size)`.
pub fn fishnet(extent: &BoundingBox, cell_size: f64) -> Result<Fishnet> {
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: cell_size.to_string(),
            reason: "fishnet cells need a positive size".into(),
        });
    }
    let count = |span: f64| ((span / cell_size) - FIT_TOLERANCE).ceil().max(1.0) as usize;
    let cols = count(extent.width());
    let rows = count(extent.height());

    let mut cells = Vec::with_capacity(rows * cols);
    let mut labels = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        let y0 = extent.min_y + r as f64 * cell_size;
        for c in 0..cols {
            let x0 = extent.min_x + c as f64 * cell_size;
            cells.push(BoundingBox::new(x0, y0, x0 + cell_size, y0 + cell_size).to_polygon());
            labels.push(Point::new(x0 + cell_size / 2.0, y0 + cell_size / 2.0));
        }
    }

    Ok(Fishnet { rows, cols, cells, labels })
}
