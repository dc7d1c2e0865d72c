//! Neighborhood (moving window) shapes for focal operations

/// Defines a neighborhood pattern around a cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighborhood {
    /// Square window of the given radius in cells (side = 2r + 1)
    Square(usize),
    /// Circle of the given radius in cells; a cell belongs to the window when
    /// its center lies within the radius of the focal cell's center
    Circle(f64),
}

impl Neighborhood {
    /// Circle whose radius is given in map units, for a grid of `cell_size`
    pub fn circle_map_units(radius: f64, cell_size: f64) -> Self {
        Neighborhood::Circle(radius / cell_size)
    }

    /// Get the radius of the neighborhood in whole cells
    pub fn radius(&self) -> usize {
        match self {
            Neighborhood::Square(r) => *r,
            Neighborhood::Circle(r) => r.max(0.0).floor() as usize,
        }
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        match self {
            Neighborhood::Square(r) => {
                let r = *r as isize;
                dr.abs() <= r && dc.abs() <= r
            }
            Neighborhood::Circle(r) => ((dr * dr + dc * dc) as f64) <= r * r + 1e-9,
        }
    }

    /// Horizontal half-width of the window for every row offset.
    ///
    /// Both shapes are symmetric and row-convex, so each row of the window
    /// is the contiguous run `-w..=w`; focal sums use this to work on
    /// row prefix sums instead of visiting every offset.
    pub fn row_spans(&self) -> Vec<(isize, isize)> {
        let r = self.radius() as isize;
        (-r..=r)
            .filter_map(|dr| {
                let w = (0..=r).rev().find(|&dc| self.contains(dr, dc))?;
                Some((dr, w))
            })
            .collect()
    }

    /// Iterate over relative positions in this neighborhood
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        self.row_spans()
            .into_iter()
            .flat_map(|(dr, w)| (-w..=w).map(move |dc| (dr, dc)))
            .collect()
    }
}
