//! Polygon to raster conversion by largest covered area
//!
//! Each output cell takes the weight whose polygons cover the largest share
//! of the cell. Coverage is estimated by sampling a regular `n×n` pattern of
//! points inside every cell with an even-odd scanline fill, so rings may be
//! given in either orientation and holes are honoured.

use geo::{LineString, Polygon};
use avasus_core::raster::Raster;
use avasus_core::{Error, Result};
use crate::maybe_rayon::*;

/// Parameters for max-area rasterization
#[derive(Debug, Clone)]
pub struct RasterizeParams {
    /// Sample points per cell side (default 4, so 16 samples per cell)
    pub subsamples: usize,
    /// Value of cells no polygon touches (default 0)
    pub fill: f64,
}

impl Default for RasterizeParams {
    fn default() -> Self {
        Self {
            subsamples: 4,
            fill: 0.0,
        }
    }
}

/// Rasterize weighted polygons onto the grid of `template`.
///
/// `layers` pairs each weight with its polygons. The weight with the most
/// covered samples wins a cell; ties go to the larger weight. Polygons of one
/// weight may overlap each other; a sample counts once per weight.
pub fn rasterize_max_area(
    layers: &[(f64, Vec<Polygon<f64>>)],
    template: &Raster<f64>,
    params: &RasterizeParams,
) -> Result<Raster<f64>> {
    let s = params.subsamples;
    if s == 0 {
        return Err(Error::InvalidParameter {
            name: "subsamples",
            value: "0".into(),
            reason: "need at least one sample per cell".into(),
        });
    }
    let gt = *template.transform();
    if !gt.is_north_up() {
        return Err(Error::Algorithm("rasterization needs a north-up grid".into()));
    }
    let (rows, cols) = template.shape();

    let weights: Vec<f64> = layers.iter().map(|(w, _)| *w).collect();
    // rings of every polygon, per weight
    let polygons_of: Vec<Vec<Vec<&LineString<f64>>>> = layers
        .iter()
        .map(|(_, polys)| {
            polys
                .iter()
                .map(|p| std::iter::once(p.exterior()).chain(p.interiors()).collect())
                .collect()
        })
        .collect();
    let sub_cols = cols * s;
    let step_x = gt.pixel_width / s as f64;

    let output_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            // covered sample count per weight for this row of cells
            let mut counts = vec![vec![0u32; cols]; weights.len()];
            let mut covered = vec![false; sub_cols];
            let mut xs: Vec<f64> = Vec::new();

            for k in 0..s {
                let y = gt.origin_y + (row as f64 + (k as f64 + 0.5) / s as f64) * gt.pixel_height;
                for (li, polygons) in polygons_of.iter().enumerate() {
                    covered.iter_mut().for_each(|c| *c = false);
                    for poly_rings in polygons {
                        xs.clear();
                        for ring in poly_rings {
                            crossings(ring, y, &mut xs);
                        }
                        xs.sort_by(f64::total_cmp);
                        for span in xs.chunks_exact(2) {
                            // sample j sits at origin_x + (j + 0.5) * step_x
                            let first = ((span[0] - gt.origin_x) / step_x - 0.5).ceil().max(0.0);
                            let end = ((span[1] - gt.origin_x) / step_x - 0.5).ceil().min(sub_cols as f64);
                            if end > first {
                                covered[first as usize..end as usize].iter_mut().for_each(|c| *c = true);
                            }
                        }
                    }
                    for (j, _) in covered.iter().enumerate().filter(|(_, c)| **c) {
                        counts[li][j / s] += 1;
                    }
                }
            }

            (0..cols)
                .map(|col| {
                    let mut best: Option<(u32, f64)> = None;
                    for (li, w) in weights.iter().enumerate() {
                        let n = counts[li][col];
                        if n == 0 {
                            continue;
                        }
                        best = match best {
                            Some((bn, bw)) if bn > n || (bn == n && bw >= *w) => Some((bn, bw)),
                            _ => Some((n, *w)),
                        };
                    }
                    best.map_or(params.fill, |(_, w)| w)
                })
                .collect::<Vec<f64>>()
        })
        .collect();

    template.derive(output_data, None)
}

/// x coordinates where a ring crosses the horizontal line at `y`
fn crossings(ring: &LineString<f64>, y: f64, xs: &mut Vec<f64>) {
    for line in ring.lines() {
        let (a, b) = (line.start, line.end);
        if (a.y <= y) != (b.y <= y) {
            xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avasus_core::GeoTransform;
    use geo::polygon;

    fn template(rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, f64::NAN);
        r.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
        r
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    #[test]
    fn test_uncovered_cells_get_fill() {
        let out = rasterize_max_area(&[(3.0, vec![rect(0.0, 40.0, 10.0, 50.0)])], &template(5, 5), &RasterizeParams::default()).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 3.0);
        assert_eq!(out.get(0, 1).unwrap(), 0.0);
        assert_eq!(out.get(4, 4).unwrap(), 0.0);
    }

    #[test]
    fn test_largest_share_wins() {
        // cell (0, 0) spans x 0..10, y 40..50; weight 9 covers 75 % of it
        let layers = vec![
            (3.0, vec![rect(0.0, 40.0, 2.5, 50.0)]),
            (9.0, vec![rect(2.5, 40.0, 10.0, 50.0)]),
        ];
        let out = rasterize_max_area(&layers, &template(5, 5), &RasterizeParams::default()).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 9.0);
    }

    #[test]
    fn test_ties_go_to_larger_weight() {
        let layers = vec![
            (9.0, vec![rect(0.0, 40.0, 5.0, 50.0)]),
            (5.0, vec![rect(5.0, 40.0, 10.0, 50.0)]),
            (3.0, vec![]),
        ];
        let out = rasterize_max_area(&layers, &template(5, 5), &RasterizeParams::default()).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 9.0);
    }

    #[test]
    fn test_holes_are_not_filled() {
        let outer = rect(0.0, 0.0, 50.0, 50.0);
        let hole = rect(20.0, 20.0, 30.0, 30.0);
        let donut = Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()]);
        let out = rasterize_max_area(&[(5.0, vec![donut])], &template(5, 5), &RasterizeParams::default()).unwrap();
        assert_eq!(out.get(2, 2).unwrap(), 0.0);
        assert_eq!(out.get(2, 1).unwrap(), 5.0);
    }

    #[test]
    fn test_overlapping_polygons_of_one_weight() {
        let layers = vec![(1.0, vec![rect(0.0, 0.0, 30.0, 50.0), rect(10.0, 0.0, 50.0, 50.0)])];
        let out = rasterize_max_area(&layers, &template(5, 5), &RasterizeParams::default()).unwrap();
        assert!(out.data().iter().all(|&v| v == 1.0));
    }
}
