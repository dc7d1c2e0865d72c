//! Raster to polygon conversion
//!
//! Every 4-connected region of equal-valued cells becomes one polygon whose
//! rings follow the cell edges exactly. Holes are kept. Two cells that only
//! touch at a corner belong to different regions, and where one region's
//! boundary passes through such a corner twice the ring is split there so
//! no ring crosses itself.

use std::collections::HashMap;

use geo::{Coord, LineString, Polygon};
use avasus_core::raster::{GeoTransform, Raster};
use avasus_core::{Error, Result};

/// A connected region of equal cells
#[derive(Debug, Clone)]
pub struct Region {
    /// Cell value shared by the region
    pub value: f64,
    /// Number of cells in the region
    pub cells: usize,
    pub polygon: Polygon<f64>,
}

/// Lattice vertex: (column, row) of a cell corner
type Vertex = (i64, i64);

/// Convert all valid cells of a raster into region polygons.
///
/// No-data cells are background. Regions come out in raster scan order of
/// their first cell.
pub fn polygonize(raster: &Raster<f64>) -> Result<Vec<Region>> {
    let (rows, cols) = raster.shape();
    let value = |r: usize, c: usize| raster.value_at(r as isize, c as isize);

    let mut label = vec![usize::MAX; rows * cols];
    let mut regions = Vec::new();

    for r0 in 0..rows {
        for c0 in 0..cols {
            if label[r0 * cols + c0] != usize::MAX {
                continue;
            }
            let Some(v) = value(r0, c0) else { continue };
            let id = regions.len();

            // flood fill, collecting the region's cells
            let mut cells = Vec::new();
            let mut stack = vec![(r0, c0)];
            label[r0 * cols + c0] = id;
            while let Some((r, c)) = stack.pop() {
                cells.push((r, c));
                let neighbours = [
                    (r.wrapping_sub(1), c),
                    (r + 1, c),
                    (r, c.wrapping_sub(1)),
                    (r, c + 1),
                ];
                for (nr, nc) in neighbours {
                    if nr < rows && nc < cols && label[nr * cols + nc] == usize::MAX && value(nr, nc) == Some(v) {
                        label[nr * cols + nc] = id;
                        stack.push((nr, nc));
                    }
                }
            }

            let inside = |r: i64, c: i64| {
                r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols && label[r as usize * cols + c as usize] == id
            };
            let polygon = trace_region(&cells, inside, raster.transform())?;
            regions.push(Region { value: v, cells: cells.len(), polygon });
        }
    }

    Ok(regions)
}

/// Build the polygon of one region from its boundary edges.
///
/// Edges are directed so the region lies on the side `(dy, -dx)` of each
/// edge direction `(dx, dy)`, which makes exterior rings negative and hole
/// rings positive in lattice orientation.
fn trace_region(
    cells: &[(usize, usize)],
    inside: impl Fn(i64, i64) -> bool,
    transform: &GeoTransform,
) -> Result<Polygon<f64>> {
    let mut edges: Vec<(Vertex, Vertex)> = Vec::new();
    for &(r, c) in cells {
        let (r, c) = (r as i64, c as i64);
        if !inside(r - 1, c) {
            edges.push(((c + 1, r), (c, r)));
        }
        if !inside(r + 1, c) {
            edges.push(((c, r + 1), (c + 1, r + 1)));
        }
        if !inside(r, c - 1) {
            edges.push(((c, r), (c, r + 1)));
        }
        if !inside(r, c + 1) {
            edges.push(((c + 1, r + 1), (c + 1, r)));
        }
    }

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, (from, _)) in edges.iter().enumerate() {
        outgoing.entry(*from).or_default().push(i);
    }

    // Successor of every edge. At a corner shared by two diagonal cells of
    // the region, turn away from the region: each background face then gets
    // its own ring and a pinched pocket becomes a hole touching the shell.
    let next = |e: usize| -> Option<usize> {
        let (from, to) = edges[e];
        let d_in = (to.0 - from.0, to.1 - from.1);
        outgoing.get(&to)?.iter().copied().max_by_key(|&o| {
            let (f, t) = edges[o];
            let d_out = (t.0 - f.0, t.1 - f.1);
            d_in.0 * d_out.1 - d_in.1 * d_out.0
        })
    };

    let mut used = vec![false; edges.len()];
    let mut exteriors: Vec<Vec<Vertex>> = Vec::new();
    let mut holes: Vec<Vec<Vertex>> = Vec::new();
    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut ring = Vec::new();
        let mut e = start;
        loop {
            used[e] = true;
            ring.push(edges[e].0);
            e = next(e).ok_or_else(|| Error::Algorithm("open boundary while tracing region".into()))?;
            if e == start {
                break;
            }
            if used[e] {
                return Err(Error::Algorithm("boundary edges do not form closed rings".into()));
            }
        }
        let ring = drop_collinear(ring);
        if signed_area2(&ring) < 0 {
            exteriors.push(ring);
        } else {
            holes.push(ring);
        }
    }

    let to_line = |ring: &[Vertex]| -> LineString<f64> {
        ring.iter()
            .map(|&(x, y)| {
                let (gx, gy) = transform.lattice_to_geo(x as f64, y as f64);
                Coord { x: gx, y: gy }
            })
            .collect()
    };

    let mut exteriors = exteriors.into_iter();
    let shell = exteriors
        .next()
        .ok_or_else(|| Error::Algorithm("region without exterior ring".into()))?;
    if exteriors.next().is_some() {
        return Err(Error::Algorithm("4-connected region traced to several exteriors".into()));
    }
    let shell = to_line(&shell);

    // every hole of a single region sits inside its one shell
    let interiors = holes.iter().map(|h| to_line(h)).collect();
    Ok(Polygon::new(shell, interiors))
}

/// Keep only the corners of an axis-aligned ring
fn drop_collinear(ring: Vec<Vertex>) -> Vec<Vertex> {
    let n = ring.len();
    let step = |i: usize| {
        let (a, b) = (ring[i % n], ring[(i + 1) % n]);
        ((b.0 - a.0).signum(), (b.1 - a.1).signum())
    };
    (0..n)
        .filter(|&i| step(i + n - 1) != step(i))
        .map(|i| ring[i])
        .collect()
}

/// Twice the signed area of a lattice ring
fn signed_area2(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum()
}
