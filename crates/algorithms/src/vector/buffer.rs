//! Buffer operations
//!
//! Point buffers are regular polygons approximating a circle. Polygon
//! buffers are the Minkowski sum of the polygon with such a disk, built as
//! the union of the polygon, one rectangle per ring segment and one disk per
//! vertex. For the outward buffers used here this is exact up to the circle
//! approximation, and it needs nothing beyond boolean union.

use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use std::f64::consts::PI;

use super::overlay::{dissolve, erase, union_all};

/// Parameters for buffer operations
#[derive(Debug, Clone)]
pub struct BufferParams {
    /// Buffer distance, must be positive for polygon buffers
    pub distance: f64,
    /// Number of segments per full circle (default: 64)
    pub segments: usize,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            distance: 1.0,
            segments: 64,
        }
    }
}

/// Create a circular buffer around a point.
///
/// Vertices lie on the circle, `segments` of them, first one due east.
pub fn buffer_point(point: &Point<f64>, params: &BufferParams) -> Polygon<f64> {
    circle(point.0, params.distance.abs(), params.segments)
}

fn circle(center: Coord<f64>, r: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let mut coords: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            Coord {
                x: center.x + r * angle.cos(),
                y: center.y + r * angle.sin(),
            }
        })
        .collect();
    coords.push(coords[0]);
    Polygon::new(LineString::new(coords), vec![])
}

/// Pieces whose union is the Minkowski sum of one ring with a disk
fn ring_pieces(ring: &LineString<f64>, r: f64, segments: usize, out: &mut Vec<Polygon<f64>>) {
    for line in ring.lines() {
        let (a, b) = (line.start, line.end);
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        let (nx, ny) = (-dy / len * r, dx / len * r);
        out.push(Polygon::new(
            LineString::from(vec![
                (a.x + nx, a.y + ny),
                (a.x - nx, a.y - ny),
                (b.x - nx, b.y - ny),
                (b.x + nx, b.y + ny),
                (a.x + nx, a.y + ny),
            ]),
            vec![],
        ));
        out.push(circle(a, r, segments));
    }
}

/// Outward buffer of a set of polygons, dissolved into one multipolygon.
///
/// Includes the polygons themselves, so holes narrower than twice the
/// distance close up.
pub fn buffer_polygons(polygons: &[Polygon<f64>], params: &BufferParams) -> MultiPolygon<f64> {
    let r = params.distance.abs();
    if r == 0.0 {
        return dissolve(polygons.iter().cloned());
    }
    let per_polygon: Vec<MultiPolygon<f64>> = polygons
        .iter()
        .map(|poly| {
            let mut pieces = vec![poly.clone()];
            ring_pieces(poly.exterior(), r, params.segments, &mut pieces);
            for hole in poly.interiors() {
                ring_pieces(hole, r, params.segments, &mut pieces);
            }
            dissolve(pieces)
        })
        .collect();
    union_all(per_polygon)
}

/// Outside-only buffer: the area within `distance` of the polygons but
/// not inside any of them.
pub fn outside_buffer(polygons: &[Polygon<f64>], params: &BufferParams) -> MultiPolygon<f64> {
    let buffered = buffer_polygons(polygons, params);
    erase(&buffered, &dissolve(polygons.iter().cloned()))
}
