//! Polygon overlay: dissolve, erase, explode
//!
//! Thin wrappers over `geo`'s boolean operations that work on
//! `MultiPolygon`s and treat empty operands without calling into the
//! overlay engine.

use geo::{BooleanOps, MultiPolygon, Polygon};

/// Union of all polygons into one dissolved multipolygon.
///
/// Merges pairwise in a balanced tree so every boolean operation sees
/// operands of similar size.
pub fn dissolve(polygons: impl IntoIterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    let parts: Vec<MultiPolygon<f64>> = polygons.into_iter().map(|p| MultiPolygon(vec![p])).collect();
    union_all(parts)
}

/// Union of several multipolygons
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    parts.retain(|p| !p.0.is_empty());
    if parts.is_empty() {
        return MultiPolygon(Vec::new());
    }
    while parts.len() > 1 {
        let mut next = Vec::with_capacity(parts.len().div_ceil(2));
        let mut iter = parts.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => next.push(a.union(&b)),
                None => next.push(a),
            }
        }
        parts = next;
    }
    parts.pop().unwrap_or_else(|| MultiPolygon(Vec::new()))
}

/// Parts of `subject` not covered by `eraser`
pub fn erase(subject: &MultiPolygon<f64>, eraser: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if subject.0.is_empty() || eraser.0.is_empty() {
        return subject.clone();
    }
    subject.difference(eraser)
}

/// Split a multipolygon into its single-part polygons
pub fn explode(multi: MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    multi.0
}
