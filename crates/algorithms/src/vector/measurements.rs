//! Area filters

use geo::{Area, Polygon};

/// Keep polygons whose area is at least `min_area`
pub fn filter_min_area(polygons: Vec<Polygon<f64>>, min_area: f64) -> Vec<Polygon<f64>> {
    polygons
        .into_iter()
        .filter(|p| p.unsigned_area() >= min_area)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn square(size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (size, 0.0), (size, size), (0.0, size), (0.0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_filter_min_area_keeps_threshold() {
        let kept = filter_min_area(vec![square(31.0), square(31.7), square(40.0)], 1000.0);
        assert_eq!(kept.len(), 2);
        let exact = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (100.0, 0.0), (100.0, 10.0), (0.0, 10.0), (0.0, 0.0)]),
            vec![],
        );
        assert_eq!(filter_min_area(vec![exact], 1000.0).len(), 1);
    }
}
