//! Ridge and gully extraction
//!
//! Ridges are cells whose TPI reaches one standard deviation of the tile's
//! TPI; gullies fall below `mean - std`. The ridge mask is vectorized and
//! wrapped in two outside-only rings, and the three layers are burnt into a
//! ridge-distance raster by largest covered area.

use geo::{Geometry, MultiPolygon, Polygon};
use tracing::{debug, warn};
use avasus_core::raster::Raster;
use avasus_core::{Feature, Result, VectorLayer};

use crate::algebra::{reclassify, ReclassEntry, ReclassifyParams};
use crate::terrain::{tpi, TpiParams};
use crate::vector::{erase, outside_buffer, polygonize, rasterize_max_area, BufferParams, RasterizeParams};

use super::config::{AvalancheConfig, DegenerateTpi};

/// Name of the class attribute on ridge layers
pub const WEIGHT_FIELD: &str = "Weight";

/// Standard deviations below this count as zero
const DEGENERATE_STD: f64 = 1e-9;

/// Global TPI statistics of one tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpiStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl TpiStats {
    /// Mean and population standard deviation of the valid TPI cells,
    /// NaN for both when the raster has none.
    pub fn of(tpi: &Raster<f64>) -> Self {
        let stats = tpi.statistics();
        Self {
            mean: stats.mean.unwrap_or(f64::NAN),
            std_dev: stats.std_dev.unwrap_or(f64::NAN),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.std_dev > DEGENERATE_STD)
    }

    /// Upper bound (exclusive) of the gully range.
    ///
    /// Capped at `std_dev` so a cell can never be both ridge and gully.
    pub fn gully_upper(&self) -> f64 {
        (self.mean - self.std_dev).min(self.std_dev)
    }
}

/// Ridge and gully masks: 1 inside, NaN elsewhere
#[derive(Debug, Clone)]
pub struct RidgeMasks {
    pub ridges: Raster<f64>,
    pub gullies: Raster<f64>,
    pub stats: TpiStats,
    /// Set when the standard deviation was zero or undefined
    pub degenerate: bool,
}

/// Threshold a TPI raster into ridge and gully masks.
pub fn ridge_masks(tpi: &Raster<f64>, policy: DegenerateTpi) -> Result<RidgeMasks> {
    let stats = TpiStats::of(tpi);
    let degenerate = stats.is_degenerate();
    if degenerate {
        warn!(std_dev = stats.std_dev, ?policy, "degenerate TPI statistics");
    }

    if stats.std_dev.is_nan() || (degenerate && policy == DegenerateTpi::EmptyMasks) {
        let mut empty = tpi.like(f64::NAN);
        empty.set_nodata(Some(f64::NAN));
        return Ok(RidgeMasks {
            ridges: empty.clone(),
            gullies: empty,
            stats,
            degenerate,
        });
    }

    let ridges = reclassify(
        tpi,
        &ReclassifyParams::new(vec![ReclassEntry::new(stats.std_dev, f64::INFINITY, 1.0)]),
    )?;
    let gullies = reclassify(
        tpi,
        &ReclassifyParams {
            classes: vec![ReclassEntry::new(f64::NEG_INFINITY, stats.gully_upper(), 1.0)],
            last_inclusive: false,
        },
    )?;

    Ok(RidgeMasks {
        ridges,
        gullies,
        stats,
        degenerate,
    })
}

/// Everything the ridge stage produces for one tile
#[derive(Debug, Clone)]
pub struct RidgeProducts {
    pub tpi: Raster<f64>,
    pub masks: RidgeMasks,
    /// Vectorized ridge regions
    pub ridges: VectorLayer,
    /// Outside ring out to the inner distance
    pub inner_ring: VectorLayer,
    /// Outside ring between the inner and outer distance
    pub outer_ring: VectorLayer,
    /// Ridge weights burnt on the DEM grid, 0 where nothing is near a ridge
    pub distance: Raster<f64>,
}

impl RidgeProducts {
    /// Ridges and both rings in one layer, each feature keeping its `Weight`
    pub fn merged(&self) -> VectorLayer {
        self.ridges
            .iter()
            .chain(self.inner_ring.iter())
            .chain(self.outer_ring.iter())
            .cloned()
            .collect::<VectorLayer>()
            .with_crs(self.ridges.crs.clone())
    }
}

fn weighted_layer(polygons: Vec<Polygon<f64>>, weight: i64, template: &Raster<f64>) -> VectorLayer {
    let mut layer = VectorLayer::from_polygons(polygons).with_crs(template.crs().cloned());
    layer.set_all(WEIGHT_FIELD, weight);
    layer
}

/// One dissolved ring as a single multipart feature
fn ring_layer(ring: MultiPolygon<f64>, weight: i64, template: &Raster<f64>) -> VectorLayer {
    let mut layer = VectorLayer::new().with_crs(template.crs().cloned());
    if !ring.0.is_empty() {
        layer.push(Feature::new(Geometry::MultiPolygon(ring)).with_property(WEIGHT_FIELD, weight));
    }
    layer
}

/// Run TPI, thresholding, vectorization, ring buffering and rasterization.
pub fn extract_ridges(dem: &Raster<f64>, config: &AvalancheConfig) -> Result<RidgeProducts> {
    let tpi = tpi(dem, TpiParams { radius: config.tpi_radius })?;
    let masks = ridge_masks(&tpi, config.degenerate_tpi)?;

    let polygons: Vec<Polygon<f64>> = polygonize(&masks.ridges)?
        .into_iter()
        .map(|region| region.polygon)
        .collect();
    debug!(regions = polygons.len(), "vectorized ridge mask");

    let buffer = |distance| BufferParams {
        distance,
        segments: config.buffer_segments,
    };
    let inner = outside_buffer(&polygons, &buffer(config.inner_distance));
    let outer = erase(&outside_buffer(&polygons, &buffer(config.outer_distance)), &inner);

    let w = config.ridge_weights;
    let distance = rasterize_max_area(
        &[
            (w.ridge as f64, polygons.clone()),
            (w.inner as f64, inner.0.clone()),
            (w.outer as f64, outer.0.clone()),
        ],
        dem,
        &RasterizeParams {
            subsamples: config.subsamples,
            fill: 0.0,
        },
    )?;

    Ok(RidgeProducts {
        tpi,
        masks,
        ridges: weighted_layer(polygons, w.ridge, dem),
        inner_ring: ring_layer(inner, w.inner, dem),
        outer_ring: ring_layer(outer, w.outer, dem),
        distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, BooleanOps};
    use crate::terrain::test_dems::{dem_from, flat};

    /// 60×60 cells of 10 m with a 3-cell (30 m) wide ridge along columns 29..=31
    fn ridge_dem() -> Raster<f64> {
        dem_from(60, 10.0, |_, c| if (29..=31).contains(&c) { 1550.0 } else { 1500.0 })
    }

    #[test]
    fn test_flat_dem_gives_empty_masks() {
        let dem = flat(10);
        let products = extract_ridges(&dem, &AvalancheConfig::default()).unwrap();
        assert!(products.masks.degenerate);
        assert!(products.masks.ridges.data().iter().all(|v| v.is_nan()));
        assert!(products.masks.gullies.data().iter().all(|v| v.is_nan()));
        assert!(products.ridges.is_empty());
        assert!(products.distance.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_keep_threshold_marks_flat_cells_as_ridge() {
        let tpi = flat(4).like(0.0);
        let masks = ridge_masks(&tpi, DegenerateTpi::KeepThreshold).unwrap();
        assert!(masks.degenerate);
        assert!(masks.ridges.data().iter().all(|&v| v == 1.0));
        assert!(masks.gullies.data().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_masks_are_disjoint() {
        // mean well above std: mean - std would exceed the ridge cutoff
        let tpi = dem_from(4, 10.0, |r, c| 10.0 + (r * 4 + c) as f64 * 0.1);
        let masks = ridge_masks(&tpi, DegenerateTpi::EmptyMasks).unwrap();
        for (r, g) in masks.ridges.data().iter().zip(masks.gullies.data().iter()) {
            assert!(r.is_nan() || g.is_nan(), "cell in both masks");
        }
        assert!(masks.stats.gully_upper() <= masks.stats.std_dev);
    }

    #[test]
    fn test_gully_bound_is_capped_at_std_dev() {
        let centered = TpiStats { mean: 0.0, std_dev: 2.0 };
        assert_eq!(centered.gully_upper(), -2.0);
        let shifted = TpiStats { mean: 5.0, std_dev: 1.0 };
        assert_eq!(shifted.gully_upper(), 1.0);
    }

    #[test]
    fn test_isolated_ridge_gets_rings_and_weights() {
        let dem = ridge_dem();
        let products = extract_ridges(&dem, &AvalancheConfig::default()).unwrap();

        let ridge_cells = products.masks.ridges.data().iter().filter(|v| **v == 1.0).count();
        assert_eq!(ridge_cells, 60 * 3);
        assert_eq!(products.ridges.len(), 1);

        let inner = products.inner_ring.to_multipolygon();
        let outer = products.outer_ring.to_multipolygon();
        let overlap = inner.intersection(&outer).unsigned_area();
        assert!(overlap < 1e-6, "rings overlap by {}", overlap);

        let d = products.distance.data();
        // columns: ridge 29..=31, inner ring 21..=28 and 32..=39, outer ring 19..=20 and 40..=41
        assert_eq!(d[[30, 30]], 3.0);
        assert_eq!(d[[30, 25]], 9.0);
        assert_eq!(d[[30, 35]], 9.0);
        assert_eq!(d[[30, 20]], 5.0);
        assert_eq!(d[[30, 40]], 5.0);
        assert_eq!(d[[30, 10]], 0.0);
        for w in [3.0, 9.0, 5.0] {
            assert!(d.iter().any(|&v| v == w), "missing weight {}", w);
        }
    }

    #[test]
    fn test_merged_layer_keeps_weights() {
        let products = extract_ridges(&ridge_dem(), &AvalancheConfig::default()).unwrap();
        let merged = products.merged();
        let mut weights: Vec<f64> = merged.iter().filter_map(|f| f.get_f64(WEIGHT_FIELD)).collect();
        weights.sort_by(f64::total_cmp);
        assert_eq!(weights, vec![3.0, 5.0, 9.0]);
    }
}
