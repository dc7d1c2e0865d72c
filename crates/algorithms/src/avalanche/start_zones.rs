//! Start-zone polygon generation
//!
//! A fishnet of `start_radius` cells is laid over the tile. Every cell
//! center that touches the susceptible area is buffered by `start_radius`,
//! the tile's ridges and the non-susceptible part of the study area are cut
//! away, and the single-part pieces that are large enough and lie entirely
//! inside the study area are kept.

use geo::{Area, Intersects, MultiPolygon, Polygon};
use tracing::debug;
use avasus_core::raster::Raster;
use avasus_core::{Feature, Result, VectorLayer, CRS};

use crate::algebra::band_math;
use crate::maybe_rayon::*;
use crate::vector::{
    buffer_point, dissolve, erase, explode, filter_min_area, fishnet, polygonize, BoundingBox,
    BufferParams, Fishnet,
};

use super::config::AvalancheConfig;

/// Tile index attribute on start-zone features
pub const TILE_FIELD: &str = "tile";
/// Area attribute on start-zone features
pub const AREA_FIELD: &str = "POLY_AREA";

/// Area outside the study area tolerated as overlay noise, relative to the polygon
const CONTAINMENT_SLACK: f64 = 1e-6;

/// Start zones of one tile with the intermediate layers
#[derive(Debug, Clone)]
pub struct StartZones {
    pub fishnet: Fishnet,
    /// Susceptible regions that passed the area filter
    pub susceptible: MultiPolygon<f64>,
    pub zones: Vec<Polygon<f64>>,
}

/// Vectorize every valid susceptibility cell and drop regions below `min_area`.
pub fn susceptible_area(susceptibility: &Raster<f64>, min_area: f64) -> Result<MultiPolygon<f64>> {
    let binary = band_math(susceptibility, |_| 1.0)?;
    let regions: Vec<Polygon<f64>> = polygonize(&binary)?.into_iter().map(|r| r.polygon).collect();
    Ok(MultiPolygon(filter_min_area(regions, min_area)))
}

/// Whether `polygon` lies inside `study_area`, up to overlay noise
fn contained(study_area: &MultiPolygon<f64>, polygon: &Polygon<f64>) -> bool {
    let outside = erase(&MultiPolygon(vec![polygon.clone()]), study_area).unsigned_area();
    outside <= CONTAINMENT_SLACK * polygon.unsigned_area()
}

/// Carve the start zones of one tile.
///
/// `ridges` are the tile's ridge polygons; `study_area` is the authoritative
/// boundary. Polygons crossing the study-area boundary are rejected, not clipped.
pub fn start_zones(
    susceptibility: &Raster<f64>,
    ridges: &[Polygon<f64>],
    study_area: &MultiPolygon<f64>,
    config: &AvalancheConfig,
) -> Result<StartZones> {
    let extent = BoundingBox::from_bounds(susceptibility.bounds());
    let net = fishnet(&extent, config.start_radius)?;
    let susceptible = susceptible_area(susceptibility, config.min_area)?;
    if susceptible.0.is_empty() {
        debug!("no susceptible region above the minimum area");
        return Ok(StartZones {
            fishnet: net,
            susceptible,
            zones: Vec::new(),
        });
    }

    let ridges = dissolve(ridges.iter().cloned());
    let outside_susceptible = erase(study_area, &dissolve(susceptible.0.iter().cloned()));
    let params = BufferParams {
        distance: config.start_radius,
        segments: config.buffer_segments,
    };

    let zones: Vec<Polygon<f64>> = (0..net.labels.len())
        .into_par_iter()
        .filter(|&i| susceptible.intersects(&net.labels[i]))
        .flat_map(|i| {
            let disk = MultiPolygon(vec![buffer_point(&net.labels[i], &params)]);
            let carved = erase(&erase(&disk, &ridges), &outside_susceptible);
            filter_min_area(explode(carved), config.min_area)
                .into_iter()
                .filter(|p| contained(study_area, p))
                .collect::<Vec<_>>()
        })
        .collect();
    debug!(
        labels = net.labels.len(),
        regions = susceptible.0.len(),
        zones = zones.len(),
        "carved start zones"
    );

    Ok(StartZones {
        fishnet: net,
        susceptible,
        zones,
    })
}

/// Start-zone features carrying tile index and area
pub fn zone_layer(tile: usize, zones: &[Polygon<f64>], crs: Option<CRS>) -> VectorLayer {
    zones
        .iter()
        .map(|p| {
            Feature::new(p.clone())
                .with_property(TILE_FIELD, tile as i64)
                .with_property(AREA_FIELD, p.unsigned_area())
        })
        .collect::<VectorLayer>()
        .with_crs(crs)
}

/// Fishnet cells and center labels as two layers
pub fn fishnet_layers(net: &Fishnet, crs: Option<CRS>) -> (VectorLayer, VectorLayer) {
    let cells = VectorLayer::from_polygons(net.cells.iter().cloned()).with_crs(crs.clone());
    let labels = net
        .labels
        .iter()
        .map(|p| Feature::new(*p))
        .collect::<VectorLayer>()
        .with_crs(crs);
    (cells, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BooleanOps, CoordsIter};
    use crate::terrain::test_dems::dem_from;

    /// 40×40 cells of 10 m, valid everywhere
    fn susceptibility() -> Raster<f64> {
        dem_from(40, 10.0, |_, _| 20.0)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![BoundingBox::new(x0, y0, x1, y1).to_polygon()])
    }

    fn assert_inside(zones: &[Polygon<f64>], x0: f64, y0: f64, x1: f64, y1: f64) {
        for z in zones {
            for c in z.exterior_coords_iter() {
                assert!(
                    c.x >= x0 - 1e-6 && c.x <= x1 + 1e-6 && c.y >= y0 - 1e-6 && c.y <= y1 + 1e-6,
                    "vertex ({}, {}) outside",
                    c.x,
                    c.y
                );
            }
        }
    }

    #[test]
    fn test_zones_follow_susceptible_area() {
        let config = AvalancheConfig::default();
        let study = rect(-1000.0, -1000.0, 1400.0, 1400.0);
        let result = start_zones(&susceptibility(), &[], &study, &config).unwrap();

        assert_eq!((result.fishnet.rows, result.fishnet.cols), (3, 3));
        assert_eq!(result.zones.len(), 9);
        assert!(result.zones.iter().all(|z| z.unsigned_area() >= config.min_area));
        assert_inside(&result.zones, 0.0, 0.0, 400.0, 400.0);
    }

    #[test]
    fn test_zones_crossing_study_boundary_are_rejected() {
        let config = AvalancheConfig::default();
        // study area covers only the lower half of the tile
        let study = rect(0.0, 0.0, 400.0, 200.0);
        let result = start_zones(&susceptibility(), &[], &study, &config).unwrap();
        assert!(result.zones.is_empty(), "got {} zones", result.zones.len());
    }

    #[test]
    fn test_ridges_are_cut_out() {
        let config = AvalancheConfig::default();
        let study = rect(-1000.0, -1000.0, 1400.0, 1400.0);
        let ridge = BoundingBox::new(190.0, 0.0, 210.0, 400.0).to_polygon();
        let result = start_zones(&susceptibility(), &[ridge.clone()], &study, &config).unwrap();

        assert!(!result.zones.is_empty());
        let ridge = MultiPolygon(vec![ridge]);
        for z in &result.zones {
            let overlap = MultiPolygon(vec![z.clone()]).intersection(&ridge).unsigned_area();
            assert!(overlap < 1e-6, "zone overlaps ridge by {}", overlap);
        }
    }

    #[test]
    fn test_small_susceptible_patches_give_no_zones() {
        // 3×3 valid cells: 900 m² < 1000 m²
        let s = dem_from(40, 10.0, |r, c| if r < 3 && c < 3 { 20.0 } else { f64::NAN });
        let study = rect(-1000.0, -1000.0, 1400.0, 1400.0);
        let result = start_zones(&s, &[], &study, &AvalancheConfig::default()).unwrap();
        assert!(result.susceptible.0.is_empty());
        assert!(result.zones.is_empty());
    }

    #[test]
    fn test_zone_layer_carries_tile_and_area() {
        let p = BoundingBox::new(0.0, 0.0, 50.0, 40.0).to_polygon();
        let layer = zone_layer(4, &[p], None);
        let f = layer.iter().next().unwrap();
        assert_eq!(f.get_f64(TILE_FIELD), Some(4.0));
        assert_eq!(f.get_f64(AREA_FIELD), Some(2000.0));
    }
}
