//! Artifact names
//!
//! Every store entry the pipeline reads or writes is named here from a
//! [`TileId`], so tile identity never has to be parsed back out of a path.

use std::fmt;

use serde::{Deserialize, Serialize};
use avasus_core::{Result, Store};

/// A DEM tile: its position in the sorted input listing and its store name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub index: usize,
    pub source: String,
}

impl TileId {
    pub fn new(index: usize, source: impl Into<String>) -> Self {
        Self {
            index,
            source: source.into(),
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index, self.source)
    }
}

/// List the DEM tiles matching `pattern`, numbered in name order.
pub fn discover_tiles(store: &dyn Store, pattern: &str) -> Result<Vec<TileId>> {
    Ok(store
        .list(pattern)?
        .into_iter()
        .enumerate()
        .map(|(index, source)| TileId::new(index, source))
        .collect())
}

const SUSCEPTIBILITY: &str = "SusceptibilityRaster";
const BASE: &str = "SusceptibilityRaster/BaseLayers";
const RECLASS: &str = "SusceptibilityRaster/ReclassifiedLayers";
const SCRATCH: &str = "SusceptibilityRaster/DeleteMe";
const FINALS: &str = "SusceptibilityRaster/Finals";
const TRAPS: &str = "TerrainTraps";
const STARTS: &str = "StartPolys";

/// Names of pipeline artifacts below an optional root prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    root: String,
}

impl Layout {
    /// Layout below `root`; an empty root puts artifacts at the top of the store.
    pub fn new(root: impl Into<String>) -> Self {
        let root: String = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn join(&self, rel: String) -> String {
        if self.root.is_empty() {
            rel
        } else {
            format!("{}/{}", self.root, rel)
        }
    }

    fn base(&self, stem: &str, tile: &TileId, ext: &str) -> String {
        self.join(format!("{BASE}/{stem}_{}.{ext}", tile.index))
    }

    fn reclass(&self, stem: &str, tile: &TileId) -> String {
        self.join(format!("{RECLASS}/{stem}_{}.tif", tile.index))
    }

    pub fn slope(&self, tile: &TileId) -> String {
        self.base("slope", tile, "tif")
    }

    pub fn aspect(&self, tile: &TileId) -> String {
        self.base("aspect", tile, "tif")
    }

    pub fn vrm(&self, tile: &TileId) -> String {
        self.base("vrm", tile, "tif")
    }

    pub fn tpi(&self, tile: &TileId) -> String {
        self.base("TPI", tile, "tif")
    }

    /// Ridge mask raster
    pub fn ridges(&self, tile: &TileId) -> String {
        self.base("Ridges", tile, "tif")
    }

    /// Vectorized ridge mask with `Weight`
    pub fn poly_ridges(&self, tile: &TileId) -> String {
        self.base("PolyRidges", tile, "json")
    }

    pub fn slope_reclass(&self, tile: &TileId) -> String {
        self.reclass("SlopeReclass", tile)
    }

    pub fn connected_reclass(&self, tile: &TileId) -> String {
        self.reclass("ConnectedReclass", tile)
    }

    pub fn aspect_reclass(&self, tile: &TileId) -> String {
        self.reclass("AspectReclass", tile)
    }

    pub fn vrm_reclass(&self, tile: &TileId) -> String {
        self.reclass("vrmReclass", tile)
    }

    /// Max-area rasterized ridge weights
    pub fn dist_to_ridges(&self, tile: &TileId) -> String {
        self.reclass("DistToRidges", tile)
    }

    pub fn inner_ring(&self, tile: &TileId) -> String {
        self.join(format!("{SCRATCH}/Ridges_80m_{}.json", tile.index))
    }

    pub fn outer_ring(&self, tile: &TileId) -> String {
        self.join(format!("{SCRATCH}/Ridges_100m_Erased_{}.json", tile.index))
    }

    /// Ridges and both rings merged
    pub fn ridge_distance_vector(&self, tile: &TileId) -> String {
        self.join(format!("{SCRATCH}/DistToRidges_{}.json", tile.index))
    }

    pub fn start_split(&self, tile: &TileId) -> String {
        self.join(format!("{FINALS}/FinalStartSplits/startsusceptibility_{}.tif", tile.index))
    }

    pub fn connect_split(&self, tile: &TileId) -> String {
        self.join(format!("{FINALS}/FinalConnectSplits/connectsusceptibility_{}.tif", tile.index))
    }

    pub fn full_start(&self) -> String {
        self.join(format!("{FINALS}/FULL_startsuceptibility.tif"))
    }

    pub fn full_connect(&self) -> String {
        self.join(format!("{FINALS}/FULL_connectsuceptibility.tif"))
    }

    pub fn gullies_split(&self, tile: &TileId) -> String {
        self.join(format!("{TRAPS}/Splits/Gullies_{}.tif", tile.index))
    }

    pub fn steep_falls_split(&self, tile: &TileId) -> String {
        self.join(format!("{TRAPS}/Splits/SteepFalls_{}.tif", tile.index))
    }

    pub fn full_gullies(&self) -> String {
        self.join(format!("{TRAPS}/FULL_Gullies.tif"))
    }

    pub fn full_steep_falls(&self) -> String {
        self.join(format!("{TRAPS}/FULL_SteepFalls.tif"))
    }

    fn starts_dir(radius: f64) -> String {
        format!("{STARTS}/{}mR", radius)
    }

    pub fn fishnet(&self, radius: f64, tile: &TileId) -> String {
        self.join(format!("{}/Fishnets/Fishnet_{}.json", Self::starts_dir(radius), tile.index))
    }

    pub fn fishnet_labels(&self, radius: f64, tile: &TileId) -> String {
        self.join(format!("{}/Fishnets/Fishnet_{}_label.json", Self::starts_dir(radius), tile.index))
    }

    pub fn start_zones(&self, radius: f64, tile: &TileId) -> String {
        self.join(format!("{}/StartsFINAL_{}.json", Self::starts_dir(radius), tile.index))
    }

    /// Per-tile records of a susceptibility run
    pub fn manifest(&self) -> String {
        self.join(format!("{SUSCEPTIBILITY}/tiles.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avasus_core::{MemoryStore, Raster, PixelType};

    #[test]
    fn test_names_carry_tile_index() {
        let layout = Layout::new("");
        let tile = TileId::new(3, "dems/dem_a.tif");
        assert_eq!(layout.slope(&tile), "SusceptibilityRaster/BaseLayers/slope_3.tif");
        assert_eq!(layout.poly_ridges(&tile), "SusceptibilityRaster/BaseLayers/PolyRidges_3.json");
        assert_eq!(
            layout.start_split(&tile),
            "SusceptibilityRaster/Finals/FinalStartSplits/startsusceptibility_3.tif"
        );
        assert_eq!(layout.start_zones(160.0, &tile), "StartPolys/160mR/StartsFINAL_3.json");
        assert_eq!(layout.fishnet_labels(160.0, &tile), "StartPolys/160mR/Fishnets/Fishnet_3_label.json");
    }

    #[test]
    fn test_root_prefix_is_joined_once() {
        let layout = Layout::new("out/");
        assert_eq!(layout.full_gullies(), "out/TerrainTraps/FULL_Gullies.tif");
        assert_eq!(layout.manifest(), "out/SusceptibilityRaster/tiles.json");
    }

    #[test]
    fn test_discovery_numbers_tiles_in_name_order() {
        let store = MemoryStore::new();
        let r = Raster::filled(2, 2, 1.0);
        for name in ["dem/tile_b.tif", "dem/tile_a.tif", "other/x.tif"] {
            store.write_raster(name, &r, PixelType::Float32).unwrap();
        }
        let tiles = discover_tiles(&store, "dem/*.tif").unwrap();
        assert_eq!(
            tiles,
            vec![TileId::new(0, "dem/tile_a.tif"), TileId::new(1, "dem/tile_b.tif")]
        );
    }
}
