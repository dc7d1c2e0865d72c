//! Path-addressable storage for rasters, vector layers and JSON documents
//!
//! Pipeline stages never touch the filesystem directly; they read and write
//! named entries (`"SusceptibilityRaster/BaseLayers/slope_3.tif"`) through a
//! [`Store`]. [`MemoryStore`] keeps everything in process, [`FsStore`] maps
//! names onto files below a root directory.

mod fs;
mod memory;

pub use crate::io::PixelType;
pub use fs::FsStore;
pub use memory::MemoryStore;

use crate::error::{Error, Result};
use crate::raster::{self, Raster};
use crate::vector::VectorLayer;
use globset::{GlobBuilder, GlobMatcher};

/// Storage backend used by the pipeline.
///
/// Methods take `&self` so one store can be shared by tiles processed in
/// parallel; implementations synchronize internally.
pub trait Store: Send + Sync {
    fn read_raster(&self, name: &str) -> Result<Raster<f64>>;

    /// Write a raster, converting cells to `pixel` on the way
    fn write_raster(&self, name: &str, raster: &Raster<f64>, pixel: PixelType) -> Result<()>;

    fn read_vector(&self, name: &str) -> Result<VectorLayer>;

    fn write_vector(&self, name: &str, layer: &VectorLayer) -> Result<()>;

    fn read_json(&self, name: &str) -> Result<serde_json::Value>;

    fn write_json(&self, name: &str, value: &serde_json::Value) -> Result<()>;

    /// Names of all entries matching a glob pattern, sorted
    fn list(&self, pattern: &str) -> Result<Vec<String>>;

    fn exists(&self, name: &str) -> bool;

    /// Mosaic the named rasters into `output` and return the result.
    ///
    /// See [`raster::mosaic`] for the merge rules.
    fn mosaic(&self, inputs: &[String], output: &str, pixel: PixelType) -> Result<Raster<f64>> {
        let tiles = inputs
            .iter()
            .map(|name| self.read_raster(name))
            .collect::<Result<Vec<_>>>()?;
        let merged = raster::mosaic(&tiles)?;
        self.write_raster(output, &merged, pixel)?;
        Ok(merged)
    }
}

/// Glob matcher shared by the stores; `*` does not cross `/`
pub(crate) fn matcher(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| Error::InvalidParameter {
            name: "pattern",
            value: pattern.to_string(),
            reason: e.to_string(),
        })
}
