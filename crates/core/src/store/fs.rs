//! Directory-backed store

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::{matcher, PixelType, Store};
use crate::error::{Error, Result};
use crate::io::{read_geotiff, write_geotiff};
use crate::raster::Raster;
use crate::vector::VectorLayer;

/// Store rooted at a directory.
///
/// Names are `/`-separated paths relative to the root; absolute paths are
/// used as given. Rasters are GeoTIFF, vector layers and documents JSON.
/// Every write lands in a sibling temporary file first and is renamed into
/// place, so readers never observe a half-written entry.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of an entry
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn name_of(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => path.to_string_lossy().into_owned(),
        }
    }

    fn write_atomic(&self, name: &str, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
        let path = self.path_of(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::store(name, e))?;
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| Error::store(name, "entry name has no file component"))?
            .to_string_lossy();
        let partial = path.with_file_name(format!(".{}.partial", file_name));
        if let Err(e) = write(&partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::rename(&partial, &path).map_err(|e| Error::store(name, e))?;
        debug!(entry = name, "wrote");
        Ok(())
    }

    fn read_text(&self, name: &str) -> Result<String> {
        fs::read_to_string(self.path_of(name)).map_err(|e| Error::store(name, e))
    }
}

impl Store for FsStore {
    fn read_raster(&self, name: &str) -> Result<Raster<f64>> {
        read_geotiff(self.path_of(name)).map_err(|e| match e {
            e @ Error::Store { .. } => e,
            other => Error::store(name, other),
        })
    }

    fn write_raster(&self, name: &str, raster: &Raster<f64>, pixel: PixelType) -> Result<()> {
        self.write_atomic(name, |path| write_geotiff(raster, path, pixel))
    }

    fn read_vector(&self, name: &str) -> Result<VectorLayer> {
        serde_json::from_str(&self.read_text(name)?).map_err(|e| Error::store(name, e))
    }

    fn write_vector(&self, name: &str, layer: &VectorLayer) -> Result<()> {
        let text = serde_json::to_string(layer).map_err(|e| Error::store(name, e))?;
        self.write_atomic(name, |path| Ok(fs::write(path, text)?))
    }

    fn read_json(&self, name: &str) -> Result<serde_json::Value> {
        serde_json::from_str(&self.read_text(name)?).map_err(|e| Error::store(name, e))
    }

    fn write_json(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(|e| Error::store(name, e))?;
        self.write_atomic(name, |path| Ok(fs::write(path, text)?))
    }

    fn list(&self, pattern: &str) -> Result<Vec<String>> {
        let glob = matcher(pattern)?;
        // walk from the deepest directory that has no glob syntax in it
        let parts: Vec<&str> = pattern.split('/').collect();
        let literal = parts
            .iter()
            .take(parts.len().saturating_sub(1))
            .take_while(|p| !p.contains(['*', '?', '[', '{']))
            .count();
        let base = self.path_of(&parts[..literal].join("/"));
        let recursive = pattern.contains("**");
        let depth = if recursive { usize::MAX } else { parts.len() - literal };

        let mut names: Vec<String> = WalkDir::new(&base)
            .min_depth(1)
            .max_depth(depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| self.name_of(e.path()))
            .filter(|n| !n.rsplit('/').next().is_some_and(|f| f.ends_with(".partial")))
            .filter(|n| glob.is_match(n.as_str()))
            .collect();
        names.sort();
        Ok(names)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GeoTransform;
    use crate::vector::Feature;
    use geo_types::polygon;

    fn dem() -> Raster<f64> {
        let mut r = Raster::from_vec((0..12).map(f64::from).collect(), 3, 4).unwrap();
        r.set_transform(GeoTransform::new(100.0, 300.0, 5.0, -5.0));
        r
    }

    #[test]
    fn test_raster_roundtrip_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        store
            .write_raster("SusceptibilityRaster/BaseLayers/slope_0.tif", &dem(), PixelType::Float32)
            .unwrap();
        let back = store.read_raster("SusceptibilityRaster/BaseLayers/slope_0.tif").unwrap();
        assert_eq!(back.get(2, 3).unwrap(), 11.0);
        assert_eq!(back.transform().origin_y, 300.0);
        assert!(!dir.path().join("SusceptibilityRaster/BaseLayers/.slope_0.tif.partial").exists());
    }

    #[test]
    fn test_list_matches_one_directory_level() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        for name in ["DEMs/t2.tif", "DEMs/t1.tif", "DEMs/old/t0.tif"] {
            store.write_raster(name, &dem(), PixelType::Float32).unwrap();
        }
        store.write_json("DEMs/notes.json", &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(store.list("DEMs/*.tif").unwrap(), vec!["DEMs/t1.tif", "DEMs/t2.tif"]);
        assert_eq!(store.list("DEMs/**/*.tif").unwrap().len(), 3);
        assert!(store.list("nothing/*.tif").unwrap().is_empty());
    }

    #[test]
    fn test_vector_and_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let layer: VectorLayer = vec![Feature::new(
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        )
        .with_property("weight", 9i64)]
        .into_iter()
        .collect();
        store.write_vector("PolyRidges_0.json", &layer).unwrap();
        assert_eq!(store.read_vector("PolyRidges_0.json").unwrap(), layer);

        store.write_json("tiles.json", &serde_json::json!([1, 2])).unwrap();
        assert_eq!(store.read_json("tiles.json").unwrap()[1], 2);
        assert!(store.exists("tiles.json"));
    }

    #[test]
    fn test_read_missing_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(matches!(store.read_raster("missing.tif"), Err(Error::Store { .. })));
        assert!(matches!(store.read_vector("missing.json"), Err(Error::Store { .. })));
    }
}
