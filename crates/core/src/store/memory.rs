//! In-process store

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::{matcher, PixelType, Store};
use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::vector::VectorLayer;

#[derive(Debug, Clone)]
enum Entry {
    Raster(Raster<f64>),
    Vector(VectorLayer),
    Json(serde_json::Value),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Raster(_) => "raster",
            Entry::Vector(_) => "vector",
            Entry::Json(_) => "json",
        }
    }
}

/// Store backed by a map of names to entries.
///
/// Rasters are quantized to their pixel type on write so reads see the same
/// values a file round trip would produce.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, name: &str) -> Result<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::store(name, "no such entry"))
    }

    fn put(&self, name: &str, entry: Entry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), entry);
    }
}

impl Store for MemoryStore {
    fn read_raster(&self, name: &str) -> Result<Raster<f64>> {
        match self.get(name)? {
            Entry::Raster(r) => Ok(r),
            other => Err(Error::store(name, format!("expected raster, found {}", other.kind()))),
        }
    }

    fn write_raster(&self, name: &str, raster: &Raster<f64>, pixel: PixelType) -> Result<()> {
        let mut stored = raster.clone().with_nan_nodata();
        stored.data_mut().mapv_inplace(|v| pixel.quantize(v));
        self.put(name, Entry::Raster(stored));
        Ok(())
    }

    fn read_vector(&self, name: &str) -> Result<VectorLayer> {
        match self.get(name)? {
            Entry::Vector(v) => Ok(v),
            other => Err(Error::store(name, format!("expected vector, found {}", other.kind()))),
        }
    }

    fn write_vector(&self, name: &str, layer: &VectorLayer) -> Result<()> {
        self.put(name, Entry::Vector(layer.clone()));
        Ok(())
    }

    fn read_json(&self, name: &str) -> Result<serde_json::Value> {
        match self.get(name)? {
            Entry::Json(v) => Ok(v),
            other => Err(Error::store(name, format!("expected json, found {}", other.kind()))),
        }
    }

    fn write_json(&self, name: &str, value: &serde_json::Value) -> Result<()> {
        self.put(name, Entry::Json(value.clone()));
        Ok(())
    }

    fn list(&self, pattern: &str) -> Result<Vec<String>> {
        let glob = matcher(pattern)?;
        // BTreeMap keys are already sorted
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|k| glob.is_match(k.as_str()))
            .cloned()
            .collect())
    }

    fn exists(&self, name: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
