//! Per-tile failures

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pipeline step a tile failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Terrain,
    Reclassify,
    Ridges,
    Fusion,
    StartZones,
    Store,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Terrain => "terrain",
            Stage::Reclassify => "reclassify",
            Stage::Ridges => "ridges",
            Stage::Fusion => "fusion",
            Stage::StartZones => "start-zones",
            Stage::Store => "store",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure confined to one tile
#[derive(Debug, Error)]
#[error("tile {tile} failed at {stage}: {source}")]
pub struct TileError {
    pub tile: usize,
    pub stage: Stage,
    #[source]
    pub source: avasus_core::Error,
}

impl TileError {
    pub fn new(tile: usize, stage: Stage, source: avasus_core::Error) -> Self {
        Self { tile, stage, source }
    }

    /// Adapter for `map_err`
    pub(crate) fn at(tile: usize, stage: Stage) -> impl Fn(avasus_core::Error) -> Self {
        move |source| Self::new(tile, stage, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_tile_and_stage() {
        let err = TileError::new(2, Stage::StartZones, avasus_core::Error::store("a.tif", "missing"));
        let msg = err.to_string();
        assert!(msg.starts_with("tile 2 failed at start-zones"), "got {}", msg);
        assert!(std::error::Error::source(&err).is_some());
    }
}
