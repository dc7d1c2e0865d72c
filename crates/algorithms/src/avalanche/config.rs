//! Pipeline configuration
//!
//! Every breakpoint table, window size, distance and weight of the avalanche
//! pipeline lives here. `Default` gives the published constants; a JSON file
//! with any subset of the fields overrides them.

use serde::{Deserialize, Serialize};
use avasus_core::{Error, Result};

use crate::algebra::{ReclassEntry, ReclassifyParams};

/// What to do when the TPI of a tile has zero standard deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateTpi {
    /// Ridge and gully masks are left entirely no-data
    #[default]
    EmptyMasks,
    /// Apply the thresholds as computed (ridge = TPI ≥ 0)
    KeepThreshold,
}

/// Weights of the linear susceptibility combination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    /// Slope class (start or connected table)
    pub slope: f64,
    pub vrm: f64,
    pub aspect: f64,
    /// Ridge-distance class
    pub ridge: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            slope: 1.0,
            vrm: 0.5,
            aspect: 0.5,
            ridge: 0.5,
        }
    }
}

/// `Weight` attribute of the ridge layers, burnt into the ridge-distance raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeWeights {
    /// Ridge polygons themselves
    pub ridge: i64,
    /// Ring from the ridge edge out to `inner_distance`
    pub inner: i64,
    /// Ring from `inner_distance` out to `outer_distance`
    pub outer: i64,
}

impl Default for RidgeWeights {
    fn default() -> Self {
        Self {
            ridge: 3,
            inner: 9,
            outer: 5,
        }
    }
}

/// Breakpoint tables of the reclassification stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclassTables {
    /// Slope (degrees) to start-zone weight
    pub slope_start: ReclassifyParams,
    /// Slope (degrees) to connected-slope weight
    pub slope_connected: ReclassifyParams,
    /// Slope (degrees) to the steep-fall terrain trap
    pub steep_falls: ReclassifyParams,
    /// Aspect (degrees) to an 8-direction weight
    pub aspect: ReclassifyParams,
    pub vrm: ReclassifyParams,
}

impl Default for ReclassTables {
    fn default() -> Self {
        let e = ReclassEntry::new;
        Self {
            slope_start: ReclassifyParams::new(vec![
                ReclassEntry::nodata(0.0, 28.0),
                e(28.0, 30.0, 4.0),
                e(30.0, 35.0, 7.0),
                e(35.0, 45.0, 9.0),
                e(45.0, 90.0, 7.0),
            ]),
            slope_connected: ReclassifyParams::new(vec![e(12.0, 25.0, 4.0), e(25.0, 28.0, 9.0)]),
            steep_falls: ReclassifyParams::new(vec![e(50.0, 90.0, 1.0)]),
            aspect: ReclassifyParams::new(vec![
                e(0.0, 22.5, 9.0),
                e(22.5, 67.5, 6.0),
                e(67.5, 112.5, 1.0),
                e(112.5, 157.5, 4.0),
                e(157.5, 202.5, 6.0),
                e(202.5, 247.5, 2.0),
                e(247.5, 292.5, 1.0),
                e(292.5, 337.5, 4.0),
                e(337.5, 360.0, 9.0),
            ]),
            vrm: ReclassifyParams::new(vec![
                e(0.0, 0.001, 9.0),
                e(0.001, 0.0034, 7.0),
                e(0.0034, 0.0057, 5.0),
                e(0.0057, 0.02, 1.0),
                e(0.02, 1.0, 0.0),
            ]),
        }
    }
}

/// Configuration of the whole avalanche pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvalancheConfig {
    pub tables: ReclassTables,
    /// VRM window side in cells
    pub vrm_window: usize,
    /// TPI circle radius in map units
    pub tpi_radius: f64,
    /// Outer edge of the first ridge ring, map units
    pub inner_distance: f64,
    /// Outer edge of the second ridge ring, map units
    pub outer_distance: f64,
    pub ridge_weights: RidgeWeights,
    pub fusion: FusionWeights,
    /// Start-zone buffer radius, also the fishnet cell size
    pub start_radius: f64,
    /// Smallest polygon kept by the start-zone generator, square map units
    pub min_area: f64,
    /// Segments per full circle in buffers
    pub buffer_segments: usize,
    /// Samples per cell side in max-area rasterization
    pub subsamples: usize,
    pub degenerate_tpi: DegenerateTpi,
}

impl Default for AvalancheConfig {
    fn default() -> Self {
        Self {
            tables: ReclassTables::default(),
            vrm_window: 5,
            tpi_radius: 200.0,
            inner_distance: 80.0,
            outer_distance: 100.0,
            ridge_weights: RidgeWeights::default(),
            fusion: FusionWeights::default(),
            start_radius: 160.0,
            min_area: 1000.0,
            buffer_segments: 64,
            subsamples: 4,
            degenerate_tpi: DegenerateTpi::EmptyMasks,
        }
    }
}

impl AvalancheConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::InvalidParameter {
            name: "config",
            value: "<json>".into(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no stage can work with.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &'static str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidParameter {
                    name,
                    value: v.to_string(),
                    reason: "must be positive".into(),
                })
            }
        };
        positive("tpi_radius", self.tpi_radius)?;
        positive("inner_distance", self.inner_distance)?;
        positive("start_radius", self.start_radius)?;
        if !(self.outer_distance > self.inner_distance) {
            return Err(Error::InvalidParameter {
                name: "outer_distance",
                value: self.outer_distance.to_string(),
                reason: format!("must exceed inner_distance {}", self.inner_distance),
            });
        }
        if !(self.min_area >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "min_area",
                value: self.min_area.to_string(),
                reason: "must not be negative".into(),
            });
        }
        if self.vrm_window == 0 || self.vrm_window % 2 == 0 {
            return Err(Error::InvalidParameter {
                name: "vrm_window",
                value: self.vrm_window.to_string(),
                reason: "must be an odd number of cells".into(),
            });
        }
        if self.buffer_segments < 3 || self.subsamples == 0 {
            return Err(Error::InvalidParameter {
                name: "buffer_segments",
                value: format!("{}/{}", self.buffer_segments, self.subsamples),
                reason: "need at least 3 segments and 1 subsample".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_published_tables() {
        let c = AvalancheConfig::default();
        assert_eq!(c.tables.slope_start.classify(27.9), None);
        assert_eq!(c.tables.slope_start.classify(28.0), Some(4.0));
        assert_eq!(c.tables.slope_start.classify(38.0), Some(9.0));
        assert_eq!(c.tables.slope_start.classify(90.0), Some(7.0));
        assert_eq!(c.tables.slope_connected.classify(28.0), Some(9.0));
        assert_eq!(c.tables.slope_connected.classify(11.0), None);
        assert_eq!(c.tables.aspect.classify(360.0), Some(9.0));
        assert_eq!(c.tables.aspect.classify(200.0), Some(6.0));
        assert_eq!(c.tables.aspect.classify(-1.0), None);
        assert_eq!(c.tables.vrm.classify(0.0), Some(9.0));
        assert_eq!(c.tables.vrm.classify(0.5), Some(0.0));
        assert_eq!(c.tables.steep_falls.classify(55.0), Some(1.0));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c = AvalancheConfig::from_json(r#"{"start_radius": 120.0, "fusion": {"vrm": 0.25}}"#).unwrap();
        assert_eq!(c.start_radius, 120.0);
        assert_eq!(c.fusion.vrm, 0.25);
        assert_eq!(c.fusion.slope, 1.0);
        assert_eq!(c.min_area, 1000.0);
        assert_eq!(c.tables, ReclassTables::default());
    }

    #[test]
    fn test_json_roundtrip_is_identity() {
        let c = AvalancheConfig::default();
        let text = serde_json::to_string(&c).unwrap();
        assert_eq!(AvalancheConfig::from_json(&text).unwrap(), c);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let mut c = AvalancheConfig::default();
        c.outer_distance = 50.0;
        assert!(c.validate().is_err());

        let mut c = AvalancheConfig::default();
        c.vrm_window = 4;
        assert!(c.validate().is_err());

        assert!(AvalancheConfig::from_json(r#"{"degenerate_tpi": "keep_threshold"}"#).is_ok());
        assert!(AvalancheConfig::from_json(r#"{"degenerate_tpi": "maybe"}"#).is_err());
    }
}
