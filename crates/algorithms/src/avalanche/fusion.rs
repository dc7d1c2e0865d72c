//! Susceptibility fusion
//!
//! `start     = w_slope·slopeStart     + w_vrm·vrm + w_aspect·aspect + w_ridge·ridgeDist`
//! `connected = w_slope·slopeConnected + w_vrm·vrm + w_aspect·aspect + w_ridge·ridgeDist`

use avasus_core::raster::Raster;
use avasus_core::Result;

use crate::algebra::weighted_sum;

use super::config::FusionWeights;

/// Reclassified layers of one tile, all on the DEM grid
#[derive(Debug, Clone, Copy)]
pub struct FusionInputs<'a> {
    pub slope_start: &'a Raster<f64>,
    pub slope_connected: &'a Raster<f64>,
    pub aspect: &'a Raster<f64>,
    pub vrm: &'a Raster<f64>,
    pub ridge_distance: &'a Raster<f64>,
}

/// Start-zone and connected-slope susceptibility
#[derive(Debug, Clone)]
pub struct Susceptibility {
    pub start: Raster<f64>,
    pub connected: Raster<f64>,
}

/// Combine the reclassified layers. No-data in any input stays no-data.
pub fn fuse(inputs: FusionInputs<'_>, weights: &FusionWeights) -> Result<Susceptibility> {
    let shared = [
        (inputs.vrm, weights.vrm),
        (inputs.aspect, weights.aspect),
        (inputs.ridge_distance, weights.ridge),
    ];
    let combine = |slope: &Raster<f64>| {
        let mut layers = vec![(slope, weights.slope)];
        layers.extend(shared);
        weighted_sum(&layers)
    };
    Ok(Susceptibility {
        start: combine(inputs.slope_start)?,
        connected: combine(inputs.slope_connected)?,
    })
}
