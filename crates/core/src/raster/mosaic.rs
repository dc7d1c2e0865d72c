//! Mosaicking of aligned raster tiles into one raster

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// Relative tolerance on cell sizes
const SIZE_TOLERANCE: f64 = 1e-6;
/// Fraction of a cell a tile origin may deviate from the common grid
const SNAP_TOLERANCE: f64 = 1e-3;

/// Combine tiles into a single raster covering their union extent.
///
/// All tiles must be north-up with the same cell size and origins that fall
/// on the first tile's grid; anything else would need resampling and is an
/// [`Error::Alignment`]. Tiles are pasted in order and later tiles overwrite
/// earlier ones wherever they carry data. Cells covered by no tile are NaN.
pub fn mosaic(tiles: &[Raster<f64>]) -> Result<Raster<f64>> {
    let first = tiles.first().ok_or_else(|| Error::InvalidParameter {
        name: "tiles",
        value: "0".into(),
        reason: "mosaic needs at least one raster".into(),
    })?;
    let base = *first.transform();
    if !base.is_north_up() {
        return Err(Error::Alignment("mosaic requires north-up rasters".into()));
    }
    let dx = base.pixel_width;
    let dy = base.pixel_height;

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for tile in tiles {
        let gt = tile.transform();
        if !gt.is_north_up()
            || (gt.pixel_width - dx).abs() > SIZE_TOLERANCE * dx.abs()
            || (gt.pixel_height - dy).abs() > SIZE_TOLERANCE * dy.abs()
        {
            return Err(Error::Alignment(format!(
                "tile cell size ({}, {}) differs from ({}, {})",
                gt.pixel_width, gt.pixel_height, dx, dy
            )));
        }
        if let (Some(a), Some(b)) = (first.crs(), tile.crs()) {
            if !a.is_equivalent(b) {
                return Err(Error::Alignment(format!("CRS {} vs {}", a, b)));
            }
        }
        let (x0, y0, x1, y1) = tile.bounds();
        min_x = min_x.min(x0);
        min_y = min_y.min(y0);
        max_x = max_x.max(x1);
        max_y = max_y.max(y1);
    }

    let cols = ((max_x - min_x) / dx).round() as usize;
    let rows = ((max_y - min_y) / dy.abs()).round() as usize;
    let transform = GeoTransform::new(min_x, max_y, dx, dy);

    let mut output: Raster<f64> = Raster::filled(rows, cols, f64::NAN);
    output.set_transform(transform);
    output.set_crs(first.crs().cloned());
    output.set_nodata(Some(f64::NAN));

    for tile in tiles {
        let gt = tile.transform();
        let (col_off, row_off) = grid_offset(&transform, gt)?;
        for ((r, c), &v) in tile.data().indexed_iter() {
            if tile.is_nodata(v) || !v.is_finite() {
                continue;
            }
            let orow = row_off + r;
            let ocol = col_off + c;
            if orow < rows && ocol < cols {
                output.data_mut()[(orow, ocol)] = v;
            }
        }
    }

    Ok(output)
}

/// Whole-cell offset of `tile` inside `grid`
fn grid_offset(grid: &GeoTransform, tile: &GeoTransform) -> Result<(usize, usize)> {
    let (col, row) = grid.geo_to_pixel(tile.origin_x, tile.origin_y);
    let (col_r, row_r) = (col.round(), row.round());
    if (col - col_r).abs() > SNAP_TOLERANCE || (row - row_r).abs() > SNAP_TOLERANCE {
        return Err(Error::Alignment(format!(
            "tile origin ({}, {}) is off the mosaic grid",
            tile.origin_x, tile.origin_y
        )));
    }
    Ok((col_r.max(0.0) as usize, row_r.max(0.0) as usize))
}
