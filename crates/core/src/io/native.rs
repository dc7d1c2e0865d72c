//! GeoTIFF reading/writing on top of the `tiff` crate
//!
//! Only what the pipeline needs is handled: single-band north-up grids,
//! the pixel scale and tiepoint tags, an EPSG code in the GeoKey directory,
//! and the GDAL no-data tag. Rasters come back as `Raster<f64>` with NaN
//! marking no-data whatever the file's pixel type was.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray32Float, Gray8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// the decoder maps known tag ids onto named variants, so lookups must use them
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// On-disk cell type of a written raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// 32-bit float, NaN no-data
    Float32,
    /// Unsigned byte, no-data 255
    UInt8,
}

impl PixelType {
    pub fn nodata(self) -> f64 {
        match self {
            PixelType::Float32 => f64::NAN,
            PixelType::UInt8 => 255.0,
        }
    }

    /// Value a cell holds after a write/read cycle at this pixel type
    pub fn quantize(self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        match self {
            PixelType::Float32 => f64::from(value as f32),
            PixelType::UInt8 => value.round().clamp(0.0, 254.0),
        }
    }
}

/// Read a GeoTIFF file
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<Raster<f64>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    decode(file).map_err(|e| match e {
        Error::Io(e) => Error::Io(e),
        other => Error::store(path.display().to_string(), other.to_string()),
    })
}

/// Read a GeoTIFF held in memory
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<Raster<f64>> {
    decode(Cursor::new(data))
}

/// Write a raster as a single-band GeoTIFF file of the given pixel type
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster<f64>, path: P, pixel: PixelType) -> Result<()> {
    let mut file = BufWriter::new(File::create(path.as_ref())?);
    let bytes = write_geotiff_to_buffer(raster, pixel)?;
    file.write_all(&bytes)?;
    file.flush()?;
    Ok(())
}

/// Encode a raster as a GeoTIFF byte buffer
pub fn write_geotiff_to_buffer(raster: &Raster<f64>, pixel: PixelType) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode(raster, pixel, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn tiff_err(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn decode<R: Read + Seek>(reader: R) -> Result<Raster<f64>> {
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;
    let (width, height) = decoder.dimensions().map_err(tiff_err("cannot read dimensions"))?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<f64> = match decoder.read_image().map_err(tiff_err("cannot read image data"))? {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        _ => return Err(Error::UnsupportedDataType("unsupported TIFF pixel format".into())),
    };
    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions { width: cols, height: rows });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;
    if let Some(transform) = read_transform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));

    let nodata = decoder
        .get_tag_ascii_string(GDAL_NODATA)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());
    raster.set_nodata(nodata);
    Ok(raster.with_nan_nodata())
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tie = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;
    if scale.len() < 2 || tie.len() < 6 {
        return None;
    }
    // tiepoint is [I, J, K, X, Y, Z]
    let origin_x = tie[3] - tie[0] * scale[0];
    let origin_y = tie[4] + tie[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u32_vec(GEO_KEY_DIRECTORY).ok()?;
    // header of four shorts, then entries of (key, location, count, value)
    keys.get(4..)?
        .chunks_exact(4)
        .find(|k| {
            (k[0] == u32::from(PROJECTED_CS_TYPE_KEY) || k[0] == u32::from(GEOGRAPHIC_TYPE_KEY))
                && k[1] == 0
        })
        .map(|k| k[3])
}

fn geo_keys(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(CRS::epsg).and_then(|c| u16::try_from(c).ok());
    let geographic = epsg == Some(4326);
    let mut keys: Vec<u16> = vec![
        1, 1, 0, 0,
        1024, 0, 1, if geographic { 2 } else { 1 }, // GTModelType
        1025, 0, 1, 1,                              // RasterPixelIsArea
    ];
    if let Some(code) = epsg {
        let key = if geographic { GEOGRAPHIC_TYPE_KEY } else { PROJECTED_CS_TYPE_KEY };
        keys.extend_from_slice(&[key, 0, 1, code]);
    }
    keys[3] = ((keys.len() - 4) / 4) as u16;
    keys
}

fn encode<W: Write + Seek>(raster: &Raster<f64>, pixel: PixelType, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;
    let (rows, cols) = raster.shape();
    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    let keys = geo_keys(raster.crs());

    // NaN and the raster's own no-data value both become the file's no-data
    let values = raster
        .data()
        .iter()
        .map(|&v| if raster.is_nodata(v) || v.is_nan() { f64::NAN } else { v });

    macro_rules! write_image {
        ($color:ty, $data:expr, $nodata:expr) => {{
            let data = $data;
            let mut image = encoder
                .new_image::<$color>(cols as u32, rows as u32)
                .map_err(tiff_err("cannot create TIFF image"))?;
            let enc = image.encoder();
            enc.write_tag(MODEL_PIXEL_SCALE, &scale[..]).map_err(tiff_err("pixel scale tag"))?;
            enc.write_tag(MODEL_TIEPOINT, &tiepoint[..]).map_err(tiff_err("tiepoint tag"))?;
            enc.write_tag(GEO_KEY_DIRECTORY, keys.as_slice()).map_err(tiff_err("geokey tag"))?;
            enc.write_tag(GDAL_NODATA, $nodata).map_err(tiff_err("nodata tag"))?;
            image.write_data(&data).map_err(tiff_err("cannot write image data"))?;
        }};
    }

    match pixel {
        PixelType::Float32 => {
            let data: Vec<f32> = values.map(|v| v as f32).collect();
            write_image!(Gray32Float, data, "nan")
        }
        PixelType::UInt8 => {
            let data: Vec<u8> = values
                .map(|v| if v.is_nan() { 255 } else { PixelType::UInt8.quantize(v) as u8 })
                .collect();
            write_image!(Gray8, data, "255")
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Raster<f64> {
        let mut r = Raster::from_vec(vec![1.0, 2.5, f64::NAN, 4.0, 5.0, 6.0], 2, 3).unwrap();
        r.set_transform(GeoTransform::new(2_600_000.0, 1_200_020.0, 10.0, -10.0));
        r.set_crs(Some(CRS::lv95()));
        r.set_nodata(Some(f64::NAN));
        r
    }

    #[test]
    fn test_float32_buffer_keeps_georeference() {
        let bytes = write_geotiff_to_buffer(&sample(), PixelType::Float32).unwrap();
        let back = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.get(0, 1).unwrap(), 2.5);
        assert!(back.get(0, 2).unwrap().is_nan());
        assert_eq!(back.transform().origin_x, 2_600_000.0);
        assert_eq!(back.transform().pixel_height, -10.0);
        assert_eq!(back.crs().and_then(CRS::epsg), Some(2056));
    }

    #[test]
    fn test_geo_tags_match_decoded_ids() {
        for (tag, id) in [
            (MODEL_PIXEL_SCALE, 33550),
            (MODEL_TIEPOINT, 33922),
            (GEO_KEY_DIRECTORY, 34735),
            (GDAL_NODATA, 42113),
        ] {
            assert_eq!(tag.to_u16(), id);
            assert_eq!(Tag::from_u16_exhaustive(id), tag);
        }
    }

    #[test]
    fn test_uint8_nodata_reads_as_nan() {
        let bytes = write_geotiff_to_buffer(&sample(), PixelType::UInt8).unwrap();
        let back = read_geotiff_from_buffer(&bytes).unwrap();
        assert!(back.get(0, 2).unwrap().is_nan());
        assert_eq!(back.transform().pixel_width, 10.0);
        assert_eq!(back.crs().and_then(CRS::epsg), Some(2056));
        // byte output rounds
        assert_eq!(back.get(0, 1).unwrap(), 3.0);
        assert_eq!(back.get(1, 2).unwrap(), 6.0);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dem.tif");
        write_geotiff(&sample(), &path, PixelType::Float32).unwrap();
        let back = read_geotiff(&path).unwrap();
        assert_eq!(back.get(1, 0).unwrap(), 4.0);
        assert!(read_geotiff(dir.path().join("missing.tif")).is_err());
    }
}
