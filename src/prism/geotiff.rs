//! GeoTIFF raster decoding for PRISM archives.
//!
//! Uses the pure-Rust `tiff` crate; the geotransform comes from the
//! ModelPixelScale (33550) and ModelTiepoint (33922) tags and the nodata
//! sentinel from the GDAL_NODATA (42113) tag. The decoded raster flattens
//! into an observation table with one row per valid grid cell.

use crate::prism::error::PrismDataError;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);
const GDAL_NODATA: Tag = Tag::Unknown(42113);

/// PRISM rasters mark missing cells with -9999 when no nodata tag is present.
const DEFAULT_NODATA: f64 = -9999.0;

/// A decoded single-band raster with its geographic transform.
pub struct PrismRaster {
    values: Vec<f64>,
    width: usize,
    height: usize,
    /// Longitude of the west edge of the top-left pixel.
    origin_x: f64,
    /// Latitude of the north edge of the top-left pixel.
    origin_y: f64,
    pixel_width: f64,
    pixel_height: f64,
    nodata: f64,
}

impl PrismRaster {
    pub fn load(path: &Path) -> Result<Self, PrismDataError> {
        let file = File::open(path)
            .map_err(|e| PrismDataError::DataFolderIo(path.to_path_buf(), e))?;
        let mut decoder = Decoder::new(file)?;

        let (width, height) = decoder.dimensions()?;
        let pixel_scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).map_err(|_| {
            PrismDataError::MissingGeotransform("ModelPixelScale (33550)".to_string())
        })?;
        let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).map_err(|_| {
            PrismDataError::MissingGeotransform("ModelTiepoint (33922)".to_string())
        })?;
        if pixel_scale.len() < 2 || tiepoint.len() < 6 {
            return Err(PrismDataError::MissingGeotransform(
                "geotransform tags are truncated".to_string(),
            ));
        }

        let nodata = decoder
            .get_tag_ascii_string(GDAL_NODATA)
            .ok()
            .and_then(|s| s.trim().trim_end_matches('\0').parse::<f64>().ok())
            .unwrap_or(DEFAULT_NODATA);

        let values = match decoder.read_image()? {
            DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::F64(data) => data,
            DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
            DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
            _ => {
                return Err(PrismDataError::UnsupportedDataType(
                    "expected a float or 16/32-bit integer single-band raster".to_string(),
                ))
            }
        };

        Ok(Self {
            values,
            width: width as usize,
            height: height as usize,
            origin_x: tiepoint[3],
            origin_y: tiepoint[4],
            pixel_width: pixel_scale[0],
            pixel_height: pixel_scale[1],
            nodata,
        })
    }

    /// Flattens the raster into a table with `latitude`, `longitude` and one
    /// value column named after the variable. Coordinates are cell centers;
    /// nodata cells are dropped.
    pub fn to_table(&self, variable: &str) -> Result<DataFrame, PrismDataError> {
        let mut lats = Vec::new();
        let mut lons = Vec::new();
        let mut vals = Vec::new();
        for row in 0..self.height {
            let lat = self.origin_y - (row as f64 + 0.5) * self.pixel_height;
            for col in 0..self.width {
                let v = self.values[row * self.width + col];
                if !v.is_finite() || (v - self.nodata).abs() < 1e-6 {
                    continue;
                }
                let lon = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
                lats.push(lat);
                lons.push(lon);
                vals.push(v);
            }
        }

        Ok(DataFrame::new(vec![
            Column::new("latitude".into(), lats),
            Column::new("longitude".into(), lons),
            Column::new(variable.into(), vals),
        ])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_raster() -> PrismRaster {
        // 3x2 grid over a 1-degree pixel spacing, one nodata cell.
        PrismRaster {
            values: vec![1.0, 2.0, -9999.0, 4.0, 5.0, 6.0],
            width: 3,
            height: 2,
            origin_x: -100.0,
            origin_y: 45.0,
            pixel_width: 1.0,
            pixel_height: 1.0,
            nodata: -9999.0,
        }
    }

    #[test]
    fn flattening_drops_nodata_and_centers_cells() {
        let raster = synthetic_raster();
        let df = raster.to_table("tmax").unwrap();
        assert_eq!(df.height(), 5);
        assert_eq!(
            df.get_column_names(),
            ["latitude", "longitude", "tmax"]
        );

        let lat = df.column("latitude").unwrap().f64().unwrap();
        let lon = df.column("longitude").unwrap().f64().unwrap();
        let val = df.column("tmax").unwrap().f64().unwrap();
        // First cell center: origin + half pixel.
        assert_eq!(lat.get(0), Some(44.5));
        assert_eq!(lon.get(0), Some(-99.5));
        assert_eq!(val.get(0), Some(1.0));
        // The -9999 cell (row 1, col 0) is gone; next row starts at value 4.
        assert_eq!(val.get(2), Some(4.0));
        assert_eq!(lat.get(2), Some(43.5));
    }
}
