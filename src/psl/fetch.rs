//! Retrieval of NCEP/NCAR reanalysis fields from the NOAA PSL THREDDS server.
//!
//! The loader probes the aggregation URL over HTTP first, then opens the
//! dataset through the netcdf library on a blocking task, reads the requested
//! time range over the full grid, normalizes longitudes and trims to the
//! padded window.

use crate::psl::error::PslDataError;
use crate::psl::grid::GriddedField;
use crate::types::reanalysis::LevelType;
use crate::types::spatial::SpatialWindow;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::{info, warn};
use netcdf::AttributeValue;
use reqwest::Client;
use tokio::task;

const THREDDS_BASE: &str = "https://psl.noaa.gov/thredds/dodsC/Aggregations/ncep.reanalysis";

/// Degrees of padding applied to every reanalysis window before trimming, so
/// the requested bounds never sit on the edge of the retrieved grid.
const FETCH_PADDING_DEGREES: f64 = 2.0;

pub struct PslDataLoader {
    probe_client: Client,
    base_url: String,
}

impl Default for PslDataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PslDataLoader {
    pub fn new() -> Self {
        Self {
            probe_client: Client::new(),
            base_url: THREDDS_BASE.to_string(),
        }
    }

    /// Aggregation URL for a variable, from the fixed per-level catalog.
    pub fn dataset_url(&self, variable: &str, level: LevelType) -> Result<String, PslDataError> {
        let (directory, file) =
            level
                .variable_path(variable)
                .ok_or_else(|| PslDataError::UnknownVariable {
                    variable: variable.to_string(),
                    level: level.to_string(),
                })?;
        Ok(format!("{}/{}/{}", self.base_url, directory, file))
    }

    /// Fetches a variable over a date range, trimmed to the window padded by
    /// two degrees per side.
    pub async fn fetch(
        &self,
        variable: &str,
        level: LevelType,
        window: &SpatialWindow,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GriddedField, PslDataError> {
        let url = self.dataset_url(variable, level)?;
        self.probe(&url).await?;

        let padded = window.padded(FETCH_PADDING_DEGREES);
        let variable = variable.to_string();
        info!("Opening reanalysis dataset {url}");
        task::spawn_blocking(move || open_and_select(&url, &variable, &padded, start, end)).await?
    }

    /// Existence probe against the aggregation endpoint. A failed probe is a
    /// fatal transport error for the calling workflow; there is no retry.
    async fn probe(&self, url: &str) -> Result<(), PslDataError> {
        let response = self
            .probe_client
            .get(url)
            .send()
            .await
            .map_err(|e| PslDataError::ServerUnavailable {
                url: url.to_string(),
                source: Some(e),
            })?;
        if !response.status().is_success() {
            warn!("THREDDS probe for {url} returned {}", response.status());
            return Err(PslDataError::ServerUnavailable {
                url: url.to_string(),
                source: None,
            });
        }
        Ok(())
    }
}

fn open_and_select(
    url: &str,
    variable: &str,
    window: &SpatialWindow,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<GriddedField, PslDataError> {
    let file = netcdf::open(url)?;

    let lats = read_coordinate(&file, "lat")?;
    let lons = read_coordinate(&file, "lon")?;
    let times = read_times(&file)?;

    let start_dt = start.and_hms_opt(0, 0, 0).expect("midnight is valid");
    let end_dt = end
        .and_hms_opt(23, 59, 59)
        .expect("end of day is valid");
    let t0 = times.iter().position(|t| *t >= start_dt);
    let t1 = times.iter().rposition(|t| *t <= end_dt);
    let (t0, t1) = match (t0, t1) {
        (Some(a), Some(b)) if a <= b => (a, b + 1),
        _ => return Err(PslDataError::EmptySelection),
    };

    let var = file
        .variable(variable)
        .ok_or_else(|| PslDataError::MissingVariable(variable.to_string()))?;

    let ndims = var.dimensions().len();
    let (ny, nx) = (lats.len(), lons.len());
    let mut raw = match ndims {
        3 => var.get_values::<f64, _>((t0..t1, 0..ny, 0..nx))?,
        4 => {
            // Pressure-level files carry a level dimension; take the first
            // (lowest) level.
            warn!("variable {variable} has a level dimension, selecting level index 0");
            var.get_values::<f64, _>((t0..t1, 0..1, 0..ny, 0..nx))?
        }
        n => {
            return Err(PslDataError::MissingVariable(format!(
                "{variable} has unsupported rank {n}"
            )))
        }
    };

    apply_packing(&var, &mut raw);

    let mut field = GriddedField::new(times[t0..t1].to_vec(), lats, lons, raw)?;
    field.normalize_longitudes();
    field.trim(window)
}

fn read_coordinate(file: &netcdf::File, name: &str) -> Result<Vec<f64>, PslDataError> {
    let var = file
        .variable(name)
        .ok_or_else(|| PslDataError::MissingVariable(name.to_string()))?;
    Ok(var.get_values::<f64, _>(..)?)
}

/// Decodes the time coordinate using its `units` attribute
/// (`hours since <epoch>` or `days since <epoch>`).
fn read_times(file: &netcdf::File) -> Result<Vec<NaiveDateTime>, PslDataError> {
    let var = file
        .variable("time")
        .ok_or_else(|| PslDataError::MissingVariable("time".to_string()))?;
    let units = attr_string(&var, "units")
        .ok_or_else(|| PslDataError::TimeUnits("missing units attribute".to_string()))?;

    let mut parts = units.split_whitespace();
    let unit = parts.next().unwrap_or_default().to_lowercase();
    let since = parts.next().unwrap_or_default();
    let date = parts.next().unwrap_or_default();
    if since != "since" {
        return Err(PslDataError::TimeUnits(units));
    }
    let seconds_per_unit: f64 = match unit.as_str() {
        "hours" => 3600.0,
        "days" => 86400.0,
        "minutes" => 60.0,
        "seconds" => 1.0,
        _ => return Err(PslDataError::TimeUnits(units)),
    };
    let epoch = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| PslDataError::TimeUnits(units.clone()))?
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid");

    let values = var.get_values::<f64, _>(..)?;
    Ok(values
        .iter()
        .map(|&v| epoch + Duration::seconds((v * seconds_per_unit) as i64))
        .collect())
}

/// Applies packed-data attributes: masks `missing_value` cells to NaN, then
/// applies `scale_factor` and `add_offset` when present.
fn apply_packing(var: &netcdf::Variable, values: &mut [f64]) {
    let missing = attr_f64(var, "missing_value").or_else(|| attr_f64(var, "_FillValue"));
    let scale = attr_f64(var, "scale_factor").unwrap_or(1.0);
    let offset = attr_f64(var, "add_offset").unwrap_or(0.0);

    for v in values.iter_mut() {
        if let Some(m) = missing {
            if (*v - m).abs() < f64::EPSILON * m.abs().max(1.0) {
                *v = f64::NAN;
                continue;
            }
        }
        *v = *v * scale + offset;
    }
}

fn attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Longlong(v) => Some(v as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_urls_follow_the_catalog() {
        let loader = PslDataLoader::new();
        assert_eq!(
            loader.dataset_url("air", LevelType::Pressure).unwrap(),
            format!("{THREDDS_BASE}/pressure/air.nc")
        );
        assert_eq!(
            loader.dataset_url("air", LevelType::SurfaceGauss).unwrap(),
            format!("{THREDDS_BASE}/surface_gauss/air.2m.gauss.nc")
        );
        assert_eq!(
            loader.dataset_url("lftx", LevelType::Surface).unwrap(),
            format!("{THREDDS_BASE}/surface/lftx.sfc.nc")
        );
    }

    #[test]
    fn unknown_variable_surfaces_as_typed_error() {
        let loader = PslDataLoader::new();
        let err = loader.dataset_url("prate", LevelType::Pressure).unwrap_err();
        assert!(matches!(err, PslDataError::UnknownVariable { .. }));
    }
}
