//! Derived quantities over PRISM observation tables.
//!
//! Everything here operates on the flat `latitude` / `longitude` / value
//! tables produced by the raster loader. Binary operations (humidity,
//! anomalies) require the two tables to sit on the identical grid; the
//! alignment check runs first and fails fast with a diagnostic rather than
//! letting misaligned rows combine silently.

use crate::calc;
use crate::types::spatial::SpatialWindow;
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("tables are not on the same grid: {detail}")]
    GridMismatch { detail: String },

    #[error("table is missing expected column '{0}'")]
    MissingColumn(String),

    #[error("precipitation anomalies are defined for monthly data only")]
    PrecipAnomalyCadence,

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

fn f64_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Float64Chunked, DeriveError> {
    df.column(name)
        .map_err(|_| DeriveError::MissingColumn(name.to_string()))?
        .f64()
        .map_err(DeriveError::Polars)
}

/// Verifies two tables describe the same grid cells in the same order.
///
/// Row counts must match and the latitude/longitude columns must agree
/// elementwise to within a millionth of a degree.
pub fn check_grid_alignment(left: &DataFrame, right: &DataFrame) -> Result<(), DeriveError> {
    if left.height() != right.height() {
        return Err(DeriveError::GridMismatch {
            detail: format!("{} rows vs {} rows", left.height(), right.height()),
        });
    }
    for coord in ["latitude", "longitude"] {
        let a = f64_column(left, coord)?;
        let b = f64_column(right, coord)?;
        for (i, (x, y)) in a.into_iter().zip(b).enumerate() {
            match (x, y) {
                (Some(x), Some(y)) if (x - y).abs() <= 1e-6 => {}
                _ => {
                    return Err(DeriveError::GridMismatch {
                        detail: format!(
                            "{coord} differs at row {i}: {x:?} vs {y:?}"
                        ),
                    })
                }
            }
        }
    }
    Ok(())
}

/// Rewrites a Celsius value column in place as Fahrenheit.
pub fn to_fahrenheit(df: DataFrame, column: &str) -> Result<DataFrame, DeriveError> {
    if df.column(column).is_err() {
        return Err(DeriveError::MissingColumn(column.to_string()));
    }
    Ok(df
        .lazy()
        .with_column((col(column) * lit(9.0 / 5.0) + lit(32.0)).alias(column))
        .collect()?)
}

/// Rewrites a millimeter value column in place as inches.
pub fn to_inches(df: DataFrame, column: &str) -> Result<DataFrame, DeriveError> {
    if df.column(column).is_err() {
        return Err(DeriveError::MissingColumn(column.to_string()));
    }
    Ok(df
        .lazy()
        .with_column((col(column) / lit(25.4)).alias(column))
        .collect()?)
}

/// Derives mean relative humidity from co-gridded mean temperature and mean
/// dew point tables.
///
/// Both inputs are in Celsius as downloaded; they are converted to Fahrenheit
/// before the vapor-pressure ratio is taken, matching how the humidity
/// product has always been computed. Saturated cells come out at exactly 100.
pub fn relative_humidity_table(
    tmean: &DataFrame,
    tdmean: &DataFrame,
) -> Result<DataFrame, DeriveError> {
    check_grid_alignment(tmean, tdmean)?;

    let temps = f64_column(tmean, "tmean")?;
    let dews = f64_column(tdmean, "tdmean")?;
    let rh: Vec<Option<f64>> = temps
        .into_iter()
        .zip(dews)
        .map(|(t, td)| match (t, td) {
            (Some(t), Some(td)) => Some(calc::relative_humidity_from_fahrenheit(
                calc::celsius_to_fahrenheit(t),
                calc::celsius_to_fahrenheit(td),
            )),
            _ => None,
        })
        .collect();

    let mut out = tmean.select(["latitude", "longitude"])?;
    out.with_column(Column::new("rhmean".into(), rh))?;
    Ok(out)
}

/// Difference anomaly (current minus normal) for temperature-family and
/// humidity tables, in whatever unit the inputs share.
pub fn difference_anomaly(
    current: &DataFrame,
    normal: &DataFrame,
    column: &str,
) -> Result<DataFrame, DeriveError> {
    check_grid_alignment(current, normal)?;

    let now = f64_column(current, column)?;
    let norm = f64_column(normal, column)?;
    let diff: Vec<Option<f64>> = now
        .into_iter()
        .zip(norm)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(a - b),
            _ => None,
        })
        .collect();

    let mut out = current.select(["latitude", "longitude"])?;
    out.with_column(Column::new(column.into(), diff))?;
    Ok(out)
}

/// Ratio anomaly (current over normal, times 100) for monthly precipitation.
///
/// Cells whose normal is zero have no defined percent-of-normal and are
/// dropped.
pub fn percent_of_normal(
    current: &DataFrame,
    normal: &DataFrame,
    column: &str,
) -> Result<DataFrame, DeriveError> {
    check_grid_alignment(current, normal)?;

    let lat_col = f64_column(current, "latitude")?;
    let lon_col = f64_column(current, "longitude")?;
    let now = f64_column(current, column)?;
    let norm = f64_column(normal, column)?;

    let mut lats = Vec::new();
    let mut lons = Vec::new();
    let mut pct = Vec::new();
    for (((lat, lon), a), b) in lat_col.into_iter().zip(lon_col).zip(now).zip(norm) {
        if let (Some(lat), Some(lon), Some(a), Some(b)) = (lat, lon, a, b) {
            if b.abs() > f64::EPSILON {
                lats.push(lat);
                lons.push(lon);
                pct.push(a / b * 100.0);
            }
        }
    }

    Ok(DataFrame::new(vec![
        Column::new("latitude".into(), lats),
        Column::new("longitude".into(), lons),
        Column::new(column.into(), pct),
    ])?)
}

/// Keeps only the rows inside the window (inclusive bounds). Trimming an
/// already-trimmed table is a no-op.
pub fn trim_table(df: DataFrame, window: &SpatialWindow) -> Result<DataFrame, DeriveError> {
    Ok(df
        .lazy()
        .filter(
            col("longitude")
                .gt_eq(lit(window.west))
                .and(col("longitude").lt_eq(lit(window.east)))
                .and(col("latitude").gt_eq(lit(window.south)))
                .and(col("latitude").lt_eq(lit(window.north))),
        )
        .collect()?)
}

/// Contour bounds and tick positions for a rendered map.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub vmin: f64,
    pub vmax: f64,
    pub levels: Vec<f64>,
    pub ticks: Vec<f64>,
}

impl ColorScale {
    /// A fixed scale with `level_step` contour spacing and `tick_step` labels.
    ///
    /// A step that is not a positive normal number, or that would produce an
    /// unreasonable number of positions, degenerates to the two endpoints
    /// instead of stalling below one ulp.
    pub fn from_range(vmin: f64, vmax: f64, level_step: f64, tick_step: f64) -> Self {
        Self {
            vmin,
            vmax,
            levels: stepped(vmin, vmax, level_step),
            ticks: stepped(vmin, vmax, tick_step),
        }
    }

    /// Scale derived from the data itself: bounds snapped outward to
    /// multiples of five, unit contour levels, ticks every five units.
    pub fn from_data(values: &Float64Chunked) -> Self {
        let min = values.min().unwrap_or(0.0);
        let max = values.max().unwrap_or(0.0);
        let mut vmin = calc::round_down_to(min.floor() as i64, 5) as f64;
        let mut vmax = calc::round_up_to(max.ceil() as i64, 5) as f64;
        if vmax <= vmin {
            vmin -= 5.0;
            vmax += 5.0;
        }
        Self::from_range(vmin, vmax, 1.0, 5.0)
    }

    pub fn relative_humidity() -> Self {
        Self::from_range(0.0, 100.0, 5.0, 5.0)
    }

    pub fn percent_of_normal() -> Self {
        Self::from_range(0.0, 200.0, 10.0, 10.0)
    }

    /// Position of a value within the scale, clamped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        if self.vmax <= self.vmin {
            return 0.0;
        }
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}

/// Inclusive positions from `from` to `to` spaced by `step`, generated by
/// index so the sequence is guaranteed to terminate.
fn stepped(from: f64, to: f64, step: f64) -> Vec<f64> {
    const MAX_POSITIONS: usize = 4096;
    if !(to > from) || !step.is_normal() || step <= 0.0 {
        return vec![from, to];
    }
    let count = ((to - from) / step + 1e-9).floor();
    if !count.is_finite() || count < 0.0 || count as usize >= MAX_POSITIONS {
        return vec![from, to];
    }
    (0..=count as usize).map(|i| from + i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(var: &str, lats: Vec<f64>, lons: Vec<f64>, vals: Vec<f64>) -> DataFrame {
        DataFrame::new(vec![
            Column::new("latitude".into(), lats),
            Column::new("longitude".into(), lons),
            Column::new(var.into(), vals),
        ])
        .unwrap()
    }

    #[test]
    fn misaligned_grids_are_rejected() {
        let a = table("tmean", vec![40.0, 41.0], vec![-100.0, -100.0], vec![1.0, 2.0]);
        let b = table("tmean", vec![40.0], vec![-100.0], vec![1.0]);
        assert!(matches!(
            check_grid_alignment(&a, &b),
            Err(DeriveError::GridMismatch { .. })
        ));

        let c = table("tmean", vec![40.0, 41.5], vec![-100.0, -100.0], vec![1.0, 2.0]);
        let err = check_grid_alignment(&a, &c).unwrap_err();
        assert!(err.to_string().contains("latitude differs at row 1"));
    }

    #[test]
    fn saturated_cells_reach_exactly_100() {
        let t = table("tmean", vec![40.0, 41.0], vec![-100.0, -100.0], vec![20.0, 5.0]);
        let td = table("tdmean", vec![40.0, 41.0], vec![-100.0, -100.0], vec![20.0, -10.0]);
        let rh = relative_humidity_table(&t, &td).unwrap();
        let vals = rh.column("rhmean").unwrap().f64().unwrap();
        assert!((vals.get(0).unwrap() - 100.0).abs() < 1e-9);
        assert!(vals.get(1).unwrap() < 100.0);
        assert!(vals.get(1).unwrap() > 0.0);
    }

    #[test]
    fn temperature_anomaly_is_a_plain_difference() {
        let now = table("tmean", vec![40.0], vec![-100.0], vec![12.5]);
        let normal = table("tmean", vec![40.0], vec![-100.0], vec![10.0]);
        let anom = difference_anomaly(&now, &normal, "tmean").unwrap();
        let v = anom.column("tmean").unwrap().f64().unwrap().get(0).unwrap();
        assert!((v - 2.5).abs() < 1e-12);
    }

    #[test]
    fn percent_of_normal_scales_by_100_and_drops_zero_normals() {
        let now = table("ppt", vec![40.0, 41.0], vec![-100.0, -100.0], vec![30.0, 5.0]);
        let normal = table("ppt", vec![40.0, 41.0], vec![-100.0, -100.0], vec![20.0, 0.0]);
        let pct = percent_of_normal(&now, &normal, "ppt").unwrap();
        assert_eq!(pct.height(), 1);
        let v = pct.column("ppt").unwrap().f64().unwrap().get(0).unwrap();
        assert!((v - 150.0).abs() < 1e-9);
    }

    #[test]
    fn a_month_matching_its_normal_is_exactly_100_percent() {
        let now = table("ppt", vec![40.0, 41.0], vec![-100.0, -99.0], vec![12.5, 80.0]);
        let pct = percent_of_normal(&now, &now, "ppt").unwrap();
        let vals = pct.column("ppt").unwrap().f64().unwrap();
        for v in vals.into_no_null_iter() {
            assert!((v - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn trimming_is_inclusive_and_idempotent() {
        let df = table(
            "tmax",
            vec![30.0, 35.0, 40.0, 45.0],
            vec![-110.0, -105.0, -100.0, -95.0],
            vec![1.0, 2.0, 3.0, 4.0],
        );
        let window = SpatialWindow::new(-105.0, -100.0, 35.0, 40.0).unwrap();
        let once = trim_table(df, &window).unwrap();
        assert_eq!(once.height(), 2);
        let twice = trim_table(once.clone(), &window).unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn data_driven_scale_snaps_to_fives() {
        let values = Float64Chunked::from_vec("v".into(), vec![12.3, 37.8, 21.0]);
        let scale = ColorScale::from_data(&values);
        assert_eq!(scale.vmin, 10.0);
        assert_eq!(scale.vmax, 40.0);
        assert_eq!(scale.levels.len(), 31);
        assert_eq!(scale.ticks, vec![10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0]);
        assert_eq!(scale.normalize(10.0), 0.0);
        assert_eq!(scale.normalize(40.0), 1.0);
        assert_eq!(scale.normalize(-5.0), 0.0);
    }

    #[test]
    fn constant_data_still_yields_a_nonempty_scale() {
        let values = Float64Chunked::from_vec("v".into(), vec![15.0, 15.0]);
        let scale = ColorScale::from_data(&values);
        assert!(scale.vmax > scale.vmin);
    }

    #[test]
    fn subnormal_and_non_positive_steps_degenerate_to_endpoints() {
        // A subnormal step would stall once positions outgrow one ulp.
        let tiny = f64::MIN_POSITIVE;
        let scale = ColorScale::from_range(-tiny, tiny, tiny / 10.0, tiny / 2.0);
        assert_eq!(scale.levels, vec![-tiny, tiny]);
        assert_eq!(scale.ticks, vec![-tiny, tiny]);

        let zero = ColorScale::from_range(0.0, 10.0, 0.0, -1.0);
        assert_eq!(zero.levels, vec![0.0, 10.0]);
        assert_eq!(zero.ticks, vec![0.0, 10.0]);
    }

    #[test]
    fn absurd_position_counts_degenerate_to_endpoints() {
        let scale = ColorScale::from_range(0.0, 1.0e9, 1.0, 5.0e8);
        assert_eq!(scale.levels, vec![0.0, 1.0e9]);
        assert_eq!(scale.ticks, vec![0.0, 5.0e8, 1.0e9]);
    }
}
