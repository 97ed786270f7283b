//! In-memory representation of a time-varying gridded field.

use crate::psl::error::PslDataError;
use crate::types::spatial::SpatialWindow;
use chrono::NaiveDateTime;

/// Normalizes a longitude to the [-180, 180) convention.
///
/// The result is congruent to the input modulo 360. Raw reanalysis grids use
/// [0, 360) and must be shifted before any spatial trim against signed
/// bounds.
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// A 3-D numeric array indexed by (time, latitude, longitude).
///
/// Latitudes keep the order the source provides (reanalysis grids run north
/// to south); longitudes are sorted ascending once normalized.
#[derive(Debug, Clone)]
pub struct GriddedField {
    times: Vec<NaiveDateTime>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    /// Row-major (time, lat, lon).
    values: Vec<f64>,
}

impl GriddedField {
    pub fn new(
        times: Vec<NaiveDateTime>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, PslDataError> {
        let expected = times.len() * lats.len() * lons.len();
        if values.len() != expected {
            return Err(PslDataError::ShapeMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            times,
            lats,
            lons,
            values,
        })
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    pub fn num_times(&self) -> usize {
        self.times.len()
    }

    pub fn num_cells(&self) -> usize {
        self.lats.len() * self.lons.len()
    }

    pub fn value(&self, t: usize, y: usize, x: usize) -> f64 {
        self.values[(t * self.lats.len() + y) * self.lons.len() + x]
    }

    /// Shifts all longitudes into [-180, 180) and reorders the grid columns
    /// so longitude runs ascending.
    pub fn normalize_longitudes(&mut self) {
        let shifted: Vec<f64> = self.lons.iter().map(|&l| normalize_longitude(l)).collect();
        let mut order: Vec<usize> = (0..shifted.len()).collect();
        order.sort_by(|&a, &b| shifted[a].total_cmp(&shifted[b]));

        let (nt, ny, nx) = (self.times.len(), self.lats.len(), self.lons.len());
        let mut reordered = Vec::with_capacity(self.values.len());
        for t in 0..nt {
            for y in 0..ny {
                let row = (t * ny + y) * nx;
                for &x in &order {
                    reordered.push(self.values[row + x]);
                }
            }
        }
        self.lons = order.iter().map(|&i| shifted[i]).collect();
        self.values = reordered;
    }

    /// Returns the subfield whose cells fall inside the window (inclusive
    /// bounds). Trimming an already-trimmed field to the same window is a
    /// no-op.
    pub fn trim(&self, window: &SpatialWindow) -> Result<GriddedField, PslDataError> {
        let lat_idx: Vec<usize> = self
            .lats
            .iter()
            .enumerate()
            .filter(|(_, &lat)| lat >= window.south && lat <= window.north)
            .map(|(i, _)| i)
            .collect();
        let lon_idx: Vec<usize> = self
            .lons
            .iter()
            .enumerate()
            .filter(|(_, &lon)| lon >= window.west && lon <= window.east)
            .map(|(i, _)| i)
            .collect();
        if lat_idx.is_empty() || lon_idx.is_empty() {
            return Err(PslDataError::EmptySelection);
        }

        let (ny, nx) = (self.lats.len(), self.lons.len());
        let mut values = Vec::with_capacity(self.times.len() * lat_idx.len() * lon_idx.len());
        for t in 0..self.times.len() {
            for &y in &lat_idx {
                let row = (t * ny + y) * nx;
                for &x in &lon_idx {
                    values.push(self.values[row + x]);
                }
            }
        }
        GriddedField::new(
            self.times.clone(),
            lat_idx.iter().map(|&i| self.lats[i]).collect(),
            lon_idx.iter().map(|&i| self.lons[i]).collect(),
            values,
        )
    }

    /// Per-cell mean over the time dimension, skipping NaN samples.
    pub fn mean_over_time(&self) -> Vec<f64> {
        let cells = self.num_cells();
        let mut sums = vec![0.0f64; cells];
        let mut counts = vec![0usize; cells];
        for t in 0..self.times.len() {
            let base = t * cells;
            for c in 0..cells {
                let v = self.values[base + c];
                if v.is_finite() {
                    sums[c] += v;
                    counts[c] += 1;
                }
            }
        }
        sums.iter()
            .zip(&counts)
            .map(|(&s, &n)| if n > 0 { s / n as f64 } else { f64::NAN })
            .collect()
    }

    /// Applies a unit conversion to every value in place.
    pub fn map_values(&mut self, f: impl Fn(f64) -> f64) {
        for v in &mut self.values {
            *v = f(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_field() -> GriddedField {
        // 2 times, 3 lats (north to south), 4 lons on the [0, 360) convention.
        let lats = vec![30.0, 20.0, 10.0];
        let lons = vec![0.0, 90.0, 180.0, 270.0];
        let values: Vec<f64> = (0..24).map(|v| v as f64).collect();
        GriddedField::new(vec![dt(1), dt(2)], lats, lons, values).unwrap()
    }

    #[test]
    fn normalized_longitude_stays_in_half_open_range() {
        for lon in [-720.5, -190.0, -180.0, -0.1, 0.0, 179.9, 180.0, 359.5, 730.0] {
            let n = normalize_longitude(lon);
            assert!((-180.0..180.0).contains(&n), "{lon} -> {n}");
            let diff = (n - lon).rem_euclid(360.0);
            assert!(
                diff.abs() < 1e-9 || (diff - 360.0).abs() < 1e-9,
                "{lon} -> {n} not congruent mod 360"
            );
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = GriddedField::new(vec![dt(1)], vec![0.0], vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(err, Err(PslDataError::ShapeMismatch { .. })));
    }

    #[test]
    fn longitude_normalization_reorders_columns() {
        let mut field = sample_field();
        field.normalize_longitudes();
        assert_eq!(field.lons(), &[-180.0, -90.0, 0.0, 90.0]);
        // Column that was at lon=180 (index 2) now leads each row.
        assert_eq!(field.value(0, 0, 0), 2.0);
        assert_eq!(field.value(0, 0, 2), 0.0);
        assert_eq!(field.value(1, 2, 3), 21.0);
    }

    #[test]
    fn trim_is_idempotent() {
        let field = sample_field();
        let window = SpatialWindow::new(-10.0, 100.0, 15.0, 30.0).unwrap();
        let trimmed = field.trim(&window).unwrap();
        assert_eq!(trimmed.lats(), &[30.0, 20.0]);
        assert_eq!(trimmed.lons(), &[0.0, 90.0]);

        let again = trimmed.trim(&window).unwrap();
        assert_eq!(again.lats(), trimmed.lats());
        assert_eq!(again.lons(), trimmed.lons());
        for t in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    assert_eq!(again.value(t, y, x), trimmed.value(t, y, x));
                }
            }
        }
    }

    #[test]
    fn trim_outside_grid_is_an_error() {
        let field = sample_field();
        let window = SpatialWindow::new(-170.0, -150.0, 50.0, 60.0).unwrap();
        assert!(matches!(
            field.trim(&window),
            Err(PslDataError::EmptySelection)
        ));
    }

    #[test]
    fn time_mean_skips_nan() {
        let mut field = sample_field();
        field.map_values(|v| if v == 12.0 { f64::NAN } else { v });
        let mean = field.mean_over_time();
        // Cell 0: values 0 and 12(NaN) -> mean 0.
        assert_eq!(mean[0], 0.0);
        // Cell 1: values 1 and 13 -> 7.
        assert_eq!(mean[1], 7.0);
    }
}
