//! Empirical orthogonal function decomposition of a time-varying field.
//!
//! Samples are weighted by the square root of the cosine of latitude so the
//! decomposition approximates equal-area weighting, the field is centered
//! over time, and the singular value decomposition orders modes by
//! descending explained variance.

use crate::psl::error::PslDataError;
use crate::psl::grid::GriddedField;
use chrono::NaiveDateTime;
use nalgebra::DMatrix;

/// One EOF mode: a spatial pattern, its amplitude time series, and the share
/// of total variance it explains.
#[derive(Debug, Clone)]
pub struct EofMode {
    /// Spatial pattern in data space, row-major (lat, lon).
    pub pattern: Vec<f64>,
    /// Score (amplitude) per time sample.
    pub scores: Vec<f64>,
    /// Fraction of total variance in [0, 1].
    pub explained_variance: f64,
}

/// The result of an EOF fit: the time-mean field plus the leading modes.
#[derive(Debug, Clone)]
pub struct EofDecomposition {
    pub times: Vec<NaiveDateTime>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Time-mean field, row-major (lat, lon).
    pub mean: Vec<f64>,
    /// Modes ordered by descending explained variance.
    pub modes: Vec<EofMode>,
}

/// Fits at most `max_modes` EOF modes to the field.
///
/// NaN cells contribute a zero anomaly, matching the behavior of masking
/// missing samples to the climatological mean.
pub fn fit(field: &GriddedField, max_modes: usize) -> Result<EofDecomposition, PslDataError> {
    let nt = field.num_times();
    let cells = field.num_cells();
    if nt < 2 || cells == 0 {
        return Err(PslDataError::EmptySelection);
    }

    let mean = field.mean_over_time();
    let (ny, nx) = (field.lats().len(), field.lons().len());

    let weights: Vec<f64> = field
        .lats()
        .iter()
        .map(|lat| lat.to_radians().cos().max(0.0).sqrt())
        .collect();

    let matrix = DMatrix::from_fn(nt, cells, |t, c| {
        let (y, x) = (c / nx, c % nx);
        let v = field.value(t, y, x);
        let m = mean[c];
        let anomaly = if v.is_finite() && m.is_finite() {
            v - m
        } else {
            0.0
        };
        anomaly * weights[y]
    });

    let svd = matrix.svd(true, true);
    let u = svd.u.ok_or(PslDataError::EmptySelection)?;
    let v_t = svd.v_t.ok_or(PslDataError::EmptySelection)?;
    let singular = &svd.singular_values;

    let total: f64 = singular.iter().map(|s| s * s).sum();
    let rank = singular.len().min(nt.saturating_sub(1));
    let n_modes = max_modes.min(rank);

    let mut modes = Vec::with_capacity(n_modes);
    for m in 0..n_modes {
        let s = singular[m];
        let pattern: Vec<f64> = (0..cells)
            .map(|c| {
                let w = weights[c / nx];
                if w > 1e-9 {
                    v_t[(m, c)] / w
                } else {
                    0.0
                }
            })
            .collect();
        let scores: Vec<f64> = (0..nt).map(|t| u[(t, m)] * s).collect();
        modes.push(EofMode {
            pattern,
            scores,
            explained_variance: if total > 0.0 { (s * s) / total } else { 0.0 },
        });
    }

    debug_assert_eq!(mean.len(), ny * nx);
    Ok(EofDecomposition {
        times: field.times().to_vec(),
        lats: field.lats().to_vec(),
        lons: field.lons().to_vec(),
        mean,
        modes,
    })
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

    /// A field whose only variability is one standing pattern oscillating in
    /// time: EOF1 should capture essentially all the variance.
    fn single_pattern_field() -> GriddedField {
        let lats = vec![40.0, 30.0, 20.0];
        let lons = vec![0.0, 10.0, 20.0, 30.0];
        let pattern: Vec<f64> = (0..12).map(|c| ((c % 5) as f64) - 2.0).collect();
        let amplitudes = [1.0, -0.5, 2.0, -2.5, 0.5, 1.5];
        let mut values = Vec::new();
        for &a in &amplitudes {
            for &p in &pattern {
                values.push(10.0 + a * p);
            }
        }
        let times = (1..=6).map(dt).collect();
        GriddedField::new(times, lats, lons, values).unwrap()
    }

    #[test]
    fn leading_mode_captures_a_standing_oscillation() {
        let field = single_pattern_field();
        let eof = fit(&field, 2).unwrap();

        assert_eq!(eof.mean.len(), 12);
        assert!(!eof.modes.is_empty());
        let first = &eof.modes[0];
        assert!(
            first.explained_variance > 0.99,
            "expected one dominant mode, got {}",
            first.explained_variance
        );
        assert_eq!(first.scores.len(), 6);
        assert_eq!(first.pattern.len(), 12);
    }

    #[test]
    fn modes_are_ordered_by_explained_variance() {
        let lats = vec![45.0, 35.0];
        let lons = vec![0.0, 10.0, 20.0];
        // Two independent oscillations with different strengths.
        let mut values = Vec::new();
        for t in 0..8 {
            let a = if t % 2 == 0 { 3.0 } else { -3.0 };
            let b = if t % 4 < 2 { 0.5 } else { -0.5 };
            for c in 0..6 {
                let p1 = if c < 3 { 1.0 } else { -1.0 };
                let p2 = if c % 2 == 0 { 1.0 } else { -1.0 };
                values.push(a * p1 + b * p2);
            }
        }
        let times = (1..=8).map(dt).collect();
        let field = GriddedField::new(times, lats, lons, values).unwrap();

        let eof = fit(&field, 3).unwrap();
        for pair in eof.modes.windows(2) {
            assert!(pair[0].explained_variance >= pair[1].explained_variance);
        }
        let total: f64 = eof.modes.iter().map(|m| m.explained_variance).sum();
        assert!(total <= 1.0 + 1e-9);
    }

    #[test]
    fn too_short_a_record_is_rejected() {
        let field = GriddedField::new(vec![dt(1)], vec![0.0], vec![0.0], vec![1.0]).unwrap();
        assert!(fit(&field, 2).is_err());
    }
}
