//! Geographic bounding windows used to trim fetched grids and tables.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid spatial window: west ({west}) must be less than east ({east}) and south ({south}) less than north ({north})")]
pub struct InvalidWindow {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

/// A rectangular geographic window in decimal degrees.
///
/// Western and southern hemisphere bounds are negative. The constructor
/// enforces `west < east` and `south < north`; all trims and renders treat the
/// bounds as inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialWindow {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl SpatialWindow {
    /// The whole earth, used when a plot is requested with the globe flag.
    pub const GLOBE: SpatialWindow = SpatialWindow {
        west: -180.0,
        east: 180.0,
        south: -90.0,
        north: 90.0,
    };

    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self, InvalidWindow> {
        if west >= east || south >= north {
            return Err(InvalidWindow {
                west,
                east,
                south,
                north,
            });
        }
        Ok(Self {
            west,
            east,
            south,
            north,
        })
    }

    /// Expands the window by `margin` degrees on every side, clamped to the
    /// valid latitude/longitude range. Reanalysis fetches pad by 2 degrees so
    /// the requested window never sits on the edge of the retrieved grid.
    pub fn padded(&self, margin: f64) -> SpatialWindow {
        SpatialWindow {
            west: (self.west - margin).max(-180.0),
            east: (self.east + margin).min(180.0),
            south: (self.south - margin).max(-90.0),
            north: (self.north + margin).min(90.0),
        }
    }

    /// Inclusive containment check.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_windows() {
        assert!(SpatialWindow::new(10.0, 10.0, 0.0, 5.0).is_err());
        assert!(SpatialWindow::new(20.0, 10.0, 0.0, 5.0).is_err());
        assert!(SpatialWindow::new(-10.0, 10.0, 5.0, -5.0).is_err());
    }

    #[test]
    fn padding_clamps_to_valid_range() {
        let w = SpatialWindow::new(-179.0, 179.0, -89.5, 89.5).unwrap();
        let padded = w.padded(2.0);
        assert_eq!(padded.west, -180.0);
        assert_eq!(padded.east, 180.0);
        assert_eq!(padded.south, -90.0);
        assert_eq!(padded.north, 90.0);

        let inner = SpatialWindow::new(-10.0, 20.0, -5.0, 30.0).unwrap();
        let padded = inner.padded(2.0);
        assert_eq!(padded.west, -12.0);
        assert_eq!(padded.east, 22.0);
        assert_eq!(padded.south, -7.0);
        assert_eq!(padded.north, 32.0);
    }

    #[test]
    fn containment_is_inclusive() {
        let w = SpatialWindow::new(-10.0, 20.0, -5.0, 30.0).unwrap();
        assert!(w.contains(30.0, 20.0));
        assert!(w.contains(-5.0, -10.0));
        assert!(!w.contains(30.1, 0.0));
        assert!(!w.contains(0.0, -10.1));
    }
}
