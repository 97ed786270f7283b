//! Piecewise-linear colormaps for map rendering.
//!
//! Each map product carries its own gradient: sequential ramps for absolute
//! quantities, diverging ramps centered on zero (or 100 percent) for
//! anomalies.

use image::Rgba;

/// A gradient defined by color stops at positions in [0, 1].
#[derive(Debug, Clone)]
pub struct Colormap {
    stops: Vec<(f64, [u8; 3])>,
}

impl Colormap {
    fn new(stops: Vec<(f64, [u8; 3])>) -> Self {
        debug_assert!(stops.len() >= 2);
        Self { stops }
    }

    /// Samples the gradient at a normalized position, clamped to [0, 1].
    pub fn sample(&self, t: f64) -> Rgba<u8> {
        let t = t.clamp(0.0, 1.0);
        let mut lower = self.stops[0];
        for &stop in &self.stops {
            if stop.0 <= t {
                lower = stop;
            } else {
                let span = stop.0 - lower.0;
                let f = if span > 0.0 { (t - lower.0) / span } else { 0.0 };
                return Rgba([
                    lerp(lower.1[0], stop.1[0], f),
                    lerp(lower.1[1], stop.1[1], f),
                    lerp(lower.1[2], stop.1[2], f),
                    255,
                ]);
            }
        }
        Rgba([lower.1[0], lower.1[1], lower.1[2], 255])
    }

    /// Cold-to-hot ramp for absolute temperatures.
    pub fn temperature() -> Self {
        Self::new(vec![
            (0.0, [25, 0, 76]),     // deep purple
            (0.15, [0, 0, 255]),    // blue
            (0.35, [0, 255, 255]),  // cyan
            (0.5, [0, 255, 0]),     // green
            (0.65, [255, 255, 0]),  // yellow
            (0.8, [255, 165, 0]),   // orange
            (0.92, [255, 0, 0]),    // red
            (1.0, [139, 0, 0]),     // dark red
        ])
    }

    /// Diverging blue-white-red ramp for temperature anomalies.
    pub fn temperature_change() -> Self {
        Self::new(vec![
            (0.0, [8, 48, 107]),     // dark blue
            (0.25, [67, 147, 195]),  // steel blue
            (0.5, [247, 247, 247]),  // near-white
            (0.75, [214, 96, 77]),   // soft red
            (1.0, [103, 0, 31]),     // dark red
        ])
    }

    /// Dry-tan to saturated-blue ramp for dew point and humidity.
    pub fn moisture() -> Self {
        Self::new(vec![
            (0.0, [210, 180, 140]),  // tan
            (0.25, [255, 255, 150]), // pale yellow
            (0.5, [173, 255, 47]),   // green-yellow
            (0.75, [100, 200, 255]), // light blue
            (1.0, [25, 50, 200]),    // dark blue
        ])
    }

    /// Sequential white-to-green ramp for precipitation totals.
    pub fn precipitation() -> Self {
        Self::new(vec![
            (0.0, [255, 255, 255]),
            (0.3, [199, 233, 192]),
            (0.6, [65, 171, 93]),
            (0.85, [0, 109, 44]),
            (1.0, [0, 68, 27]),
        ])
    }

    /// Diverging brown-white-green ramp for percent-of-normal precipitation,
    /// centered on 100 percent.
    pub fn precipitation_anomaly() -> Self {
        Self::new(vec![
            (0.0, [84, 48, 5]),      // dark brown
            (0.25, [191, 129, 45]),  // ochre
            (0.5, [245, 245, 245]),  // near-white at 100%
            (0.75, [90, 174, 97]),   // green
            (1.0, [0, 60, 48]),      // dark teal
        ])
    }

    /// Symmetric purple-white-orange ramp for EOF spatial patterns, which
    /// carry no absolute unit.
    pub fn signed_pattern() -> Self {
        Self::new(vec![
            (0.0, [84, 39, 136]),    // purple
            (0.25, [153, 112, 193]),
            (0.5, [247, 247, 247]),
            (0.75, [230, 145, 56]),
            (1.0, [179, 88, 6]),     // burnt orange
        ])
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}
