//! Unit conversions and small meteorological formulas shared by the PRISM and
//! reanalysis pathways.

/// Converts degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Converts degrees Fahrenheit to degrees Celsius.
pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

/// Converts Kelvin to degrees Celsius.
pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - 273.15
}

/// Converts millimeters to inches.
pub fn mm_to_inches(mm: f64) -> f64 {
    mm / 25.4
}

/// Saturation vapor pressure in hPa for a temperature in degrees Celsius
/// (Magnus approximation, coefficients 7.5 / 237.3).
pub fn saturation_vapor_pressure(celsius: f64) -> f64 {
    6.11 * 10f64.powf(7.5 * celsius / (237.3 + celsius))
}

/// Relative humidity (percent) from air temperature and dew point, both given
/// in degrees Fahrenheit.
///
/// The PRISM rasters store temperatures in Celsius but the humidity product is
/// derived after the display conversion, so this takes Fahrenheit inputs and
/// converts back internally. Saturated air (dew point equal to temperature)
/// yields exactly 100.
pub fn relative_humidity_from_fahrenheit(temp_f: f64, dewpoint_f: f64) -> f64 {
    let t = fahrenheit_to_celsius(temp_f);
    let td = fahrenheit_to_celsius(dewpoint_f);
    let e = saturation_vapor_pressure(td);
    let es = saturation_vapor_pressure(t);
    (e / es) * 100.0
}

/// Rounds down to the nearest multiple of `step`.
pub fn round_down_to(value: i64, step: i64) -> i64 {
    value.div_euclid(step) * step
}

/// Rounds up to the nearest multiple of `step`.
pub fn round_up_to(value: i64, step: i64) -> i64 {
    -(-value).div_euclid(step) * step
}

/// Three-letter month abbreviation for a 1-based month number.
pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    const ABBREVIATIONS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    ABBREVIATIONS.get(month.checked_sub(1)? as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_fahrenheit_round_trip() {
        for c in [-40.0, 0.0, 37.0, 100.0] {
            let back = fahrenheit_to_celsius(celsius_to_fahrenheit(c));
            assert!((back - c).abs() < 1e-10, "round trip failed for {c}");
        }
    }

    #[test]
    fn fahrenheit_fixed_points() {
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
    }

    #[test]
    fn millimeters_to_inches() {
        assert!((mm_to_inches(25.4) - 1.0).abs() < 1e-12);
        assert!((mm_to_inches(0.0)).abs() < 1e-12);
    }

    #[test]
    fn saturated_air_is_100_percent() {
        for f in [10.0, 32.0, 68.0, 95.0] {
            let rh = relative_humidity_from_fahrenheit(f, f);
            assert!((rh - 100.0).abs() < 1e-9, "expected 100, got {rh}");
        }
    }

    #[test]
    fn humidity_drops_with_dew_point_depression() {
        let rh_humid = relative_humidity_from_fahrenheit(70.0, 65.0);
        let rh_dry = relative_humidity_from_fahrenheit(70.0, 30.0);
        assert!(rh_humid < 100.0);
        assert!(rh_dry < rh_humid);
        assert!(rh_dry > 0.0);
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round_down_to(13, 5), 10);
        assert_eq!(round_down_to(-13, 5), -15);
        assert_eq!(round_up_to(13, 5), 15);
        assert_eq!(round_up_to(-13, 5), -10);
        assert_eq!(round_down_to(15, 5), 15);
        assert_eq!(round_up_to(15, 5), 15);
    }

    #[test]
    fn month_abbreviations() {
        assert_eq!(month_abbreviation(1), Some("JAN"));
        assert_eq!(month_abbreviation(12), Some("DEC"));
        assert_eq!(month_abbreviation(0), None);
        assert_eq!(month_abbreviation(13), None);
    }
}
