//! Closed enumerations describing PRISM Climate Group products.
//!
//! The original data service is keyed entirely by lower-case string codes;
//! these enums keep each mapping in one place instead of scattering string
//! comparisons through the fetch and plot paths.

use std::fmt;
use thiserror::Error;

/// A daily product or daily normal was requested without a day of month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a day of month is required for daily {0}")]
pub struct MissingDay(pub &'static str);

/// A PRISM raster variable.
///
/// `Rhmean` is derived, never downloaded: it is computed from the `tmean` and
/// `tdmean` rasters of the same period. The four `sol*` variables exist only
/// as normals at 800 m resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrismVariable {
    /// Total precipitation (rain + melted snow), millimeters.
    Ppt,
    /// Mean dew point temperature, Celsius.
    Tdmean,
    /// Maximum temperature, Celsius.
    Tmax,
    /// Mean temperature, (tmax + tmin) / 2, Celsius.
    Tmean,
    /// Minimum temperature, Celsius.
    Tmin,
    /// Maximum vapor pressure deficit, hPa.
    Vpdmax,
    /// Minimum vapor pressure deficit, hPa.
    Vpdmin,
    /// Clear-sky shortwave radiation (normals only).
    Solclear,
    /// Sloped-surface shortwave radiation (normals only).
    Solslope,
    /// Total shortwave radiation (normals only).
    Soltotal,
    /// Atmospheric transmittance (normals only).
    Soltrans,
    /// Mean relative humidity, derived from tmean and tdmean, percent.
    Rhmean,
}

impl PrismVariable {
    /// The lower-case code used in PRISM URLs and filenames.
    pub fn code(&self) -> &'static str {
        match self {
            PrismVariable::Ppt => "ppt",
            PrismVariable::Tdmean => "tdmean",
            PrismVariable::Tmax => "tmax",
            PrismVariable::Tmean => "tmean",
            PrismVariable::Tmin => "tmin",
            PrismVariable::Vpdmax => "vpdmax",
            PrismVariable::Vpdmin => "vpdmin",
            PrismVariable::Solclear => "solclear",
            PrismVariable::Solslope => "solslope",
            PrismVariable::Soltotal => "soltotal",
            PrismVariable::Soltrans => "soltrans",
            PrismVariable::Rhmean => "rhmean",
        }
    }

    /// Temperature-family variables are displayed in Fahrenheit and use the
    /// difference anomaly convention.
    pub fn is_temperature(&self) -> bool {
        matches!(
            self,
            PrismVariable::Tmax | PrismVariable::Tmean | PrismVariable::Tmin | PrismVariable::Tdmean
        )
    }

    pub fn is_precipitation(&self) -> bool {
        matches!(self, PrismVariable::Ppt)
    }

    /// Derived variables have no raster of their own on the archive.
    pub fn is_derived(&self) -> bool {
        matches!(self, PrismVariable::Rhmean)
    }
}

impl fmt::Display for PrismVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The PRISM product cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrismProduct {
    Daily,
    Monthly,
    /// 30-year (1991-2020) climate normals.
    Normals,
}

impl PrismProduct {
    pub(crate) fn dir_label(&self) -> &'static str {
        match self {
            PrismProduct::Daily => "DAILY",
            PrismProduct::Monthly => "MONTHLY",
            PrismProduct::Normals => "NORMALS",
        }
    }

    pub(crate) fn cadence_segment(&self) -> &'static str {
        match self {
            PrismProduct::Daily => "daily",
            PrismProduct::Monthly => "monthly",
            PrismProduct::Normals => "normals",
        }
    }
}

impl fmt::Display for PrismProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cadence_segment())
    }
}

/// Daily or monthly climate normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalType {
    Daily,
    Monthly,
}

impl NormalType {
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            NormalType::Daily => "daily",
            NormalType::Monthly => "monthly",
        }
    }

    pub(crate) fn dir_label(&self) -> &'static str {
        match self {
            NormalType::Daily => "DAILY",
            NormalType::Monthly => "MONTHLY",
        }
    }
}

/// Coverage region of a PRISM raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrismRegion {
    /// Conterminous United States.
    Conus,
    Alaska,
}

impl PrismRegion {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            PrismRegion::Conus => "us",
            PrismRegion::Alaska => "ak",
        }
    }

    pub(crate) fn dir_label(&self) -> &'static str {
        match self {
            PrismRegion::Conus => "US",
            PrismRegion::Alaska => "AK",
        }
    }
}

/// Grid resolution of a PRISM raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    FourKm,
    EightHundredM,
}

impl Resolution {
    /// URL path segment for the resolution.
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            Resolution::FourKm => "4km",
            Resolution::EightHundredM => "800m",
        }
    }

    /// Grid-size token embedded in the archive filename. The 4 km grid is
    /// published under the 25-arcsecond token.
    pub(crate) fn grid_token(&self) -> &'static str {
        match self {
            Resolution::FourKm => "25m",
            Resolution::EightHundredM => "800m",
        }
    }

    pub(crate) fn dir_label(&self) -> &'static str {
        match self {
            Resolution::FourKm => "4KM",
            Resolution::EightHundredM => "800M",
        }
    }
}

/// The geographic reference system a map is labelled with.
///
/// Border shapefiles themselves are not drawn by this crate; the reference
/// system survives as a directory label so graphics produced against
/// different boundary sets never overwrite one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSystem {
    StatesAndCounties,
    StatesOnly,
    GaccOnly,
    GaccAndPsa,
    CwaOnly,
    CwasAndPublicZones,
    CwasAndFireWeatherZones,
    CwasAndCounties,
    GaccPsaAndFireWeatherZones,
    GaccPsaAndPublicZones,
    GaccPsaAndCwa,
    GaccPsaAndCounties,
    GaccAndCounties,
    Custom,
}

impl ReferenceSystem {
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceSystem::StatesAndCounties => "States & Counties",
            ReferenceSystem::StatesOnly => "States Only",
            ReferenceSystem::GaccOnly => "GACC Only",
            ReferenceSystem::GaccAndPsa => "GACC & PSA",
            ReferenceSystem::CwaOnly => "CWA Only",
            ReferenceSystem::CwasAndPublicZones => "NWS CWAs & NWS Public Zones",
            ReferenceSystem::CwasAndFireWeatherZones => "NWS CWAs & NWS Fire Weather Zones",
            ReferenceSystem::CwasAndCounties => "NWS CWAs & Counties",
            ReferenceSystem::GaccPsaAndFireWeatherZones => "GACC & PSA & NWS Fire Weather Zones",
            ReferenceSystem::GaccPsaAndPublicZones => "GACC & PSA & NWS Public Zones",
            ReferenceSystem::GaccPsaAndCwa => "GACC & PSA & NWS CWA",
            ReferenceSystem::GaccPsaAndCounties => "GACC & PSA & Counties",
            ReferenceSystem::GaccAndCounties => "GACC & Counties",
            ReferenceSystem::Custom => "Custom",
        }
    }

    pub(crate) fn dir_label(&self) -> String {
        self.label().to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_codes_are_lowercase_and_unique() {
        let all = [
            PrismVariable::Ppt,
            PrismVariable::Tdmean,
            PrismVariable::Tmax,
            PrismVariable::Tmean,
            PrismVariable::Tmin,
            PrismVariable::Vpdmax,
            PrismVariable::Vpdmin,
            PrismVariable::Solclear,
            PrismVariable::Solslope,
            PrismVariable::Soltotal,
            PrismVariable::Soltrans,
            PrismVariable::Rhmean,
        ];
        let mut seen = std::collections::HashSet::new();
        for v in all {
            let code = v.code();
            assert_eq!(code, code.to_lowercase());
            assert!(seen.insert(code), "duplicate code {code}");
        }
    }

    #[test]
    fn temperature_family_membership() {
        assert!(PrismVariable::Tmax.is_temperature());
        assert!(PrismVariable::Tdmean.is_temperature());
        assert!(!PrismVariable::Ppt.is_temperature());
        assert!(!PrismVariable::Rhmean.is_temperature());
        assert!(PrismVariable::Rhmean.is_derived());
    }

    #[test]
    fn resolution_tokens() {
        assert_eq!(Resolution::FourKm.path_segment(), "4km");
        assert_eq!(Resolution::FourKm.grid_token(), "25m");
        assert_eq!(Resolution::EightHundredM.grid_token(), "800m");
    }

    #[test]
    fn reference_system_labels_round_trip_to_dir_labels() {
        assert_eq!(
            ReferenceSystem::StatesAndCounties.dir_label(),
            "STATES & COUNTIES"
        );
        assert_eq!(
            ReferenceSystem::GaccPsaAndCwa.dir_label(),
            "GACC & PSA & NWS CWA"
        );
    }
}
