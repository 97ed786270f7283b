//! Variable catalog for the NCEP/NCAR reanalysis served by NOAA PSL.
//!
//! Each level type exposes a fixed mapping from variable identifier to the
//! aggregation filename on the THREDDS server. The mappings are data, not
//! logic; unknown identifiers surface as a typed error at lookup time.

use std::fmt;

/// The spatial source category of a reanalysis variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelType {
    /// Pressure-level fields (17 standard levels).
    Pressure,
    /// Surface fields on the T62 Gaussian grid.
    SurfaceGauss,
    /// Surface and sigma-995 fields on the regular 2.5 degree grid.
    Surface,
}

impl LevelType {
    /// Path segment under the THREDDS aggregation root.
    pub(crate) fn path_segment(&self) -> &'static str {
        match self {
            LevelType::Pressure => "pressure",
            LevelType::SurfaceGauss => "surface_gauss",
            LevelType::Surface => "surface",
        }
    }

    /// Upper-case label used in the output directory tree.
    pub(crate) fn dir_label(&self) -> &'static str {
        match self {
            LevelType::Pressure => "PRESSURE",
            LevelType::SurfaceGauss => "SURFACE_GAUSS",
            LevelType::Surface => "SURFACE",
        }
    }

    /// The variable identifier to aggregation filename table for this level.
    pub fn variable_table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            LevelType::Pressure => &[
                ("air", "air.nc"),
                ("hgt", "hgt.nc"),
                ("rhum", "rhum.nc"),
                ("shum", "shum.nc"),
                ("omega", "omega.nc"),
                ("uwnd", "uwnd.nc"),
                ("vwnd", "vwnd.nc"),
            ],
            LevelType::SurfaceGauss => &[
                ("air", "air.2m.gauss.nc"),
                ("skt", "skt.sfc.gauss.nc"),
                ("prate", "prate.sfc.gauss.nc"),
                ("lhtfl", "lhtfl.sfc.gauss.nc"),
                ("shtfl", "shtfl.sfc.gauss.nc"),
                ("uwnd", "uwnd.10m.gauss.nc"),
                ("vwnd", "vwnd.10m.gauss.nc"),
                ("cfnlf", "cfnlf.sfc.gauss.nc"),
                ("pevpr", "pevpr.sfc.gauss.nc"),
            ],
            LevelType::Surface => &[
                ("pr_wtr", "pr_wtr.eatm.nc"),
                ("slp", "slp.nc"),
                ("pres", "pres.sfc.nc"),
                ("air", "air.sig995.nc"),
                ("omega", "omega.sig995.nc"),
                ("pottmp", "pottmp.sig995.nc"),
                ("rhum", "rhum.sig995.nc"),
                ("uwnd", "uwnd.sig995.nc"),
                ("vwnd", "vwnd.sig995.nc"),
                ("lftx", "lftx.sfc.nc"),
            ],
        }
    }

    /// Looks up the (category path segment, filename) pair for a variable.
    pub fn variable_path(&self, variable: &str) -> Option<(&'static str, &'static str)> {
        self.variable_table()
            .iter()
            .find(|(id, _)| *id == variable)
            .map(|(_, file)| (self.path_segment(), *file))
    }

    /// Human-readable map title for a variable, falling back to the
    /// upper-cased identifier when the variable has no curated title.
    pub fn plot_title(&self, variable: &str) -> String {
        let curated = match (self, variable) {
            (LevelType::SurfaceGauss, "air") => Some("2-METER TEMPERATURE"),
            (LevelType::SurfaceGauss, "skt") => Some("SKIN TEMPERATURE"),
            (LevelType::SurfaceGauss, "prate") => Some("PRECIPITATION RATE"),
            (LevelType::Pressure, "air") => Some("TEMPERATURE"),
            (LevelType::Pressure, "hgt") => Some("GEOPOTENTIAL HEIGHT"),
            (LevelType::Surface, "slp") => Some("SEA LEVEL PRESSURE"),
            (LevelType::Surface, "pr_wtr") => Some("PRECIPITABLE WATER"),
            _ => None,
        };
        curated
            .map(str::to_string)
            .unwrap_or_else(|| variable.to_uppercase())
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_LEVELS: [LevelType; 3] = [
        LevelType::Pressure,
        LevelType::SurfaceGauss,
        LevelType::Surface,
    ];

    #[test]
    fn every_catalog_entry_resolves_to_a_non_empty_pair() {
        for level in ALL_LEVELS {
            for (id, _) in level.variable_table() {
                let (dir, file) = level
                    .variable_path(id)
                    .unwrap_or_else(|| panic!("missing path for {id} at {level}"));
                assert!(!dir.is_empty());
                assert!(!file.is_empty());
                assert!(file.ends_with(".nc"));
            }
        }
    }

    #[test]
    fn unknown_variable_is_rejected() {
        for level in ALL_LEVELS {
            assert!(level.variable_path("no_such_var").is_none());
        }
    }

    #[test]
    fn air_resolves_per_level() {
        assert_eq!(
            LevelType::Pressure.variable_path("air"),
            Some(("pressure", "air.nc"))
        );
        assert_eq!(
            LevelType::SurfaceGauss.variable_path("air"),
            Some(("surface_gauss", "air.2m.gauss.nc"))
        );
        assert_eq!(
            LevelType::Surface.variable_path("air"),
            Some(("surface", "air.sig995.nc"))
        );
    }

    #[test]
    fn titles_fall_back_to_identifier() {
        assert_eq!(
            LevelType::SurfaceGauss.plot_title("air"),
            "2-METER TEMPERATURE"
        );
        assert_eq!(LevelType::Pressure.plot_title("omega"), "OMEGA");
    }
}
