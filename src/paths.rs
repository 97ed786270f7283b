//! Deterministic output directory tree for saved graphics.
//!
//! Path computation is pure; directory creation happens in a separate
//! [`OutputTree::ensure`] step so tests can assert on the generated layout
//! without touching the filesystem.

use crate::types::prism::{
    MissingDay, NormalType, PrismProduct, PrismRegion, PrismVariable, ReferenceSystem, Resolution,
};
use crate::types::reanalysis::LevelType;
use crate::types::spatial::SpatialWindow;
use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_ROOT: &str = "Climate Analysis Graphics";

/// The root of the graphics output tree.
#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl Default for OutputTree {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
        }
    }
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output directory for a reanalysis plot:
    /// `<root>/NOAA PSL/<VAR>/<LEVEL>/<bounds>/<start>_to_<end>`.
    pub fn noaa_psl_path(
        &self,
        variable: &str,
        level: LevelType,
        window: &SpatialWindow,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PathBuf {
        self.root
            .join("NOAA PSL")
            .join(variable.to_uppercase())
            .join(level.dir_label())
            .join(bounds_segment(window))
            .join(format!(
                "{}_to_{}",
                start.format("%Y_%m_%d"),
                end.format("%Y_%m_%d")
            ))
    }

    /// Output directory for a PRISM plot. The branch layout depends on the
    /// product: daily data nests year/month/day, monthly data year/month, and
    /// normals nest by month (plus day for daily normals) with the normal
    /// type as its own segment. Daily layouts need a day of month.
    #[allow(clippy::too_many_arguments)]
    pub fn prism_path(
        &self,
        product: PrismProduct,
        region: PrismRegion,
        variable: PrismVariable,
        year: i32,
        month: u32,
        day: Option<u32>,
        resolution: Resolution,
        normal_type: NormalType,
        reference_system: ReferenceSystem,
    ) -> Result<PathBuf, MissingDay> {
        let base = self
            .root
            .join("PRISM")
            .join(product.dir_label())
            .join(region.dir_label())
            .join(variable.code().to_uppercase());
        let month_seg = format!("{month:02}");
        let day_seg = day.map(|d| format!("{d:02}"));
        Ok(match product {
            PrismProduct::Daily => base
                .join(year.to_string())
                .join(month_seg)
                .join(day_seg.ok_or(MissingDay("data"))?)
                .join(resolution.dir_label())
                .join(reference_system.dir_label()),
            PrismProduct::Monthly => base
                .join(year.to_string())
                .join(month_seg)
                .join(resolution.dir_label())
                .join(reference_system.dir_label()),
            PrismProduct::Normals => {
                let base = base.join(month_seg);
                let base = match normal_type {
                    NormalType::Daily => base.join(day_seg.ok_or(MissingDay("normals"))?),
                    NormalType::Monthly => base,
                };
                base.join(resolution.dir_label())
                    .join(normal_type.dir_label())
                    .join(reference_system.dir_label())
            }
        })
    }

    /// Creates the directory (and any missing parents).
    pub async fn ensure(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }
}

/// Bounding-box path segment with hemisphere suffixes, ordered
/// west, east, north, south: `10W_20E_30N_5S`.
fn bounds_segment(window: &SpatialWindow) -> String {
    let wsym = if window.west <= 0.0 { 'W' } else { 'E' };
    let esym = if window.east <= 0.0 { 'W' } else { 'E' };
    let nsym = if window.north >= 0.0 { 'N' } else { 'S' };
    let ssym = if window.south >= 0.0 { 'N' } else { 'S' };
    format!(
        "{}{}_{}{}_{}{}_{}{}",
        fmt_degrees(window.west.abs()),
        wsym,
        fmt_degrees(window.east.abs()),
        esym,
        fmt_degrees(window.north.abs()),
        nsym,
        fmt_degrees(window.south.abs()),
        ssym,
    )
}

/// Formats a degree magnitude without a trailing `.0` for whole values.
fn fmt_degrees(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reanalysis_path_matches_fixed_example() {
        let tree = OutputTree::default();
        let window = SpatialWindow::new(-10.0, 20.0, -5.0, 30.0).unwrap();
        let path = tree.noaa_psl_path(
            "air",
            LevelType::Pressure,
            &window,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
        );
        assert_eq!(
            path,
            PathBuf::from(
                "Climate Analysis Graphics/NOAA PSL/AIR/PRESSURE/10W_20E_30N_5S/2020_01_01_to_2020_01_31"
            )
        );
    }

    #[test]
    fn zero_bounds_take_west_and_north_suffixes() {
        let window = SpatialWindow::new(0.0, 20.0, 0.0, 30.0).unwrap();
        assert_eq!(bounds_segment(&window), "0W_20E_30N_0N");
    }

    #[test]
    fn fractional_bounds_keep_their_decimals() {
        let window = SpatialWindow::new(-10.5, 20.0, -5.0, 30.25).unwrap();
        assert_eq!(bounds_segment(&window), "10.5W_20E_30.25N_5S");
    }

    #[test]
    fn prism_daily_path_layout() {
        let tree = OutputTree::default();
        let path = tree.prism_path(
            PrismProduct::Daily,
            PrismRegion::Conus,
            PrismVariable::Tmax,
            2024,
            7,
            Some(4),
            Resolution::FourKm,
            NormalType::Monthly,
            ReferenceSystem::StatesAndCounties,
        );
        assert_eq!(
            path.unwrap(),
            PathBuf::from(
                "Climate Analysis Graphics/PRISM/DAILY/US/TMAX/2024/07/04/4KM/STATES & COUNTIES"
            )
        );
    }

    #[test]
    fn daily_layouts_without_a_day_are_an_error() {
        let tree = OutputTree::default();
        let daily = tree.prism_path(
            PrismProduct::Daily,
            PrismRegion::Conus,
            PrismVariable::Tmax,
            2024,
            7,
            None,
            Resolution::FourKm,
            NormalType::Monthly,
            ReferenceSystem::StatesAndCounties,
        );
        assert_eq!(daily, Err(MissingDay("data")));

        let normals = tree.prism_path(
            PrismProduct::Normals,
            PrismRegion::Conus,
            PrismVariable::Tmean,
            2020,
            3,
            None,
            Resolution::FourKm,
            NormalType::Daily,
            ReferenceSystem::StatesAndCounties,
        );
        assert_eq!(normals, Err(MissingDay("normals")));
    }

    #[test]
    fn prism_monthly_normals_path_layout() {
        let tree = OutputTree::default();
        let path = tree.prism_path(
            PrismProduct::Normals,
            PrismRegion::Conus,
            PrismVariable::Ppt,
            2020,
            3,
            None,
            Resolution::FourKm,
            NormalType::Monthly,
            ReferenceSystem::GaccAndPsa,
        );
        assert_eq!(
            path.unwrap(),
            PathBuf::from(
                "Climate Analysis Graphics/PRISM/NORMALS/US/PPT/03/4KM/MONTHLY/GACC & PSA"
            )
        );
    }

    #[test]
    fn prism_daily_normals_include_day_segment() {
        let tree = OutputTree::default();
        let path = tree.prism_path(
            PrismProduct::Normals,
            PrismRegion::Alaska,
            PrismVariable::Tmean,
            2020,
            12,
            Some(25),
            Resolution::EightHundredM,
            NormalType::Daily,
            ReferenceSystem::StatesOnly,
        );
        assert_eq!(
            path.unwrap(),
            PathBuf::from(
                "Climate Analysis Graphics/PRISM/NORMALS/AK/TMEAN/12/25/800M/DAILY/STATES ONLY"
            )
        );
    }
}
