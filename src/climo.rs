//! This module provides the main entry point for producing climate analysis
//! graphics. It covers two workflows: annotated PRISM maps (daily, monthly
//! and 30-year-normal rasters, plus derived humidity and anomaly products)
//! and EOF decompositions of NCEP/NCAR reanalysis fields from NOAA PSL.

use crate::error::ClimoError;
use crate::paths::OutputTree;
use crate::prism::derive::{self, ColorScale, DeriveError};
use crate::prism::fetch::{ArchiveRequest, PrismDataLoader};
use crate::psl::eof;
use crate::psl::fetch::PslDataLoader;
use crate::render::colormap::Colormap;
use crate::render::{map, series};
use crate::types::prism::{
    NormalType, PrismProduct, PrismRegion, PrismVariable, ReferenceSystem, Resolution,
};
use crate::types::reanalysis::LevelType;
use crate::types::spatial::SpatialWindow;
use bon::bon;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::path::PathBuf;

/// The main client for producing climate analysis graphics.
///
/// The client owns the two data loaders (PRISM archive downloads and NOAA PSL
/// reanalysis access) and the output directory tree. Every plotting method
/// downloads what it needs, derives the requested product, renders it and
/// returns the path(s) of the PNG file(s) it wrote.
///
/// Create an instance with [`Climo::new()`] for the default folders
/// (`Climate Analysis Graphics` for output, `PRISM Data` for downloads) or
/// [`Climo::with_folders()`] to place both explicitly.
///
/// # Examples
///
/// ```no_run
/// use climo::{Climo, ClimoError, PrismProduct, PrismVariable, SpatialWindow};
///
/// # async fn run() -> Result<(), ClimoError> {
/// let client = Climo::new();
/// let window = SpatialWindow::new(-125.0, -66.0, 24.0, 50.0)?;
/// let png = client
///     .plot_prism()
///     .product(PrismProduct::Monthly)
///     .variable(PrismVariable::Tmax)
///     .year(2024)
///     .month(6)
///     .window(window)
///     .call()
///     .await?;
/// println!("wrote {}", png.display());
/// # Ok(())
/// # }
/// ```
pub struct Climo {
    output: OutputTree,
    psl: PslDataLoader,
    prism: PrismDataLoader,
}

impl Default for Climo {
    fn default() -> Self {
        Self::new()
    }
}

impl Climo {
    /// Creates a client using the default output and data folders, both
    /// relative to the working directory.
    pub fn new() -> Self {
        Self {
            output: OutputTree::default(),
            psl: PslDataLoader::new(),
            prism: PrismDataLoader::default(),
        }
    }

    /// Creates a client with explicit folders: `output_root` receives the
    /// graphics tree, `data_folder` holds downloaded PRISM archives.
    pub fn with_folders(output_root: impl Into<PathBuf>, data_folder: impl Into<PathBuf>) -> Self {
        Self {
            output: OutputTree::new(output_root),
            psl: PslDataLoader::new(),
            prism: PrismDataLoader::new(data_folder),
        }
    }

    /// Fetches one PRISM observation table, deriving mean relative humidity
    /// from the temperature and dew point rasters when asked for `rhmean`.
    async fn prism_table(
        &self,
        request: ArchiveRequest,
    ) -> Result<DataFrame, ClimoError> {
        if request.variable == PrismVariable::Rhmean {
            let tmean = self
                .prism
                .fetch_table(ArchiveRequest {
                    variable: PrismVariable::Tmean,
                    ..request
                })
                .await?;
            let tdmean = self
                .prism
                .fetch_table(ArchiveRequest {
                    variable: PrismVariable::Tdmean,
                    ..request
                })
                .await?;
            Ok(derive::relative_humidity_table(&tmean, &tdmean)?)
        } else {
            Ok(self.prism.fetch_table(request).await?)
        }
    }
}

#[bon]
impl Climo {
    /// Downloads a PRISM raster, derives the requested product and writes an
    /// annotated map PNG into the output tree.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.product(PrismProduct)`: **Required.** Daily, monthly or normals.
    /// * `.variable(PrismVariable)`: **Required.** The raster variable;
    ///   `Rhmean` is derived from `tmean` and `tdmean`.
    /// * `.year(i32)`: **Required.** Ignored for normals, which always use the
    ///   1991-2020 window.
    /// * `.month(u32)`: **Required.** 1-based month.
    /// * `.day(Option<u32>)`: Required for daily data and daily normals.
    /// * `.window(SpatialWindow)`: **Required.** The map extent; rows outside
    ///   it are trimmed after derivation.
    /// * `.region(Option<PrismRegion>)`: Optional. Defaults to the
    ///   conterminous United States.
    /// * `.resolution(Option<Resolution>)`: Optional. Defaults to 4 km.
    /// * `.normal_type(Option<NormalType>)`: Optional. Daily or monthly
    ///   normals, defaults to monthly.
    /// * `.reference_system(Option<ReferenceSystem>)`: Optional. Labels the
    ///   output directory, defaults to states and counties.
    /// * `.clear_data_folder(Option<bool>)`: Optional, defaults to `true`.
    ///   When set, every archive folder in the shared data directory is
    ///   deleted before downloading. Disable it when several plots run
    ///   against the same folder concurrently.
    /// * `.plot_anomaly(Option<bool>)`: Optional, defaults to `false`. Plots
    ///   the departure from the 30-year normal instead of the absolute field:
    ///   a plain difference for temperatures and humidity, percent of normal
    ///   for monthly precipitation. Daily precipitation has no anomaly
    ///   product.
    /// * `.to_inches(Option<bool>)`: Optional, defaults to `false`. Converts
    ///   absolute precipitation from millimeters to inches.
    ///
    /// # Returns
    ///
    /// The path of the written PNG.
    ///
    /// # Errors
    ///
    /// Returns [`ClimoError::PrismData`] for download, extraction and decode
    /// failures, [`ClimoError::MissingDay`] when daily data or daily normals
    /// are requested without a day, [`ClimoError::Derive`] when anomaly
    /// inputs sit on different grids or a daily precipitation anomaly is
    /// requested, and [`ClimoError::Render`] when the trimmed selection is
    /// empty.
    #[builder]
    #[allow(clippy::too_many_arguments)]
    pub async fn plot_prism(
        &self,
        product: PrismProduct,
        variable: PrismVariable,
        year: i32,
        month: u32,
        day: Option<u32>,
        window: SpatialWindow,
        region: Option<PrismRegion>,
        resolution: Option<Resolution>,
        normal_type: Option<NormalType>,
        reference_system: Option<ReferenceSystem>,
        clear_data_folder: Option<bool>,
        plot_anomaly: Option<bool>,
        to_inches: Option<bool>,
    ) -> Result<PathBuf, ClimoError> {
        let region = region.unwrap_or(PrismRegion::Conus);
        let resolution = resolution.unwrap_or(Resolution::FourKm);
        let normal_type = normal_type.unwrap_or(NormalType::Monthly);
        let reference_system = reference_system.unwrap_or(ReferenceSystem::StatesAndCounties);
        let plot_anomaly = plot_anomaly.unwrap_or(false);
        let to_inches = to_inches.unwrap_or(false);

        if plot_anomaly && variable.is_precipitation() && product != PrismProduct::Monthly {
            return Err(ClimoError::Derive(DeriveError::PrecipAnomalyCadence));
        }

        let request = ArchiveRequest {
            product,
            variable,
            region,
            resolution,
            year,
            month,
            day,
            normal_type,
        };
        // Reject a dayless daily request before the cache clear touches the
        // data folder.
        request.archive_name()?;

        if clear_data_folder.unwrap_or(true) {
            self.prism.clear().await?;
        }
        let current = self.prism_table(request).await?;

        let column = variable.code();
        let table = if plot_anomaly {
            // Normals share the cadence of the plotted data: monthly data
            // compares against monthly normals, daily against daily.
            let normal_request = ArchiveRequest {
                product: PrismProduct::Normals,
                normal_type: match product {
                    PrismProduct::Daily => NormalType::Daily,
                    _ => NormalType::Monthly,
                },
                ..request
            };
            let normal = self.prism_table(normal_request).await?;
            if variable.is_precipitation() {
                derive::percent_of_normal(&current, &normal, column)?
            } else {
                derive::difference_anomaly(&current, &normal, column)?
            }
        } else if variable.is_temperature() {
            derive::to_fahrenheit(current, column)?
        } else if variable.is_precipitation() && to_inches {
            derive::to_inches(current, column)?
        } else {
            current
        };

        let trimmed = derive::trim_table(table, &window)?;

        let scale = if plot_anomaly && variable.is_precipitation() {
            ColorScale::percent_of_normal()
        } else if !plot_anomaly && variable == PrismVariable::Rhmean {
            ColorScale::relative_humidity()
        } else {
            ColorScale::from_data(
                trimmed
                    .column(column)
                    .map_err(DeriveError::Polars)?
                    .f64()
                    .map_err(DeriveError::Polars)?,
            )
        };
        let cmap = if plot_anomaly {
            if variable.is_precipitation() {
                Colormap::precipitation_anomaly()
            } else {
                Colormap::temperature_change()
            }
        } else {
            match variable {
                PrismVariable::Rhmean | PrismVariable::Tdmean => Colormap::moisture(),
                PrismVariable::Ppt => Colormap::precipitation(),
                _ => Colormap::temperature(),
            }
        };

        let dir = self.ensure_prism_dir(&request, reference_system).await?;
        let name = if plot_anomaly {
            format!("{} Anomaly.png", column.to_uppercase())
        } else {
            format!("{}.png", column.to_uppercase())
        };
        let file = dir.join(name);
        let img = map::render_table(&trimmed, column, &window, &scale, &cmap)?;
        map::save_png(&img, &file)?;
        Ok(file)
    }

    /// Fetches a reanalysis field from NOAA PSL, fits an EOF decomposition
    /// and writes the mean map, the two leading mode patterns and their score
    /// time series as PNGs.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.variable(&str)`: **Required.** The reanalysis variable code (e.g.
    ///   `"air"`, `"hgt"`, `"slp"`); must exist in the chosen level's
    ///   catalog.
    /// * `.level(LevelType)`: **Required.** Pressure, surface-gauss or
    ///   surface family.
    /// * `.start(NaiveDate)` / `.end(NaiveDate)`: **Required.** Inclusive
    ///   date range.
    /// * `.window(Option<SpatialWindow>)`: Optional. The analysis extent;
    ///   defaults to the whole globe.
    /// * `.globe(Option<bool>)`: Optional, defaults to `false`. When set the
    ///   window is ignored and the whole globe is used.
    /// * `.to_fahrenheit(Option<bool>)`: Optional, defaults to `true`.
    ///   Displays the mean temperature field in Fahrenheit; the decomposition
    ///   itself always runs on the raw values.
    ///
    /// # Returns
    ///
    /// The paths of the written PNGs: mean map, EOF1 and EOF2 patterns, and
    /// their score series.
    ///
    /// # Errors
    ///
    /// Returns [`ClimoError::PslData`] when the variable is not in the
    /// catalog, the server is unreachable, or the date range selects no
    /// samples.
    #[builder]
    pub async fn plot_reanalysis_eof(
        &self,
        variable: &str,
        level: LevelType,
        start: NaiveDate,
        end: NaiveDate,
        window: Option<SpatialWindow>,
        globe: Option<bool>,
        to_fahrenheit: Option<bool>,
    ) -> Result<Vec<PathBuf>, ClimoError> {
        let window = if globe.unwrap_or(false) {
            SpatialWindow::GLOBE
        } else {
            window.unwrap_or(SpatialWindow::GLOBE)
        };

        let field = self.psl.fetch(variable, level, &window, start, end).await?;
        let field = field.trim(&window)?;
        let decomposition = eof::fit(&field, 2)?;

        // The mean map is a display product; temperatures arrive in Kelvin.
        let mut mean = decomposition.mean.clone();
        if variable == "air" {
            let fahrenheit = to_fahrenheit.unwrap_or(true);
            for v in mean.iter_mut() {
                *v = crate::calc::kelvin_to_celsius(*v);
                if fahrenheit {
                    *v = crate::calc::celsius_to_fahrenheit(*v);
                }
            }
        }

        let dir = self.output.noaa_psl_path(variable, level, &window, start, end);
        self.output
            .ensure(&dir)
            .await
            .map_err(|e| ClimoError::OutputDirCreation(dir.clone(), e))?;

        let title = level.plot_title(variable);
        let mut written = Vec::new();

        let finite: Vec<f64> = mean.iter().copied().filter(|v| v.is_finite()).collect();
        let mean_scale = ColorScale::from_data(&polars::prelude::Float64Chunked::from_vec(
            "mean".into(),
            finite,
        ));
        let mean_file = dir.join(format!("MEAN {title}.png"));
        let img = map::render_field(
            &mean,
            &decomposition.lats,
            &decomposition.lons,
            &mean_scale,
            &Colormap::temperature(),
        )?;
        map::save_png(&img, &mean_file)?;
        written.push(mean_file);

        for (i, mode) in decomposition.modes.iter().enumerate() {
            let n = i + 1;
            let scale = pattern_scale(&mode.pattern);

            let pattern_file = dir.join(format!("EOF{n} {title}.png"));
            let img = map::render_field(
                &mode.pattern,
                &decomposition.lats,
                &decomposition.lons,
                &scale,
                &Colormap::signed_pattern(),
            )?;
            map::save_png(&img, &pattern_file)?;
            written.push(pattern_file);

            let scores_file = dir.join(format!("EOF{n} Scores.png"));
            let img = series::render_scores(&mode.scores)?;
            map::save_png(&img, &scores_file)?;
            written.push(scores_file);
        }

        Ok(written)
    }

    async fn ensure_prism_dir(
        &self,
        request: &ArchiveRequest,
        reference_system: ReferenceSystem,
    ) -> Result<PathBuf, ClimoError> {
        let dir = self.output.prism_path(
            request.product,
            request.region,
            request.variable,
            request.year,
            request.month,
            request.day,
            request.resolution,
            request.normal_type,
            reference_system,
        )?;
        self.output
            .ensure(&dir)
            .await
            .map_err(|e| ClimoError::OutputDirCreation(dir.clone(), e))?;
        Ok(dir)
    }
}

/// A symmetric color scale for an EOF pattern, clamped at the pattern's
/// largest finite magnitude.
///
/// A pattern that is all zero (a window with no varying cells, such as a
/// sliver touching the pole) has no usable magnitude; a unit scale is
/// substituted so the map still renders.
fn pattern_scale(pattern: &[f64]) -> ColorScale {
    let max_abs = pattern
        .iter()
        .fold(0.0f64, |m, v| if v.is_finite() { m.max(v.abs()) } else { m });
    let limit = if max_abs.is_normal() { max_abs } else { 1.0 };
    ColorScale::from_range(-limit, limit, limit / 10.0, limit / 2.0)
}
