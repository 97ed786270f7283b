mod calc;
mod climo;
mod error;
mod paths;
mod prism;
mod psl;
mod render;
mod types;

pub use calc::{
    celsius_to_fahrenheit, fahrenheit_to_celsius, kelvin_to_celsius, mm_to_inches,
    month_abbreviation, relative_humidity_from_fahrenheit, saturation_vapor_pressure,
};
pub use climo::Climo;
pub use error::ClimoError;
pub use paths::OutputTree;

pub use types::prism::{
    MissingDay, NormalType, PrismProduct, PrismRegion, PrismVariable, ReferenceSystem, Resolution,
};
pub use types::reanalysis::LevelType;
pub use types::spatial::{InvalidWindow, SpatialWindow};

pub use prism::derive::{ColorScale, DeriveError};
pub use prism::error::PrismDataError;
pub use prism::fetch::{ArchiveRequest, PrismDataLoader};
pub use prism::geotiff::PrismRaster;

pub use psl::eof::{fit as fit_eof, EofDecomposition, EofMode};
pub use psl::error::PslDataError;
pub use psl::fetch::PslDataLoader;
pub use psl::grid::{normalize_longitude, GriddedField};

pub use render::colormap::Colormap;
pub use render::error::RenderError;
