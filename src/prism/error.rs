use crate::types::prism::MissingDay;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrismDataError {
    #[error(transparent)]
    MissingDay(#[from] MissingDay),

    #[error("network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("I/O error on data folder entry '{0}'")]
    DataFolderIo(PathBuf, #[source] std::io::Error),

    #[error("failed to extract archive '{0}'")]
    Archive(PathBuf, #[source] zip::result::ZipError),

    #[error("no raster payload found under '{0}'")]
    RasterNotFound(PathBuf),

    #[error("TIFF decode error: {0}")]
    Tiff(String),

    #[error("raster is missing geotransform tags: {0}")]
    MissingGeotransform(String),

    #[error("unsupported raster sample type: {0}")]
    UnsupportedDataType(String),

    #[error("variable '{0}' has no raster of its own; it is derived")]
    DerivedVariableRequested(String),

    #[error("background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl From<tiff::TiffError> for PrismDataError {
    fn from(e: tiff::TiffError) -> Self {
        PrismDataError::Tiff(e.to_string())
    }
}
