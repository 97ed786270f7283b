use crate::prism::derive::DeriveError;
use crate::prism::error::PrismDataError;
use crate::types::prism::MissingDay;
use crate::psl::error::PslDataError;
use crate::render::error::RenderError;
use crate::types::spatial::InvalidWindow;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimoError {
    #[error(transparent)]
    PslData(#[from] PslDataError),

    #[error(transparent)]
    PrismData(#[from] PrismDataError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),

    #[error(transparent)]
    MissingDay(#[from] MissingDay),

    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),
}
