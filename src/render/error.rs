use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to draw: the selection contains no values")]
    EmptyData,

    #[error("failed to write image '{0}'")]
    Write(PathBuf, #[source] image::ImageError),
}
