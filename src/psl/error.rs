use thiserror::Error;

#[derive(Debug, Error)]
pub enum PslDataError {
    #[error("NOAA PSL THREDDS server is unreachable at {url}")]
    ServerUnavailable {
        url: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("no reanalysis variable '{variable}' in the {level} catalog")]
    UnknownVariable { variable: String, level: String },

    #[error("failed to open reanalysis dataset")]
    Netcdf(#[from] netcdf::Error),

    #[error("dataset is missing required variable or coordinate '{0}'")]
    MissingVariable(String),

    #[error("cannot interpret time units '{0}'")]
    TimeUnits(String),

    #[error("no data inside the requested window and time range")]
    EmptySelection,

    #[error("grid shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
