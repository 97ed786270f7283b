pub mod derive;
pub mod error;
pub mod fetch;
pub mod geotiff;
