pub mod colormap;
pub mod error;
pub mod map;
pub mod series;
