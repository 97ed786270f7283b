pub mod prism;
pub mod reanalysis;
pub mod spatial;
