//! Core building blocks: the raster model, band-algebra stages, parameters and the
//! raster-to-vector conversion. These are consumed by the high-level `api` module.
pub mod params;
pub mod processing;
pub mod raster;
pub mod vectorize;
