//! Per-pixel band algebra: reflectance scaling, cloud and surface masking, and the
//! water test that yields the lake band. Every stage is a pure `RasterImage` transform.
pub mod cloud;
pub mod ops;
pub mod pipeline;
pub mod scale;
pub mod surface;
pub mod water;
