#![doc = r#"
lakepro: lake detection from multispectral (Sentinel-2 style) imagery.

This crate turns a multiband optical raster into a binary lake mask and a set of lake
polygons: digital numbers are scaled to reflectance, clouds and non-target surfaces
(rock, ice, ocean) are masked out, a blue/red normalized difference with a green margin picks out
water, and the resulting lake band is resolved against a region of interest and
vectorized into one feature per connected lake.

Requirements
------------
- GDAL development headers and runtime available on your system (for the `io` layer
  and the CLI; the `core` modules are pure Rust).
- Rust 2024 edition toolchain.

Quick start: in-memory detection
--------------------------------
```rust,no_run
use lakepro::{detect_lakes, DetectionParams, GeoTransform, RasterImage, RegionOfInterest};
use geo::polygon;
use ndarray::Array2;

fn main() -> lakepro::Result<()> {
    let band = |v: f64| Array2::from_elem((10, 10), v);
    let image = RasterImage::new(
        GeoTransform::new(0.0, 100.0, 10.0, -10.0),
        "EPSG:32633",
        vec![
            ("B2".into(), band(1500.0)),
            ("B3".into(), band(2000.0)),
            ("B4".into(), band(500.0)),
            ("B10".into(), band(10.0)),
            ("B11".into(), band(100.0)),
        ],
    )?;
    let roi = RegionOfInterest::from_polygon(
        polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
        "EPSG:32633",
    );
    let detection = detect_lakes(&image, &roi, &DetectionParams::default())?;
    println!("{} lakes", detection.vectors.len());
    Ok(())
}
```

Quick start: process a file to an output directory
--------------------------------------------------
```rust,no_run
use std::path::Path;
use lakepro::{process_file_to_dir, DetectionParams};

fn main() -> lakepro::Result<()> {
    let outputs = process_file_to_dir(
        Path::new("/data/S2A_T33UVP.tif"),
        Path::new("/data/roi.geojson"),
        Path::new("/out"),
        &DetectionParams::default(),
        None,
    )?;
    println!("{:?}", outputs.vectors);
    Ok(())
}
```

Modules
-------
- `api`: high-level entrypoints (in-memory detection, file and directory processing,
  candidate selection)
- `core`: raster model, band stages, parameters and raster-to-vector conversion
- `io`: GDAL raster reading, ROI GeoJSON reading, CRS transforms and output writers
- `types`: shared enums (`BandRole`, `Connectivity`, `VectorizeMode`)
- `error`: crate-wide `Error` and `Result`
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

pub use api::{
    BatchReport, LakeDetection, OutputPaths, candidate_images, detect_lakes,
    process_directory_to_dir, process_file_to_dir, select_candidate,
};
pub use core::params::{
    BandMap, CloudParams, DetectionParams, SurfaceParams, VectorizeParams, WaterParams,
};
pub use core::processing::pipeline::process_image_pipeline;
pub use core::raster::{
    Classification, GeoTransform, LakeMask, Mask, RasterImage, RgbComposite, rgb_composite,
};
pub use core::vectorize::{
    LakeFeature, RegionOfInterest, ResolvedMask, VectorFeatureCollection, raster_to_vector,
};
pub use error::{Error, Result};
pub use types::{BandRole, Connectivity, VectorizeMode};
